pub mod activity;
pub mod guild_lifecycle;
pub mod notices;
pub mod sweep;
