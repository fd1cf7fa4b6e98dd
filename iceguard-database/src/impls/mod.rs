pub mod cooldown_config;
pub mod monitored_channels;
