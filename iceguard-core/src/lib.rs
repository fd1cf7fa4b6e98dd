pub mod slowmode;

use std::sync::Arc;

use iceguard_activity::CooldownMonitor;
use iceguard_database::Database;

pub use slowmode::DiscordSlowmode;

pub type Error = anyhow::Error;

pub type Monitor = CooldownMonitor<DiscordSlowmode>;

#[derive(Clone, Debug)]
pub struct Data {
    pub db: Database,
    pub monitor: Arc<Monitor>,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
