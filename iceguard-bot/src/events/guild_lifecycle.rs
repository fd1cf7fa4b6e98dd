use poise::serenity_prelude as serenity;
use tracing::{error, info};

use iceguard_core::Data;
use iceguard_database::impls::cooldown_config::reset_guild_config;

/// Drop everything stored for a guild the bot was removed from.
pub async fn handle_guild_delete(data: &Data, incomplete: &serenity::UnavailableGuild) {
    // An outage, not a removal.
    if incomplete.unavailable {
        return;
    }

    let guild_id = incomplete.id.get();
    let forgotten = data.monitor.tracker().forget_guild(guild_id).await;

    match reset_guild_config(&data.db, guild_id).await {
        Ok(existed) => info!(
            guild_id,
            existed, forgotten, "removed from guild; cooldown config deleted"
        ),
        Err(source) => error!(?source, guild_id, "failed to delete config for removed guild"),
    }
}
