use std::time::Instant;

use poise::serenity_prelude as serenity;
use tracing::{debug, error};

use iceguard_activity::PlatformApiError;
use iceguard_core::Data;
use iceguard_database::impls::cooldown_config::get_guild_config_if_enabled;
use iceguard_database::impls::monitored_channels::is_channel_monitored;

use crate::events::notices::{announce_missing_permissions, announce_transition};

/// Count an incoming message towards its channel's activity and adjust
/// slowmode when the guild's threshold is crossed.
pub async fn handle_message_activity(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
) {
    // Ignore bots and webhooks.
    if message.author.bot || message.webhook_id.is_some() {
        return;
    }

    let Some(guild_id) = message.guild_id else {
        return;
    };

    let config = match get_guild_config_if_enabled(&data.db, guild_id.get()).await {
        Ok(Some(cfg)) => cfg,
        Ok(None) => return,
        Err(source) => {
            error!(?source, "failed to read cooldown config");
            return;
        }
    };

    let channel_id = message.channel_id.get();
    match is_channel_monitored(&data.db, guild_id.get(), config.scope(), channel_id).await {
        Ok(true) => {}
        Ok(false) => return,
        Err(source) => {
            error!(?source, "failed to read monitored channels");
            return;
        }
    }

    // Platform failures are logged by the controller and retried after a backoff.
    let outcome = match data
        .monitor
        .observe(guild_id.get(), channel_id, &config, Instant::now())
        .await
    {
        Ok(outcome) => outcome,
        Err(PlatformApiError::MissingPermissions) => {
            if data.monitor.take_permission_notice(channel_id).await {
                announce_missing_permissions(&ctx.http, guild_id.get(), channel_id).await;
            }
            return;
        }
        Err(_) => return,
    };

    debug!(
        guild_id = outcome.guild_id,
        channel_id = outcome.channel_id,
        count = outcome.count,
        threshold = config.threshold(),
        "message recorded"
    );

    announce_transition(&ctx.http, &outcome).await;
}
