use std::sync::Arc;
use std::time::Instant;

use poise::serenity_prelude as serenity;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use iceguard_activity::GuildConfig;
use iceguard_core::Data;
use iceguard_database::Database;
use iceguard_database::impls::cooldown_config::get_guild_config_if_enabled;
use iceguard_database::impls::monitored_channels::is_channel_monitored;

use crate::events::notices::{announce_missing_permissions, announce_transition};

/// Periodically re-evaluate tracked channels so slowmode is lifted even when
/// nobody posts again.
pub fn spawn_sweeper(http: Arc<serenity::Http>, data: Data) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = data.monitor.settings().sweep_interval;
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_seconds = period.as_secs(), "activity sweeper started");

        loop {
            interval.tick().await;
            run_sweep(&http, &data).await;
        }
    })
}

async fn run_sweep(http: &serenity::Http, data: &Data) {
    let db = &data.db;
    let report = data
        .monitor
        .sweep(Instant::now(), |guild_id, channel_id| async move {
            resolve_config(db, guild_id, channel_id).await
        })
        .await;

    if !report.changed.is_empty() || report.failed > 0 || report.skipped > 0 {
        debug!(
            changed = report.changed.len(),
            failed = report.failed,
            denied = report.denied.len(),
            skipped = report.skipped,
            evicted = report.evicted,
            "activity sweep finished"
        );
    }

    for outcome in &report.changed {
        announce_transition(http, outcome).await;
    }

    for &(guild_id, channel_id) in &report.denied {
        if data.monitor.take_permission_notice(channel_id).await {
            announce_missing_permissions(http, guild_id, channel_id).await;
        }
    }
}

/// The config that applies to a tracked channel right now; `None` once the
/// guild is disabled or the channel fell out of the monitored list.
async fn resolve_config(
    db: &Database,
    guild_id: u64,
    channel_id: u64,
) -> anyhow::Result<Option<GuildConfig>> {
    let resolved = load_effective_config(db, guild_id, channel_id).await;
    if let Err(source) = &resolved {
        error!(?source, guild_id, channel_id, "failed to resolve config during sweep");
    }
    resolved
}

async fn load_effective_config(
    db: &Database,
    guild_id: u64,
    channel_id: u64,
) -> anyhow::Result<Option<GuildConfig>> {
    let Some(config) = get_guild_config_if_enabled(db, guild_id).await? else {
        return Ok(None);
    };

    if is_channel_monitored(db, guild_id, config.scope(), channel_id).await? {
        Ok(Some(config))
    } else {
        Ok(None)
    }
}
