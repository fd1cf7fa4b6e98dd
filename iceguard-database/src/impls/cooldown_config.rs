use anyhow::Context as _;

use iceguard_activity::GuildConfig;

use crate::cache::{CONFIG_CACHE_TTL, cooldown_config_key, invalidate_cooldown_config};
use crate::database::Database;
use crate::impls::monitored_channels::clear_monitored_channels;
use crate::model::cooldown_config::CooldownConfigRow;

/// Load the guild's cooldown config, or `None` if it was never configured.
pub async fn get_guild_config(db: &Database, guild_id: u64) -> anyhow::Result<Option<GuildConfig>> {
    let cache_key = cooldown_config_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, CONFIG_CACHE_TTL, || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let row = sqlx::query_as::<_, CooldownConfigRow>(
                "SELECT guild_id, activity_threshold, window_seconds, cooldown_seconds, enabled, \
                        monitor_scope \
                 FROM guild_cooldown_config WHERE guild_id = $1",
            )
            .bind(guild_id_i64)
            .fetch_optional(db.pool())
            .await?;

            row.map(CooldownConfigRow::into_config).transpose()
        })
        .await
}

/// Get the guild's config only if monitoring is enabled.
pub async fn get_guild_config_if_enabled(
    db: &Database,
    guild_id: u64,
) -> anyhow::Result<Option<GuildConfig>> {
    let config = get_guild_config(db, guild_id).await?;
    Ok(config.filter(GuildConfig::enabled))
}

/// Upsert every field of the guild's config.
pub async fn save_guild_config(
    db: &Database,
    guild_id: u64,
    config: &GuildConfig,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let threshold = i32::try_from(config.threshold()).context("threshold out of i32 range")?;
    let window = i32::try_from(config.window_seconds()).context("window out of i32 range")?;

    sqlx::query(
        "INSERT INTO guild_cooldown_config \
             (guild_id, activity_threshold, window_seconds, cooldown_seconds, enabled, \
              monitor_scope, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, EXTRACT(EPOCH FROM NOW())::BIGINT) \
         ON CONFLICT (guild_id) DO UPDATE SET \
             activity_threshold = EXCLUDED.activity_threshold, \
             window_seconds = EXCLUDED.window_seconds, \
             cooldown_seconds = EXCLUDED.cooldown_seconds, \
             enabled = EXCLUDED.enabled, \
             monitor_scope = EXCLUDED.monitor_scope, \
             updated_at = EXCLUDED.updated_at",
    )
    .bind(guild_id_i64)
    .bind(threshold)
    .bind(window)
    .bind(i32::from(config.cooldown_seconds()))
    .bind(config.enabled())
    .bind(config.scope().as_str())
    .execute(db.pool())
    .await?;

    invalidate_cooldown_config(db.cache(), guild_id).await?;

    Ok(())
}

/// Delete the guild's config and channel list. Returns `true` if a config existed.
pub async fn reset_guild_config(db: &Database, guild_id: u64) -> anyhow::Result<bool> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    let result = sqlx::query("DELETE FROM guild_cooldown_config WHERE guild_id = $1")
        .bind(guild_id_i64)
        .execute(db.pool())
        .await?;

    clear_monitored_channels(db, guild_id).await?;
    invalidate_cooldown_config(db.cache(), guild_id).await?;

    Ok(result.rows_affected() > 0)
}
