use anyhow::Context as _;

use crate::cache::{CHANNEL_LIST_CACHE_TTL, invalidate_monitored_channels, monitored_channels_key};
use crate::database::Database;
use iceguard_activity::ChannelScope;

use crate::model::monitored_channel::MonitoredChannel;

/// Channel ids explicitly monitored in a guild (cached).
pub async fn list_monitored_channel_ids(db: &Database, guild_id: u64) -> anyhow::Result<Vec<u64>> {
    let cache_key = monitored_channels_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, CHANNEL_LIST_CACHE_TTL, || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let ids: Vec<i64> = sqlx::query_scalar(
                "SELECT channel_id FROM guild_monitored_channels WHERE guild_id = $1",
            )
            .bind(guild_id_i64)
            .fetch_all(db.pool())
            .await?;

            ids.into_iter()
                .map(|id| u64::try_from(id).context("channel_id out of u64 range"))
                .collect()
        })
        .await
}

/// Full rows for display, oldest first.
pub async fn list_monitored_channels(
    db: &Database,
    guild_id: u64,
) -> anyhow::Result<Vec<MonitoredChannel>> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    let rows = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        "SELECT guild_id, channel_id, added_by, created_at
         FROM guild_monitored_channels
         WHERE guild_id = $1
         ORDER BY created_at ASC, channel_id ASC",
    )
    .bind(guild_id_i64)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter()
        .map(|(gid, channel_id, added_by, created_at)| {
            Ok(MonitoredChannel {
                guild_id: u64::try_from(gid).context("guild_id out of u64 range")?,
                channel_id: u64::try_from(channel_id).context("channel_id out of u64 range")?,
                added_by: u64::try_from(added_by).context("added_by out of u64 range")?,
                created_at: u64::try_from(created_at).context("created_at out of u64 range")?,
            })
        })
        .collect()
}

/// Whether messages in `channel_id` count towards the guild's cooldown.
pub async fn is_channel_monitored(
    db: &Database,
    guild_id: u64,
    scope: ChannelScope,
    channel_id: u64,
) -> anyhow::Result<bool> {
    if scope == ChannelScope::All {
        return Ok(true);
    }

    let monitored = list_monitored_channel_ids(db, guild_id).await?;
    Ok(scope.covers(&monitored, channel_id))
}

/// Add a channel to the list. Returns `false` if it was already there.
pub async fn add_monitored_channel(
    db: &Database,
    guild_id: u64,
    channel_id: u64,
    added_by: u64,
) -> anyhow::Result<bool> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let channel_id_i64 = i64::try_from(channel_id).context("channel_id out of i64 range")?;
    let added_by_i64 = i64::try_from(added_by).context("added_by out of i64 range")?;

    let result = sqlx::query(
        "INSERT INTO guild_monitored_channels (guild_id, channel_id, added_by)
         VALUES ($1, $2, $3)
         ON CONFLICT (guild_id, channel_id) DO NOTHING",
    )
    .bind(guild_id_i64)
    .bind(channel_id_i64)
    .bind(added_by_i64)
    .execute(db.pool())
    .await?;

    invalidate_monitored_channels(db.cache(), guild_id).await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a channel from the list. Returns `true` if removed.
pub async fn remove_monitored_channel(
    db: &Database,
    guild_id: u64,
    channel_id: u64,
) -> anyhow::Result<bool> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let channel_id_i64 = i64::try_from(channel_id).context("channel_id out of i64 range")?;

    let result = sqlx::query(
        "DELETE FROM guild_monitored_channels WHERE guild_id = $1 AND channel_id = $2",
    )
    .bind(guild_id_i64)
    .bind(channel_id_i64)
    .execute(db.pool())
    .await?;

    invalidate_monitored_channels(db.cache(), guild_id).await?;

    Ok(result.rows_affected() > 0)
}

pub async fn clear_monitored_channels(db: &Database, guild_id: u64) -> anyhow::Result<u64> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    let result = sqlx::query("DELETE FROM guild_monitored_channels WHERE guild_id = $1")
        .bind(guild_id_i64)
        .execute(db.pool())
        .await?;

    invalidate_monitored_channels(db.cache(), guild_id).await?;

    Ok(result.rows_affected())
}
