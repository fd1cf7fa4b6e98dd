use tracing::{info, warn};

use crate::CommandMeta;
use crate::cooldown::shared::{modify_config, require_manager};
use iceguard_activity::{ChannelScope, Transition};
use iceguard_core::{Context, Error};
use iceguard_database::impls::monitored_channels::list_monitored_channel_ids;
use iceguard_utils::formatting::{format_compact_duration, format_count};

pub const ENABLE_META: CommandMeta = CommandMeta {
    name: "enable",
    desc: "Start applying slowmode automatically in this server.",
    category: "cooldown",
    usage: "/enable",
};

pub const DISABLE_META: CommandMeta = CommandMeta {
    name: "disable",
    desc: "Stop automatic slowmode and lift any slowmode IceGuard applied.",
    category: "cooldown",
    usage: "/disable",
};

#[poise::command(slash_command, category = "Cooldown")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    let config = modify_config(ctx, guild_id, |config| config.set_enabled(true)).await?;

    info!(
        guild_id = guild_id.get(),
        user_id = ctx.author().id.get(),
        "automatic slowmode enabled"
    );

    let scope = match config.scope() {
        ChannelScope::All => "every channel".to_owned(),
        ChannelScope::Listed => {
            let monitored = list_monitored_channel_ids(&ctx.data().db, guild_id.get()).await?;
            format_count(monitored.len() as u64, "monitored channel")
        }
    };

    ctx.say(format!(
        "Automatic slowmode is now **enabled** for {}. A **{}** slowmode applies when a channel \
         reaches **{}** within **{}**.",
        scope,
        format_compact_duration(u64::from(config.cooldown_seconds())),
        format_count(u64::from(config.threshold()), "message"),
        format_compact_duration(u64::from(config.window_seconds())),
    ))
    .await?;

    Ok(())
}

#[poise::command(slash_command, category = "Cooldown")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    modify_config(ctx, guild_id, |config| config.set_enabled(false)).await?;

    let released = ctx.data().monitor.release_guild(guild_id.get()).await;
    let lifted = released
        .iter()
        .filter(|(_, result)| matches!(result, Ok(Transition::Released)))
        .count();
    let failed = released.iter().filter(|(_, result)| result.is_err()).count();

    info!(
        guild_id = guild_id.get(),
        user_id = ctx.author().id.get(),
        lifted,
        failed,
        "automatic slowmode disabled"
    );

    if failed > 0 {
        warn!(
            guild_id = guild_id.get(),
            failed, "could not lift every slowmode while disabling"
        );
    }

    ctx.say(disabled_reply(lifted, failed)).await?;

    Ok(())
}

fn disabled_reply(lifted: usize, failed: usize) -> String {
    if failed > 0 {
        return format!(
            "Automatic slowmode is now **disabled**. Lifted slowmode in {}, but {} could not be \
             changed; IceGuard will keep retrying.",
            format_count(lifted as u64, "channel"),
            format_count(failed as u64, "channel"),
        );
    }

    format!(
        "Automatic slowmode is now **disabled**. Lifted slowmode in {}.",
        format_count(lifted as u64, "channel"),
    )
}

#[cfg(test)]
mod tests {
    use super::disabled_reply;

    #[test]
    fn disable_reply_mentions_failures_only_when_present() {
        assert_eq!(
            disabled_reply(2, 0),
            "Automatic slowmode is now **disabled**. Lifted slowmode in 2 channels."
        );
        assert!(disabled_reply(1, 1).contains("1 channel could not be changed"));
    }
}
