use tracing::info;

use crate::CommandMeta;
use crate::cooldown::shared::{reply_validation_error, require_manager, update_config};
use iceguard_core::{Context, Error};
use iceguard_utils::formatting::{format_compact_duration, format_count};

pub const META: CommandMeta = CommandMeta {
    name: "setwindow",
    desc: "Set the sliding window used to count recent messages.",
    category: "cooldown",
    usage: "/setwindow <seconds>",
};

#[poise::command(slash_command, category = "Cooldown")]
pub async fn setwindow(
    ctx: Context<'_>,
    #[description = "Window length in seconds (1-3600)"] seconds: i64,
) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    let config = match update_config(ctx, guild_id, |config| {
        config.set_window(seconds).map(|_| ())
    })
    .await?
    {
        Ok(config) => config,
        Err(err) => {
            reply_validation_error(ctx, &err).await?;
            return Ok(());
        }
    };

    info!(
        guild_id = guild_id.get(),
        user_id = ctx.author().id.get(),
        window_seconds = config.window_seconds(),
        "monitoring window updated"
    );

    ctx.say(format!(
        "Messages are now counted over the last **{}** (trigger: {}).",
        format_compact_duration(u64::from(config.window_seconds())),
        format_count(u64::from(config.threshold()), "message"),
    ))
    .await?;

    Ok(())
}
