use tracing::info;

use crate::CommandMeta;
use crate::cooldown::shared::{reply_validation_error, require_manager, update_config};
use iceguard_core::{Context, Error};
use iceguard_utils::formatting::format_compact_duration;

pub const META: CommandMeta = CommandMeta {
    name: "setcooldown",
    desc: "Set the slowmode delay applied while a channel is busy.",
    category: "cooldown",
    usage: "/setcooldown <seconds>",
};

#[poise::command(slash_command, category = "Cooldown")]
pub async fn setcooldown(
    ctx: Context<'_>,
    #[description = "Slowmode delay in seconds (1-21600)"] seconds: i64,
) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    let config = match update_config(ctx, guild_id, |config| {
        config.set_cooldown(seconds).map(|_| ())
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
        cooldown_seconds = config.cooldown_seconds(),
        "cooldown delay updated"
    );

    ctx.say(format!(
        "Busy channels will get a **{}** slowmode. Channels already cooling down pick up the \
         new delay on their next check.",
        format_compact_duration(u64::from(config.cooldown_seconds())),
    ))
    .await?;

    Ok(())
}
