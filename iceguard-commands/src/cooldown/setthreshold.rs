use tracing::info;

use crate::CommandMeta;
use crate::cooldown::shared::{reply_validation_error, require_manager, update_config};
use iceguard_core::{Context, Error};
use iceguard_utils::formatting::{format_compact_duration, format_count};

pub const META: CommandMeta = CommandMeta {
    name: "setthreshold",
    desc: "Set how many messages within the window trigger slowmode.",
    category: "cooldown",
    usage: "/setthreshold <messages>",
};

#[poise::command(slash_command, category = "Cooldown")]
pub async fn setthreshold(
    ctx: Context<'_>,
    #[description = "Messages within the window that trigger slowmode"] messages: i64,
) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    let config = match update_config(ctx, guild_id, |config| {
        config.set_threshold(messages).map(|_| ())
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
        threshold = config.threshold(),
        "activity threshold updated"
    );

    ctx.say(format!(
        "Slowmode will now trigger at **{}** within **{}**.",
        format_count(u64::from(config.threshold()), "message"),
        format_compact_duration(u64::from(config.window_seconds())),
    ))
    .await?;

    Ok(())
}
