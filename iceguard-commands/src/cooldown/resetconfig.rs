use tracing::info;

use crate::CommandMeta;
use crate::cooldown::shared::require_manager;
use iceguard_core::{Context, Error};
use iceguard_database::impls::cooldown_config::reset_guild_config;

pub const META: CommandMeta = CommandMeta {
    name: "resetconfig",
    desc: "Delete this server's cooldown settings and lift active slowmodes.",
    category: "cooldown",
    usage: "/resetconfig",
};

#[poise::command(slash_command, category = "Cooldown")]
pub async fn resetconfig(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    let existed = reset_guild_config(&ctx.data().db, guild_id.get()).await?;
    let forgotten = ctx.data().monitor.forget_guild(guild_id.get()).await;

    info!(
        guild_id = guild_id.get(),
        user_id = ctx.author().id.get(),
        existed,
        forgotten,
        "cooldown config reset"
    );

    if existed {
        ctx.say("Cooldown settings were reset. IceGuard is disabled until you run `/enable` again.")
            .await?;
    } else {
        ctx.say("This server had no cooldown settings to reset.")
            .await?;
    }

    Ok(())
}
