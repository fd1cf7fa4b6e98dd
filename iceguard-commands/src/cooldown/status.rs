use poise::CreateReply;

use crate::CommandMeta;
use crate::cooldown::shared::{guild_only_message, reply_ephemeral, scope_summary};
use iceguard_core::{Context, Error};
use iceguard_database::impls::cooldown_config::get_guild_config;
use iceguard_database::impls::monitored_channels::list_monitored_channel_ids;
use iceguard_utils::embed::build_embed;
use iceguard_utils::formatting::{
    channel_mention, enabled_label, format_compact_duration, format_count,
};

pub const META: CommandMeta = CommandMeta {
    name: "status",
    desc: "Show this server's cooldown settings and active slowmodes.",
    category: "cooldown",
    usage: "/status",
};

#[poise::command(slash_command, category = "Cooldown")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        reply_ephemeral(ctx, guild_only_message()).await?;
        return Ok(());
    };

    let stored = get_guild_config(&ctx.data().db, guild_id.get()).await?;
    let configured = stored.is_some();
    let config = stored.unwrap_or_default();
    let monitored = list_monitored_channel_ids(&ctx.data().db, guild_id.get()).await?;
    let active = ctx.data().monitor.active_cooldowns(guild_id.get()).await;

    let scope = scope_summary(config.scope(), &monitored);

    let active_lines = if active.is_empty() {
        "None".to_owned()
    } else {
        active
            .iter()
            .map(|(channel_id, delay)| {
                format!(
                    "• {} ({})",
                    channel_mention(*channel_id),
                    format_compact_duration(u64::from(*delay))
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let description = format!(
        "**Status :** {}\n\
         **Threshold :** {}\n\
         **Window :** {}\n\
         **Cooldown :** {}\n\n\
         **Monitored :**\n{}\n\n\
         **Active Slowmodes :**\n{}",
        enabled_label(config.enabled()),
        format_count(u64::from(config.threshold()), "message"),
        format_compact_duration(u64::from(config.window_seconds())),
        format_compact_duration(u64::from(config.cooldown_seconds())),
        scope,
        active_lines,
    );

    let footer = if configured {
        None
    } else {
        Some("Not configured yet; showing defaults. Use /enable to start.")
    };

    let embed = build_embed("Cooldown Status", description, footer);
    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
