use poise::CreateReply;
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::CommandMeta;
use crate::cooldown::shared::{load_config, modify_config, reply_ephemeral, require_manager};
use iceguard_activity::{ChannelScope, Transition};
use iceguard_core::{Context, Error};
use iceguard_database::impls::monitored_channels::{
    add_monitored_channel, clear_monitored_channels, list_monitored_channels,
    remove_monitored_channel,
};
use iceguard_utils::embed::build_embed;
use iceguard_utils::formatting::channel_mention;

pub const META: CommandMeta = CommandMeta {
    name: "monitor",
    desc: "Choose which channels IceGuard watches (default: all).",
    category: "cooldown",
    usage: "/monitor <start|stop|all|list> [channel]",
};

/// Choose which channels IceGuard watches.
#[poise::command(
    slash_command,
    category = "Cooldown",
    subcommands("start", "stop", "all", "list")
)]
pub async fn monitor(ctx: Context<'_>) -> Result<(), Error> {
    list_inner(ctx).await
}

/// Watch a channel. From then on only listed channels are watched.
#[poise::command(slash_command, category = "Cooldown")]
pub async fn start(
    ctx: Context<'_>,
    #[description = "Channel to watch"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    if channel.guild_id != guild_id {
        reply_ephemeral(ctx, "That channel is not in this server.").await?;
        return Ok(());
    }

    let bot_id = ctx.cache().current_user().id;
    if let Ok(perms) = channel.permissions_for_user(ctx.cache(), bot_id)
        && !perms.manage_channels()
    {
        reply_ephemeral(
            ctx,
            format!(
                "I don't have **Manage Channels** in {}. Please update my permissions first.",
                channel_mention(channel.id.get())
            ),
        )
        .await?;
        return Ok(());
    }

    let added = add_monitored_channel(
        &ctx.data().db,
        guild_id.get(),
        channel.id.get(),
        ctx.author().id.get(),
    )
    .await?;
    let previous = load_config(ctx, guild_id).await?.scope();
    if previous != ChannelScope::Listed {
        modify_config(ctx, guild_id, |config| config.set_scope(ChannelScope::Listed)).await?;
    }

    if !added {
        reply_ephemeral(
            ctx,
            format!("{} is already monitored.", channel_mention(channel.id.get())),
        )
        .await?;
        return Ok(());
    }

    info!(
        guild_id = guild_id.get(),
        channel_id = channel.id.get(),
        user_id = ctx.author().id.get(),
        "channel added to monitoring"
    );

    let mut reply = format!("Now monitoring {}.", channel_mention(channel.id.get()));
    if previous == ChannelScope::All {
        reply.push_str(" Only listed channels are watched from now on.");
    }
    ctx.say(reply).await?;

    Ok(())
}

/// Stop watching a channel and lift any slowmode IceGuard applied there.
#[poise::command(slash_command, category = "Cooldown")]
pub async fn stop(
    ctx: Context<'_>,
    #[description = "Channel to stop watching"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    let removed = remove_monitored_channel(&ctx.data().db, guild_id.get(), channel.id.get()).await?;
    if !removed {
        reply_ephemeral(
            ctx,
            format!("{} was not being monitored.", channel_mention(channel.id.get())),
        )
        .await?;
        return Ok(());
    }

    let lifted = match ctx.data().monitor.forget(channel.id.get()).await {
        Ok(transition) => Some(transition == Transition::Released),
        Err(source) => {
            warn!(
                %source,
                guild_id = guild_id.get(),
                channel_id = channel.id.get(),
                "failed to lift slowmode when monitoring stopped"
            );
            None
        }
    };

    info!(
        guild_id = guild_id.get(),
        channel_id = channel.id.get(),
        user_id = ctx.author().id.get(),
        "channel removed from monitoring"
    );

    let remaining = list_monitored_channels(&ctx.data().db, guild_id.get()).await?;
    let mut reply = match lifted {
        Some(true) => format!(
            "Stopped monitoring {} and lifted its slowmode.",
            channel_mention(channel.id.get())
        ),
        Some(false) => format!("Stopped monitoring {}.", channel_mention(channel.id.get())),
        None => format!(
            "Stopped monitoring {}, but couldn't lift its slowmode yet. IceGuard will retry.",
            channel_mention(channel.id.get())
        ),
    };

    if remaining.is_empty() {
        reply.push_str(
            " No channels are listed any more, so IceGuard watches nothing until you add one \
             or run `/monitor all`.",
        );
    }

    ctx.say(reply).await?;
    Ok(())
}

/// Watch every channel again and clear the list.
#[poise::command(slash_command, category = "Cooldown")]
pub async fn all(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    modify_config(ctx, guild_id, |config| config.set_scope(ChannelScope::All)).await?;
    let cleared = clear_monitored_channels(&ctx.data().db, guild_id.get()).await?;

    info!(
        guild_id = guild_id.get(),
        user_id = ctx.author().id.get(),
        cleared,
        "monitoring widened to every channel"
    );

    ctx.say("IceGuard now watches every channel in this server.")
        .await?;
    Ok(())
}

/// List the channels IceGuard watches.
#[poise::command(slash_command, category = "Cooldown")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    list_inner(ctx).await
}

async fn list_inner(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = require_manager(ctx).await? else {
        return Ok(());
    };

    let scope = load_config(ctx, guild_id).await?.scope();
    let channels = list_monitored_channels(&ctx.data().db, guild_id.get()).await?;
    let description = if scope == ChannelScope::All {
        "Every channel is watched while IceGuard is enabled. Use `/monitor start` to pick \
         specific channels."
            .to_owned()
    } else if channels.is_empty() {
        "No channels are listed, so IceGuard watches nothing. Add one with `/monitor start` \
         or run `/monitor all`."
            .to_owned()
    } else {
        channels
            .iter()
            .map(|entry| {
                format!(
                    "• {} (added by <@{}> <t:{}:R>)",
                    channel_mention(entry.channel_id),
                    entry.added_by,
                    entry.created_at
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = build_embed("Monitored Channels", description, None);
    ctx.send(CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}
