use poise::CreateReply;
use poise::serenity_prelude as serenity;

use iceguard_activity::{ChannelScope, GuildConfig, ValidationError};
use iceguard_core::{Context, Error};
use iceguard_database::impls::cooldown_config::{get_guild_config, save_guild_config};
use iceguard_utils::embed::build_error_embed;
use iceguard_utils::formatting::channel_list;
use iceguard_utils::permissions::has_user_permission;

pub(crate) fn guild_only_message() -> &'static str {
    "This command only works in servers."
}

pub(crate) fn missing_permission_message() -> &'static str {
    "You need the **Manage Channels** permission to configure IceGuard."
}

/// Human-readable list of the channels a guild's scope covers.
pub(crate) fn scope_summary(scope: ChannelScope, listed: &[u64]) -> String {
    match scope {
        ChannelScope::All => "All channels".to_owned(),
        ChannelScope::Listed => channel_list(
            listed,
            "No channels. Add one with `/monitor start` or watch everything with `/monitor all`.",
        ),
    }
}

/// Resolve the guild and check the invoker may manage cooldowns.
///
/// Replies to the invoker and returns `None` when the command must stop.
pub(crate) async fn require_manager(ctx: Context<'_>) -> Result<Option<serenity::GuildId>, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        reply_ephemeral(ctx, guild_only_message()).await?;
        return Ok(None);
    };

    if !has_user_permission(
        ctx.http(),
        guild_id,
        ctx.author().id,
        serenity::Permissions::MANAGE_CHANNELS,
    )
    .await?
    {
        reply_ephemeral(ctx, missing_permission_message()).await?;
        return Ok(None);
    }

    Ok(Some(guild_id))
}

/// The guild's stored config, or the defaults for a guild never configured.
pub(crate) async fn load_config(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
) -> Result<GuildConfig, Error> {
    Ok(get_guild_config(&ctx.data().db, guild_id.get())
        .await?
        .unwrap_or_default())
}

/// Apply `change` to the guild's config and persist it.
///
/// A rejected change leaves the stored config untouched and is returned as
/// the inner error so the caller can report it.
pub(crate) async fn update_config<F>(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
    change: F,
) -> Result<Result<GuildConfig, ValidationError>, Error>
where
    F: FnOnce(&mut GuildConfig) -> Result<(), ValidationError>,
{
    let mut config = load_config(ctx, guild_id).await?;
    if let Err(err) = change(&mut config) {
        return Ok(Err(err));
    }

    save_guild_config(&ctx.data().db, guild_id.get(), &config).await?;
    Ok(Ok(config))
}

/// Apply a change that needs no validation, such as a toggle, and persist it.
pub(crate) async fn modify_config<F>(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
    change: F,
) -> Result<GuildConfig, Error>
where
    F: FnOnce(&mut GuildConfig),
{
    let mut config = load_config(ctx, guild_id).await?;
    change(&mut config);

    save_guild_config(&ctx.data().db, guild_id.get(), &config).await?;
    Ok(config)
}

pub(crate) async fn reply_ephemeral(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;
    Ok(())
}

pub(crate) async fn reply_validation_error(
    ctx: Context<'_>,
    err: &ValidationError,
) -> Result<(), Error> {
    let embed = build_error_embed(
        "Invalid Setting",
        format!("**{}** {}. Nothing was changed.", err.field, err.reason),
    );

    ctx.send(CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
