use poise::serenity_prelude as serenity;

/// Resolve a member's effective guild-level permissions from their roles.
pub async fn resolve_user_permissions(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> anyhow::Result<serenity::Permissions> {
    let guild = guild_id.to_partial_guild(http).await?;
    if guild.owner_id == user_id {
        return Ok(serenity::Permissions::all());
    }

    let member = guild_id.member(http, user_id).await?;
    let roles = guild_id.roles(http).await?;

    let mut resolved = serenity::Permissions::empty();
    let everyone_role_id = serenity::RoleId::new(guild_id.get());

    for role in roles.values() {
        if role.id == everyone_role_id || member.roles.contains(&role.id) {
            resolved |= role.permissions;
        }
    }

    Ok(resolved)
}

/// Administrator always passes; otherwise `required` must be fully held.
pub fn permits(perms: serenity::Permissions, required: serenity::Permissions) -> bool {
    perms.contains(serenity::Permissions::ADMINISTRATOR) || perms.contains(required)
}

pub async fn has_user_permission(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    required: serenity::Permissions,
) -> anyhow::Result<bool> {
    let perms = resolve_user_permissions(http, guild_id, user_id).await?;

    Ok(permits(perms, required))
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude::Permissions;

    use super::permits;

    #[test]
    fn administrator_passes_every_check() {
        assert!(permits(Permissions::ADMINISTRATOR, Permissions::MANAGE_CHANNELS));
    }

    #[test]
    fn manage_channels_required_otherwise() {
        assert!(permits(
            Permissions::MANAGE_CHANNELS | Permissions::SEND_MESSAGES,
            Permissions::MANAGE_CHANNELS
        ));
        assert!(!permits(Permissions::SEND_MESSAGES, Permissions::MANAGE_CHANNELS));
    }
}
