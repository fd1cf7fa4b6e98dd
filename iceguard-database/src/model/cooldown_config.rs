use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use iceguard_activity::{ChannelScope, GuildConfig};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CooldownConfigRow {
    pub guild_id: i64,
    pub activity_threshold: i32,
    pub window_seconds: i32,
    pub cooldown_seconds: i32,
    pub enabled: bool,
    pub monitor_scope: String,
}

impl CooldownConfigRow {
    /// Validate the stored values into a domain config.
    pub fn into_config(self) -> anyhow::Result<GuildConfig> {
        let scope = ChannelScope::parse(&self.monitor_scope).with_context(|| {
            format!(
                "unknown monitor scope `{}` for guild {}",
                self.monitor_scope, self.guild_id
            )
        })?;

        let config = GuildConfig::from_parts(
            i64::from(self.activity_threshold),
            i64::from(self.window_seconds),
            i64::from(self.cooldown_seconds),
            self.enabled,
        )
        .with_context(|| format!("corrupt cooldown config for guild {}", self.guild_id))?;

        Ok(config.with_scope(scope))
    }
}

#[cfg(test)]
mod tests {
    use iceguard_activity::ChannelScope;

    use super::CooldownConfigRow;

    fn row(threshold: i32) -> CooldownConfigRow {
        CooldownConfigRow {
            guild_id: 7,
            activity_threshold: threshold,
            window_seconds: 30,
            cooldown_seconds: 5,
            enabled: true,
            monitor_scope: "all".to_owned(),
        }
    }

    #[test]
    fn converts_valid_rows() {
        let config = row(8).into_config().unwrap();
        assert_eq!(config.threshold(), 8);
        assert_eq!(config.window_seconds(), 30);
        assert_eq!(config.cooldown_seconds(), 5);
        assert!(config.enabled());
        assert_eq!(config.scope(), ChannelScope::All);
    }

    #[test]
    fn reads_listed_scope() {
        let mut listed = row(8);
        listed.monitor_scope = "listed".to_owned();
        assert_eq!(listed.into_config().unwrap().scope(), ChannelScope::Listed);

        let mut unknown = row(8);
        unknown.monitor_scope = "everything".to_owned();
        assert!(unknown.into_config().is_err());
    }

    #[test]
    fn rejects_rows_that_break_invariants() {
        let err = row(0).into_config().unwrap_err();
        assert!(err.to_string().contains("guild 7"));
    }
}
