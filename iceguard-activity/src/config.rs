use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Discord refuses slow-mode delays above six hours.
pub const MAX_SLOWMODE_SECONDS: u16 = 21_600;
pub const MAX_THRESHOLD: u32 = 10_000;
pub const MAX_WINDOW_SECONDS: u32 = 3_600;

pub const DEFAULT_THRESHOLD: u32 = 5;
pub const DEFAULT_WINDOW_SECONDS: u32 = 10;
pub const DEFAULT_COOLDOWN_SECONDS: u16 = 3;

/// Which channels of a guild are watched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelScope {
    /// Every channel.
    #[default]
    All,
    /// Only channels on the guild's monitored list. An empty list watches
    /// nothing.
    Listed,
}

impl ChannelScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Listed => "listed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" => Some(Self::All),
            "listed" => Some(Self::Listed),
            _ => None,
        }
    }

    /// Whether `channel_id` is watched given the guild's monitored list.
    pub fn covers(self, listed: &[u64], channel_id: u64) -> bool {
        match self {
            Self::All => true,
            Self::Listed => listed.contains(&channel_id),
        }
    }
}

/// Cooldown settings for one guild.
///
/// Values are only ever built through the validating setters, so a
/// `GuildConfig` in hand always has a positive threshold, a positive window
/// and a cooldown delay inside Discord's slow-mode range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    threshold: u32,
    window_seconds: u32,
    cooldown_seconds: u16,
    enabled: bool,
    #[serde(default)]
    scope: ChannelScope,
}

impl Default for GuildConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            window_seconds: DEFAULT_WINDOW_SECONDS,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            enabled: false,
            scope: ChannelScope::All,
        }
    }
}

impl GuildConfig {
    /// Build a config from raw stored values, validating every field.
    pub fn from_parts(
        threshold: i64,
        window_seconds: i64,
        cooldown_seconds: i64,
        enabled: bool,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            threshold: validate_threshold(threshold)?,
            window_seconds: validate_window(window_seconds)?,
            cooldown_seconds: validate_cooldown(cooldown_seconds)?,
            enabled,
            scope: ChannelScope::All,
        })
    }

    pub fn with_scope(mut self, scope: ChannelScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn window_seconds(&self) -> u32 {
        self.window_seconds
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::from(self.window_seconds))
    }

    pub fn cooldown_seconds(&self) -> u16 {
        self.cooldown_seconds
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn scope(&self) -> ChannelScope {
        self.scope
    }

    pub fn set_threshold(&mut self, raw: i64) -> Result<u32, ValidationError> {
        self.threshold = validate_threshold(raw)?;
        Ok(self.threshold)
    }

    pub fn set_window(&mut self, raw: i64) -> Result<u32, ValidationError> {
        self.window_seconds = validate_window(raw)?;
        Ok(self.window_seconds)
    }

    pub fn set_cooldown(&mut self, raw: i64) -> Result<u16, ValidationError> {
        self.cooldown_seconds = validate_cooldown(raw)?;
        Ok(self.cooldown_seconds)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_scope(&mut self, scope: ChannelScope) {
        self.scope = scope;
    }
}

pub fn validate_threshold(raw: i64) -> Result<u32, ValidationError> {
    bounded("threshold", raw, 1, i64::from(MAX_THRESHOLD)).map(|value| value as u32)
}

pub fn validate_window(raw: i64) -> Result<u32, ValidationError> {
    bounded("window", raw, 1, i64::from(MAX_WINDOW_SECONDS)).map(|value| value as u32)
}

pub fn validate_cooldown(raw: i64) -> Result<u16, ValidationError> {
    bounded("cooldown", raw, 1, i64::from(MAX_SLOWMODE_SECONDS)).map(|value| value as u16)
}

fn bounded(field: &'static str, raw: i64, min: i64, max: i64) -> Result<i64, ValidationError> {
    if raw < min {
        return Err(ValidationError::new(
            field,
            format!("must be a positive integer (got {raw})"),
        ));
    }

    if raw > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} (got {raw})"),
        ));
    }

    Ok(raw)
}
