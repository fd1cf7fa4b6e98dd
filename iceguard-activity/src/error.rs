use thiserror::Error;

/// Rejected configuration input. `field` names the offending setting.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure reported by the chat platform when editing a channel.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlatformApiError {
    #[error("rate limited by the platform")]
    RateLimited,
    #[error("missing permissions to manage channel")]
    MissingPermissions,
    #[error("platform request failed: {0}")]
    Request(String),
}

#[cfg(test)]
mod tests {
    use super::{PlatformApiError, ValidationError};

    #[test]
    fn validation_error_names_the_field() {
        let err = ValidationError::new("threshold", "must be at least 1");
        assert_eq!(err.to_string(), "invalid threshold: must be at least 1");
        assert_eq!(err.field, "threshold");
    }

    #[test]
    fn platform_errors_render() {
        assert_eq!(
            PlatformApiError::MissingPermissions.to_string(),
            "missing permissions to manage channel"
        );
        assert_eq!(
            PlatformApiError::Request("boom".to_owned()).to_string(),
            "platform request failed: boom"
        );
    }
}
