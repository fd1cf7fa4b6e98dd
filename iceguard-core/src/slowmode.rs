use std::fmt;
use std::sync::Arc;

use poise::serenity_prelude as serenity;

use iceguard_activity::{PlatformApiError, SlowmodeApi};

/// Discord's JSON error code for "Missing Permissions".
const MISSING_PERMISSIONS_CODE: i64 = 50013;

/// Applies slow-mode through Discord's channel edit endpoint.
#[derive(Clone)]
pub struct DiscordSlowmode {
    http: Arc<serenity::Http>,
}

impl fmt::Debug for DiscordSlowmode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordSlowmode").finish_non_exhaustive()
    }
}

impl DiscordSlowmode {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

impl SlowmodeApi for DiscordSlowmode {
    async fn set_slowmode(&self, channel_id: u64, delay_seconds: u16) -> Result<(), PlatformApiError> {
        let builder = serenity::EditChannel::new().rate_limit_per_user(delay_seconds);

        serenity::ChannelId::new(channel_id)
            .edit(&self.http, builder)
            .await
            .map(|_| ())
            .map_err(|source| platform_error(&source))
    }
}

/// Classify a serenity failure for the cooldown controller.
pub fn platform_error(source: &serenity::Error) -> PlatformApiError {
    if let serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)) = source
        && let Some(kind) =
            classify_response(response.status_code.as_u16(), response.error.code as i64)
    {
        return kind;
    }

    PlatformApiError::Request(source.to_string())
}

/// Map an HTTP status and Discord JSON error code to a known failure kind.
fn classify_response(status: u16, code: i64) -> Option<PlatformApiError> {
    match (status, code) {
        (429, _) => Some(PlatformApiError::RateLimited),
        (403, _) | (_, MISSING_PERMISSIONS_CODE) => Some(PlatformApiError::MissingPermissions),
        _ => None,
    }
}

/// Whether a serenity failure is a permission denial.
pub fn is_missing_permissions(source: &serenity::Error) -> bool {
    platform_error(source) == PlatformApiError::MissingPermissions
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude as serenity;

    use iceguard_activity::PlatformApiError;

    use super::{classify_response, is_missing_permissions, platform_error};

    #[test]
    fn too_many_requests_is_a_rate_limit() {
        assert_eq!(classify_response(429, 0), Some(PlatformApiError::RateLimited));
    }

    #[test]
    fn forbidden_or_missing_permissions_code_is_a_permission_error() {
        assert_eq!(
            classify_response(403, 50001),
            Some(PlatformApiError::MissingPermissions)
        );
        assert_eq!(
            classify_response(400, 50013),
            Some(PlatformApiError::MissingPermissions)
        );
    }

    #[test]
    fn other_responses_are_plain_request_failures() {
        assert_eq!(classify_response(404, 10003), None);
        assert_eq!(classify_response(500, 0), None);

        let source = serenity::Error::Other("gateway closed");
        assert_eq!(
            platform_error(&source),
            PlatformApiError::Request(source.to_string())
        );
        assert!(!is_missing_permissions(&source));
    }
}
