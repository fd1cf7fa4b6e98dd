use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::config::GuildConfig;
use crate::error::PlatformApiError;
use crate::tracker::ChannelActivityState;

/// Wait after a rejected or failed change before trying again.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(10);
/// Permissions rarely come back quickly; retry much less often.
pub const PERMISSION_BACKOFF: Duration = Duration::from_secs(300);

/// The one platform operation the controller needs.
pub trait SlowmodeApi: Send + Sync {
    /// Set a channel's per-user slow-mode delay; zero clears it.
    fn set_slowmode(
        &self,
        channel_id: u64,
        delay_seconds: u16,
    ) -> impl Future<Output = Result<(), PlatformApiError>> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Idle → Cooldown.
    Engaged { delay: u16 },
    /// Still in cooldown, with a new delay.
    Adjusted { from: u16, to: u16 },
    /// Cooldown → Idle.
    Released,
    /// A change is due but a recent failure is still backing off.
    Deferred,
}

#[derive(Debug)]
pub struct CooldownController<A> {
    api: A,
}

impl<A: SlowmodeApi> CooldownController<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Bring the channel's slow-mode in line with the evaluation.
    ///
    /// Only calls the platform when the desired delay differs from the one
    /// last applied. On failure the applied delay is left untouched and no
    /// further attempt is made until the backoff has passed.
    pub async fn apply(
        &self,
        state: &mut ChannelActivityState,
        should_cooldown: bool,
        config: &GuildConfig,
        now: Instant,
    ) -> Result<Transition, PlatformApiError> {
        let target = if should_cooldown {
            config.cooldown_seconds()
        } else {
            0
        };

        if state.applied_delay() != target && state.in_backoff(now) {
            return Ok(Transition::Deferred);
        }

        self.transition_to(state, target, now).await
    }

    /// Lift any slow-mode this controller applied. Explicit requests ignore
    /// a pending backoff.
    pub async fn release(
        &self,
        state: &mut ChannelActivityState,
        now: Instant,
    ) -> Result<Transition, PlatformApiError> {
        self.transition_to(state, 0, now).await
    }

    async fn transition_to(
        &self,
        state: &mut ChannelActivityState,
        target: u16,
        now: Instant,
    ) -> Result<Transition, PlatformApiError> {
        let current = state.applied_delay();
        if current == target {
            return Ok(Transition::Unchanged);
        }

        if let Err(source) = self.api.set_slowmode(state.channel_id(), target).await {
            let backoff = backoff_after(&source);
            state.mark_failed(&source, now + backoff);

            match &source {
                PlatformApiError::RateLimited | PlatformApiError::MissingPermissions => {
                    warn!(
                        %source,
                        guild_id = state.guild_id(),
                        channel_id = state.channel_id(),
                        target_delay = target,
                        retry_in_seconds = backoff.as_secs(),
                        "slowmode change rejected; backing off"
                    );
                }
                PlatformApiError::Request(_) => {
                    error!(
                        %source,
                        guild_id = state.guild_id(),
                        channel_id = state.channel_id(),
                        target_delay = target,
                        retry_in_seconds = backoff.as_secs(),
                        "slowmode change failed; backing off"
                    );
                }
            }
            return Err(source);
        }

        state.mark_applied(target);

        let transition = match (current, target) {
            (0, delay) => Transition::Engaged { delay },
            (_, 0) => Transition::Released,
            (from, to) => Transition::Adjusted { from, to },
        };

        info!(
            guild_id = state.guild_id(),
            channel_id = state.channel_id(),
            ?transition,
            "slowmode updated"
        );

        Ok(transition)
    }
}

fn backoff_after(error: &PlatformApiError) -> Duration {
    match error {
        PlatformApiError::MissingPermissions => PERMISSION_BACKOFF,
        PlatformApiError::RateLimited | PlatformApiError::Request(_) => RETRY_BACKOFF,
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{CooldownController, PERMISSION_BACKOFF, RETRY_BACKOFF, Transition};
    use crate::config::GuildConfig;
    use crate::error::PlatformApiError;
    use crate::testing::RecordingApi;
    use crate::tracker::{ChannelActivityState, ChannelState};

    fn config() -> GuildConfig {
        GuildConfig::from_parts(5, 60, 15, true).unwrap()
    }

    #[tokio::test]
    async fn repeated_apply_calls_platform_once() {
        let controller = CooldownController::new(RecordingApi::default());
        let now = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, now);

        let first = controller.apply(&mut state, true, &config(), now).await;
        let second = controller.apply(&mut state, true, &config(), now).await;

        assert_eq!(first, Ok(Transition::Engaged { delay: 15 }));
        assert_eq!(second, Ok(Transition::Unchanged));
        assert_eq!(controller.api().calls(), vec![(10, 15)]);
        assert_eq!(state.state(), ChannelState::Cooldown);
    }

    #[tokio::test]
    async fn idle_channel_without_activity_makes_no_call() {
        let controller = CooldownController::new(RecordingApi::default());
        let now = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, now);

        let result = controller.apply(&mut state, false, &config(), now).await;

        assert_eq!(result, Ok(Transition::Unchanged));
        assert!(controller.api().calls().is_empty());
    }

    #[tokio::test]
    async fn clears_slowmode_when_activity_drops() {
        let controller = CooldownController::new(RecordingApi::default());
        let now = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, now);
        controller.apply(&mut state, true, &config(), now).await.unwrap();

        let result = controller.apply(&mut state, false, &config(), now).await;

        assert_eq!(result, Ok(Transition::Released));
        assert_eq!(controller.api().calls(), vec![(10, 15), (10, 0)]);
        assert_eq!(state.state(), ChannelState::Idle);
        assert_eq!(state.applied_delay(), 0);
    }

    #[tokio::test]
    async fn failed_call_waits_out_the_backoff_before_retrying() {
        let controller = CooldownController::new(RecordingApi::default());
        let start = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, start);
        controller.api().fail_next(PlatformApiError::RateLimited);

        let failed = controller.apply(&mut state, true, &config(), start).await;
        assert_eq!(failed, Err(PlatformApiError::RateLimited));
        assert_eq!(state.state(), ChannelState::Idle);
        assert_eq!(state.backoff_until(), Some(start + RETRY_BACKOFF));

        let early = start + RETRY_BACKOFF - Duration::from_secs(1);
        let deferred = controller.apply(&mut state, true, &config(), early).await;
        assert_eq!(deferred, Ok(Transition::Deferred));

        let retried = controller
            .apply(&mut state, true, &config(), start + RETRY_BACKOFF)
            .await;
        assert_eq!(retried, Ok(Transition::Engaged { delay: 15 }));
        assert_eq!(controller.api().calls(), vec![(10, 15), (10, 15)]);
        assert!(state.backoff_until().is_none());
    }

    #[tokio::test]
    async fn missing_permissions_backs_off_longer() {
        let controller = CooldownController::new(RecordingApi::default());
        let start = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, start);
        controller.api().fail_next(PlatformApiError::MissingPermissions);

        let failed = controller.apply(&mut state, true, &config(), start).await;

        assert_eq!(failed, Err(PlatformApiError::MissingPermissions));
        assert_eq!(state.backoff_until(), Some(start + PERMISSION_BACKOFF));
        assert!(state.permission_denied());
        let later = start + RETRY_BACKOFF;
        assert_eq!(
            controller.apply(&mut state, true, &config(), later).await,
            Ok(Transition::Deferred)
        );
        assert_eq!(controller.api().calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_release_keeps_cooldown() {
        let controller = CooldownController::new(RecordingApi::default());
        let now = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, now);
        controller.apply(&mut state, true, &config(), now).await.unwrap();
        controller.api().fail_next(PlatformApiError::MissingPermissions);

        let result = controller.release(&mut state, now).await;

        assert_eq!(result, Err(PlatformApiError::MissingPermissions));
        assert_eq!(state.state(), ChannelState::Cooldown);
        assert_eq!(state.applied_delay(), 15);
    }

    #[tokio::test]
    async fn explicit_release_ignores_backoff() {
        let controller = CooldownController::new(RecordingApi::default());
        let now = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, now);
        controller.apply(&mut state, true, &config(), now).await.unwrap();
        controller.api().fail_next(PlatformApiError::RateLimited);
        let _ = controller.release(&mut state, now).await;

        let result = controller.release(&mut state, now).await;

        assert_eq!(result, Ok(Transition::Released));
        assert_eq!(controller.api().calls(), vec![(10, 15), (10, 0), (10, 0)]);
    }

    #[tokio::test]
    async fn changed_delay_is_reapplied_while_cooling() {
        let controller = CooldownController::new(RecordingApi::default());
        let now = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, now);
        controller.apply(&mut state, true, &config(), now).await.unwrap();

        let mut slower = config();
        slower.set_cooldown(60).unwrap();
        let result = controller.apply(&mut state, true, &slower, now).await;

        assert_eq!(result, Ok(Transition::Adjusted { from: 15, to: 60 }));
        assert_eq!(state.applied_delay(), 60);
    }
}
