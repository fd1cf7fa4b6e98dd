use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::GuildConfig;
use crate::controller::{CooldownController, SlowmodeApi, Transition};
use crate::error::PlatformApiError;
use crate::evaluator::evaluate;
use crate::tracker::{ActivityTracker, ChannelActivityState};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_IDLE_EVICTION: Duration = Duration::from_secs(600);

/// Startup knobs for the monitor, read once by the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorSettings {
    pub sweep_interval: Duration,
    pub idle_eviction: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            idle_eviction: DEFAULT_IDLE_EVICTION,
        }
    }
}

/// Result of evaluating one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub guild_id: u64,
    pub channel_id: u64,
    pub count: usize,
    pub transition: Transition,
}

#[derive(Debug, Default)]
pub struct SweepReport {
    pub changed: Vec<Outcome>,
    pub failed: usize,
    /// `(guild_id, channel_id)` of channels refused for lack of permissions.
    pub denied: Vec<(u64, u64)>,
    pub skipped: usize,
    pub evicted: usize,
}

/// Activity tracking and slow-mode control for every channel the bot sees.
#[derive(Debug)]
pub struct CooldownMonitor<A> {
    tracker: ActivityTracker,
    controller: CooldownController<A>,
    settings: MonitorSettings,
}

impl<A: SlowmodeApi> CooldownMonitor<A> {
    pub fn new(api: A, settings: MonitorSettings) -> Self {
        Self {
            tracker: ActivityTracker::new(),
            controller: CooldownController::new(api),
            settings,
        }
    }

    pub fn settings(&self) -> MonitorSettings {
        self.settings
    }

    pub fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }

    pub fn controller(&self) -> &CooldownController<A> {
        &self.controller
    }

    /// Record a message and act on the resulting evaluation.
    pub async fn observe(
        &self,
        guild_id: u64,
        channel_id: u64,
        config: &GuildConfig,
        now: Instant,
    ) -> Result<Outcome, PlatformApiError> {
        let entry = self.tracker.record_message(guild_id, channel_id, now).await;
        let mut state = entry.lock().await;
        self.evaluate_and_apply(&mut state, config, now).await
    }

    /// Re-run evaluation for a tracked channel without a new message.
    ///
    /// `None` means the channel is no longer monitored, which lifts any
    /// slow-mode. Returns `None` for channels that were never tracked.
    pub async fn reevaluate(
        &self,
        channel_id: u64,
        config: Option<&GuildConfig>,
        now: Instant,
    ) -> Option<Result<Outcome, PlatformApiError>> {
        let entry = self.tracker.channel(channel_id).await?;
        let config = config.copied().unwrap_or_default();
        let mut state = entry.lock().await;
        Some(self.evaluate_and_apply(&mut state, &config, now).await)
    }

    /// Lift slow-mode on one channel if the bot applied it.
    pub async fn release(&self, channel_id: u64) -> Result<Transition, PlatformApiError> {
        match self.tracker.channel(channel_id).await {
            Some(entry) => {
                self.controller
                    .release(&mut *entry.lock().await, Instant::now())
                    .await
            }
            None => Ok(Transition::Unchanged),
        }
    }

    /// Lift every slow-mode the bot applied in a guild.
    pub async fn release_guild(
        &self,
        guild_id: u64,
    ) -> Vec<(u64, Result<Transition, PlatformApiError>)> {
        let mut results = Vec::new();
        for entry in self.tracker.guild_channels(guild_id).await {
            let mut state = entry.lock().await;
            let result = self.controller.release(&mut state, Instant::now()).await;
            results.push((state.channel_id(), result));
        }
        results
    }

    /// Release a channel and drop its record. The record is kept when the
    /// release fails so a later sweep can retry it.
    pub async fn forget(&self, channel_id: u64) -> Result<Transition, PlatformApiError> {
        let transition = self.release(channel_id).await?;
        self.tracker.forget(channel_id).await;
        Ok(transition)
    }

    /// Release and drop every channel of a guild.
    pub async fn forget_guild(&self, guild_id: u64) -> usize {
        let mut forgotten = 0;
        for (channel_id, result) in self.release_guild(guild_id).await {
            if result.is_ok() && self.tracker.forget(channel_id).await {
                forgotten += 1;
            }
        }
        forgotten
    }

    /// Whether a permission notice should be posted for the channel. Returns
    /// `true` at most once per denial.
    pub async fn take_permission_notice(&self, channel_id: u64) -> bool {
        match self.tracker.channel(channel_id).await {
            Some(entry) => entry.lock().await.take_permission_notice(),
            None => false,
        }
    }

    /// `(guild_id, channel_id)` of every tracked channel.
    pub async fn tracked(&self) -> Vec<(u64, u64)> {
        let mut tracked = Vec::new();
        for entry in self.tracker.channels().await {
            let state = entry.lock().await;
            tracked.push((state.guild_id(), state.channel_id()));
        }
        tracked
    }

    /// Channels of a guild currently in cooldown, with their applied delay.
    pub async fn active_cooldowns(&self, guild_id: u64) -> Vec<(u64, u16)> {
        let mut active = Vec::new();
        for entry in self.tracker.guild_channels(guild_id).await {
            let state = entry.lock().await;
            if state.cooldown_active() {
                active.push((state.channel_id(), state.applied_delay()));
            }
        }
        active.sort_unstable();
        active
    }

    /// Re-evaluate every tracked channel, then evict idle ones.
    ///
    /// `config_for` resolves the config that currently applies to a channel,
    /// or `Ok(None)` when the channel should not be monitored any more. A
    /// channel whose lookup fails is skipped until the next sweep.
    pub async fn sweep<F, Fut, E>(&self, now: Instant, mut config_for: F) -> SweepReport
    where
        F: FnMut(u64, u64) -> Fut,
        Fut: Future<Output = Result<Option<GuildConfig>, E>>,
    {
        let mut report = SweepReport::default();

        for (guild_id, channel_id) in self.tracked().await {
            let Ok(config) = config_for(guild_id, channel_id).await else {
                report.skipped += 1;
                continue;
            };

            match self.reevaluate(channel_id, config.as_ref(), now).await {
                Some(Ok(outcome))
                    if !matches!(
                        outcome.transition,
                        Transition::Unchanged | Transition::Deferred
                    ) =>
                {
                    report.changed.push(outcome);
                }
                Some(Err(PlatformApiError::MissingPermissions)) => {
                    report.failed += 1;
                    report.denied.push((guild_id, channel_id));
                }
                Some(Err(_)) => report.failed += 1,
                _ => {}
            }
        }

        report.evicted = self
            .tracker
            .evict_idle(self.settings.idle_eviction, now)
            .await;

        if report.evicted > 0 {
            debug!(evicted = report.evicted, "evicted idle channel activity");
        }

        report
    }

    async fn evaluate_and_apply(
        &self,
        state: &mut ChannelActivityState,
        config: &GuildConfig,
        now: Instant,
    ) -> Result<Outcome, PlatformApiError> {
        let evaluation = evaluate(state, config, now);
        let transition = self
            .controller
            .apply(state, evaluation.should_cooldown, config, now)
            .await?;

        Ok(Outcome {
            guild_id: state.guild_id(),
            channel_id: state.channel_id(),
            count: evaluation.count,
            transition,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::time::{Duration, Instant};

    use super::{CooldownMonitor, MonitorSettings};
    use crate::config::GuildConfig;
    use crate::controller::{PERMISSION_BACKOFF, RETRY_BACKOFF, Transition};
    use crate::error::PlatformApiError;
    use crate::testing::RecordingApi;
    use crate::tracker::ChannelState;

    const GUILD: u64 = 1;
    const CHANNEL: u64 = 100;

    fn monitor() -> CooldownMonitor<RecordingApi> {
        CooldownMonitor::new(RecordingApi::default(), MonitorSettings::default())
    }

    fn config() -> GuildConfig {
        GuildConfig::from_parts(5, 60, 30, true).unwrap()
    }

    async fn channel_state(monitor: &CooldownMonitor<RecordingApi>) -> ChannelState {
        let entry = monitor.tracker().channel(CHANNEL).await.unwrap();
        entry.lock().await.state()
    }

    #[tokio::test]
    async fn burst_engages_then_quiet_releases() {
        let monitor = monitor();
        let config = config();
        let start = Instant::now();

        let mut outcomes = Vec::new();
        for second in 0..6 {
            let at = start + Duration::from_secs(second * 2);
            outcomes.push(monitor.observe(GUILD, CHANNEL, &config, at).await.unwrap());
        }

        assert_eq!(outcomes[3].transition, Transition::Unchanged);
        assert_eq!(outcomes[4].transition, Transition::Engaged { delay: 30 });
        assert_eq!(outcomes[5].transition, Transition::Unchanged);
        assert_eq!(outcomes[5].count, 6);
        assert_eq!(channel_state(&monitor).await, ChannelState::Cooldown);

        let later = start + Duration::from_secs(10 + 61);
        let outcome = monitor
            .reevaluate(CHANNEL, Some(&config), later)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.count, 0);
        assert_eq!(outcome.transition, Transition::Released);
        assert_eq!(channel_state(&monitor).await, ChannelState::Idle);
        assert_eq!(
            monitor.controller().api().calls(),
            vec![(CHANNEL, 30), (CHANNEL, 0)]
        );
    }

    #[tokio::test]
    async fn failed_engage_is_retried_after_backoff() {
        let monitor = monitor();
        let config = config();
        let start = Instant::now();
        for _ in 0..4 {
            monitor.observe(GUILD, CHANNEL, &config, start).await.unwrap();
        }

        monitor
            .controller()
            .api()
            .fail_next(PlatformApiError::Request("connection reset".to_owned()));
        let failed = monitor.observe(GUILD, CHANNEL, &config, start).await;
        assert!(failed.is_err());
        assert_eq!(channel_state(&monitor).await, ChannelState::Idle);

        let deferred = monitor.observe(GUILD, CHANNEL, &config, start).await.unwrap();
        assert_eq!(deferred.transition, Transition::Deferred);

        let after = start + RETRY_BACKOFF;
        let retried = monitor.observe(GUILD, CHANNEL, &config, after).await.unwrap();
        assert_eq!(retried.transition, Transition::Engaged { delay: 30 });
        assert_eq!(monitor.controller().api().calls().len(), 2);
    }

    #[tokio::test]
    async fn denied_channel_is_not_hammered_by_messages() {
        let monitor = monitor();
        let config = GuildConfig::from_parts(5, 3600, 30, true).unwrap();
        let start = Instant::now();
        for _ in 0..50 {
            monitor
                .controller()
                .api()
                .fail_next(PlatformApiError::MissingPermissions);
        }

        let mut denied = 0;
        for message in 0..50 {
            let at = start + Duration::from_millis(message * 100);
            if monitor.observe(GUILD, CHANNEL, &config, at).await.is_err() {
                denied += 1;
            }
        }

        assert_eq!(denied, 1);
        assert_eq!(monitor.controller().api().calls(), vec![(CHANNEL, 30)]);
        assert!(monitor.take_permission_notice(CHANNEL).await);
        assert!(!monitor.take_permission_notice(CHANNEL).await);

        let report = monitor
            .sweep(start + PERMISSION_BACKOFF, move |_, _| async move {
                Ok::<_, Infallible>(Some(config))
            })
            .await;
        assert_eq!(report.denied, vec![(GUILD, CHANNEL)]);
        assert_eq!(monitor.controller().api().calls().len(), 2);
        assert!(!monitor.take_permission_notice(CHANNEL).await);
    }

    #[tokio::test]
    async fn reevaluate_unknown_channel_is_none() {
        let monitor = monitor();
        assert!(
            monitor
                .reevaluate(CHANNEL, Some(&config()), Instant::now())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn unmonitored_channel_is_released_on_sweep() {
        let monitor = monitor();
        let config = config();
        let now = Instant::now();
        for _ in 0..5 {
            monitor.observe(GUILD, CHANNEL, &config, now).await.unwrap();
        }

        let report = monitor.sweep(now, |_, _| async { Ok::<_, Infallible>(None) }).await;

        assert_eq!(report.changed.len(), 1);
        assert_eq!(report.changed[0].transition, Transition::Released);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn sweep_keeps_channels_whose_release_failed() {
        let monitor = monitor();
        let config = config();
        let start = Instant::now();
        monitor.observe(GUILD, 200, &config, start).await.unwrap();
        for _ in 0..5 {
            monitor.observe(GUILD, CHANNEL, &config, start).await.unwrap();
        }

        monitor
            .controller()
            .api()
            .fail_next(PlatformApiError::MissingPermissions);
        let later = start + Duration::from_secs(700);
        let report = monitor.sweep(later, |_, _| async { Ok::<_, Infallible>(None) }).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.evicted, 1);
        assert!(monitor.tracker().channel(200).await.is_none());
        assert_eq!(channel_state(&monitor).await, ChannelState::Cooldown);

        assert_eq!(report.denied, vec![(GUILD, CHANNEL)]);

        let early = monitor.sweep(later, |_, _| async { Ok::<_, Infallible>(None) }).await;
        assert!(early.changed.is_empty());
        assert_eq!(early.failed, 0);

        let retry_at = later + PERMISSION_BACKOFF;
        let retry = monitor.sweep(retry_at, |_, _| async { Ok::<_, Infallible>(None) }).await;
        assert_eq!(retry.changed[0].transition, Transition::Released);
    }

    #[tokio::test]
    async fn failed_lookup_skips_channel_without_releasing() {
        let monitor = monitor();
        let config = config();
        let now = Instant::now();
        for _ in 0..5 {
            monitor.observe(GUILD, CHANNEL, &config, now).await.unwrap();
        }

        let report = monitor
            .sweep(now, |_, _| async { Err::<Option<GuildConfig>, _>("database down") })
            .await;

        assert_eq!(report.skipped, 1);
        assert!(report.changed.is_empty());
        assert_eq!(channel_state(&monitor).await, ChannelState::Cooldown);
    }

    #[tokio::test]
    async fn release_guild_and_status_listing() {
        let monitor = monitor();
        let config = config();
        let now = Instant::now();
        for channel in [CHANNEL, 101] {
            for _ in 0..5 {
                monitor.observe(GUILD, channel, &config, now).await.unwrap();
            }
        }
        for _ in 0..5 {
            monitor.observe(2, 300, &config, now).await.unwrap();
        }

        assert_eq!(
            monitor.active_cooldowns(GUILD).await,
            vec![(CHANNEL, 30), (101, 30)]
        );

        let released = monitor.release_guild(GUILD).await;
        assert_eq!(released.len(), 2);
        assert!(released.iter().all(|(_, result)| *result == Ok(Transition::Released)));
        assert!(monitor.active_cooldowns(GUILD).await.is_empty());
        assert_eq!(monitor.active_cooldowns(2).await, vec![(300, 30)]);
    }

    #[tokio::test]
    async fn forget_drops_channel_after_release() {
        let monitor = monitor();
        let config = config();
        let now = Instant::now();
        for _ in 0..5 {
            monitor.observe(GUILD, CHANNEL, &config, now).await.unwrap();
        }

        assert_eq!(monitor.forget(CHANNEL).await, Ok(Transition::Released));
        assert!(monitor.tracker().channel(CHANNEL).await.is_none());
        assert_eq!(monitor.forget(CHANNEL).await, Ok(Transition::Unchanged));
    }
}
