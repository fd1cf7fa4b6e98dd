use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use crate::error::PlatformApiError;

/// Slow-mode state of a single channel as seen by the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Cooldown,
}

/// Recent activity of one channel plus the slow-mode the bot has applied to it.
#[derive(Debug)]
pub struct ChannelActivityState {
    channel_id: u64,
    guild_id: u64,
    timestamps: VecDeque<Instant>,
    cooldown_active: bool,
    applied_delay: u16,
    last_seen: Instant,
    backoff_until: Option<Instant>,
    permission_denied: bool,
    permission_notified: bool,
}

impl ChannelActivityState {
    pub fn new(guild_id: u64, channel_id: u64, now: Instant) -> Self {
        Self {
            channel_id,
            guild_id,
            timestamps: VecDeque::new(),
            cooldown_active: false,
            applied_delay: 0,
            last_seen: now,
            backoff_until: None,
            permission_denied: false,
            permission_notified: false,
        }
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    pub fn state(&self) -> ChannelState {
        if self.cooldown_active {
            ChannelState::Cooldown
        } else {
            ChannelState::Idle
        }
    }

    pub fn cooldown_active(&self) -> bool {
        self.cooldown_active
    }

    /// Slow-mode delay last confirmed by the platform; zero while idle.
    pub fn applied_delay(&self) -> u16 {
        self.applied_delay
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// Earliest time the next slow-mode change may be attempted after a
    /// failed one.
    pub fn backoff_until(&self) -> Option<Instant> {
        self.backoff_until
    }

    pub fn in_backoff(&self, now: Instant) -> bool {
        self.backoff_until.is_some_and(|until| now < until)
    }

    /// The last slow-mode change was refused for lack of permissions.
    pub fn permission_denied(&self) -> bool {
        self.permission_denied
    }

    /// `true` once per permission denial, so the channel is told only once.
    /// Re-armed when a later change goes through.
    pub fn take_permission_notice(&mut self) -> bool {
        if !self.permission_denied || self.permission_notified {
            return false;
        }

        self.permission_notified = true;
        true
    }

    /// Append a message timestamp. Out-of-order timestamps are clamped to the
    /// newest one so the queue stays sorted.
    pub fn record(&mut self, at: Instant) {
        let at = match self.timestamps.back() {
            Some(newest) if *newest > at => *newest,
            _ => at,
        };

        self.timestamps.push_back(at);
        self.last_seen = self.last_seen.max(at);
    }

    /// Count messages within `[now - window, now]`, dropping older entries.
    pub fn count_within(&mut self, window: Duration, now: Instant) -> usize {
        if let Some(cutoff) = now.checked_sub(window) {
            while self.timestamps.front().is_some_and(|at| *at < cutoff) {
                self.timestamps.pop_front();
            }
        }

        self.timestamps.iter().filter(|at| **at <= now).count()
    }

    pub(crate) fn mark_applied(&mut self, delay: u16) {
        self.applied_delay = delay;
        self.cooldown_active = delay > 0;
        self.backoff_until = None;
        self.permission_denied = false;
        self.permission_notified = false;
    }

    pub(crate) fn mark_failed(&mut self, error: &PlatformApiError, retry_at: Instant) {
        self.backoff_until = Some(retry_at);
        if *error == PlatformApiError::MissingPermissions {
            self.permission_denied = true;
        }
    }
}

/// Per-channel activity records, created lazily on the first message.
///
/// Each channel sits behind its own mutex so that a slow platform call for one
/// channel never blocks handling of another.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    channels: RwLock<HashMap<u64, Arc<Mutex<ChannelActivityState>>>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message and return the channel's record.
    pub async fn record_message(
        &self,
        guild_id: u64,
        channel_id: u64,
        at: Instant,
    ) -> Arc<Mutex<ChannelActivityState>> {
        let entry = self.entry(guild_id, channel_id, at).await;
        entry.lock().await.record(at);
        entry
    }

    /// Number of messages in the window; zero for channels never seen.
    pub async fn current_count(&self, channel_id: u64, window: Duration, now: Instant) -> usize {
        match self.channel(channel_id).await {
            Some(entry) => entry.lock().await.count_within(window, now),
            None => 0,
        }
    }

    pub async fn channel(&self, channel_id: u64) -> Option<Arc<Mutex<ChannelActivityState>>> {
        self.channels.read().await.get(&channel_id).cloned()
    }

    pub async fn channels(&self) -> Vec<Arc<Mutex<ChannelActivityState>>> {
        self.channels.read().await.values().cloned().collect()
    }

    pub async fn guild_channels(&self, guild_id: u64) -> Vec<Arc<Mutex<ChannelActivityState>>> {
        let mut matching = Vec::new();
        for entry in self.channels().await {
            if entry.lock().await.guild_id() == guild_id {
                matching.push(entry);
            }
        }
        matching
    }

    pub async fn forget(&self, channel_id: u64) -> bool {
        self.channels.write().await.remove(&channel_id).is_some()
    }

    /// Drop every record of a guild without touching slow-mode.
    pub async fn forget_guild(&self, guild_id: u64) -> usize {
        let mut doomed = Vec::new();
        for entry in self.guild_channels(guild_id).await {
            doomed.push(entry.lock().await.channel_id());
        }

        let mut channels = self.channels.write().await;
        doomed
            .into_iter()
            .filter(|channel_id| channels.remove(channel_id).is_some())
            .count()
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }

    /// Drop idle channels with no message for `idle_for`. Channels in
    /// cooldown are kept so their slow-mode can still be lifted, as are
    /// records some caller still holds.
    pub async fn evict_idle(&self, idle_for: Duration, now: Instant) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();

        channels.retain(|_, entry| {
            if Arc::strong_count(entry) > 1 {
                return true;
            }

            match entry.try_lock() {
                Ok(state) => {
                    state.cooldown_active
                        || now.saturating_duration_since(state.last_seen) < idle_for
                }
                // Busy with a platform call right now.
                Err(_) => true,
            }
        });

        before - channels.len()
    }

    async fn entry(
        &self,
        guild_id: u64,
        channel_id: u64,
        now: Instant,
    ) -> Arc<Mutex<ChannelActivityState>> {
        if let Some(entry) = self.channel(channel_id).await {
            return entry;
        }

        self.channels
            .write()
            .await
            .entry(channel_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(ChannelActivityState::new(
                    guild_id, channel_id, now,
                )))
            })
            .clone()
    }
}
