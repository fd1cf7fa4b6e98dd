/// Per-guild cooldown configuration and input validation.
pub mod config;
/// Controller that applies or lifts slow-mode through the platform API.
pub mod controller;
/// Error kinds surfaced by the activity core.
pub mod error;
/// Threshold evaluation over the sliding window.
pub mod evaluator;
/// Ties tracker, evaluator and controller together per channel.
pub mod monitor;
/// Sliding-window message tracking per channel.
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ChannelScope, GuildConfig};
pub use controller::{CooldownController, SlowmodeApi, Transition};
pub use error::{PlatformApiError, ValidationError};
pub use evaluator::{Evaluation, evaluate};
pub use monitor::{CooldownMonitor, MonitorSettings, Outcome, SweepReport};
pub use tracker::{ActivityTracker, ChannelActivityState, ChannelState};
