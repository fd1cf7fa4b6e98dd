/// Generic embed builders shared across commands.
pub mod embed;
/// Shared formatting helpers (durations, counts, channel mentions).
pub mod formatting;
/// Permission helper utilities.
pub mod permissions;
