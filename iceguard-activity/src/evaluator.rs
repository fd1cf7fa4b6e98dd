use std::time::Instant;

use crate::config::GuildConfig;
use crate::tracker::ChannelActivityState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub count: usize,
    pub should_cooldown: bool,
}

/// Decide whether a channel should be in cooldown right now.
///
/// True iff the guild is enabled and the windowed message count has reached
/// the threshold.
pub fn evaluate(state: &mut ChannelActivityState, config: &GuildConfig, now: Instant) -> Evaluation {
    let count = state.count_within(config.window(), now);

    Evaluation {
        count,
        should_cooldown: config.enabled() && count >= config.threshold() as usize,
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::evaluate;
    use crate::config::GuildConfig;
    use crate::tracker::ChannelActivityState;

    fn config(threshold: i64, window: i64) -> GuildConfig {
        GuildConfig::from_parts(threshold, window, 10, true).unwrap()
    }

    #[test]
    fn triggers_at_threshold() {
        let start = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, start);
        let config = config(5, 60);

        for second in 0..4 {
            state.record(start + Duration::from_secs(second));
        }
        assert!(!evaluate(&mut state, &config, start + Duration::from_secs(4)).should_cooldown);

        state.record(start + Duration::from_secs(4));
        let evaluation = evaluate(&mut state, &config, start + Duration::from_secs(4));
        assert_eq!(evaluation.count, 5);
        assert!(evaluation.should_cooldown);
    }

    #[test]
    fn disabled_guilds_never_cool_down() {
        let start = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, start);
        let mut config = config(1, 60);
        config.set_enabled(false);
        state.record(start);

        let evaluation = evaluate(&mut state, &config, start);
        assert_eq!(evaluation.count, 1);
        assert!(!evaluation.should_cooldown);
    }

    #[test]
    fn expired_messages_do_not_count() {
        let start = Instant::now();
        let mut state = ChannelActivityState::new(1, 10, start);
        let config = config(2, 10);
        state.record(start);
        state.record(start + Duration::from_secs(1));

        let evaluation = evaluate(&mut state, &config, start + Duration::from_secs(12));
        assert_eq!(evaluation.count, 0);
        assert!(!evaluation.should_cooldown);
    }
}
