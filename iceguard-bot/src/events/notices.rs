use poise::serenity_prelude as serenity;
use tracing::{error, warn};

use iceguard_activity::{Outcome, Transition};
use iceguard_core::slowmode::is_missing_permissions;
use iceguard_utils::formatting::format_compact_duration;

/// Channel notice for a transition, if it deserves one.
pub fn transition_notice(transition: Transition) -> Option<String> {
    match transition {
        Transition::Engaged { delay } => Some(format!(
            "🐢 Slowmode enabled due to high activity. Members can send one message every **{}**.",
            format_compact_duration(u64::from(delay))
        )),
        Transition::Released => {
            Some("🚀 Activity has slowed down. Slowmode has been disabled.".to_owned())
        }
        Transition::Adjusted { .. } | Transition::Unchanged | Transition::Deferred => None,
    }
}

pub fn missing_permissions_notice() -> &'static str {
    "⚠️ I can't change slowmode in this channel. Please give me the **Manage Channels** \
     permission here; until then I'll only retry every few minutes."
}

/// Post the notice for `outcome` in its channel. Failures are logged only.
pub async fn announce_transition(http: &serenity::Http, outcome: &Outcome) {
    let Some(notice) = transition_notice(outcome.transition) else {
        return;
    };

    post_notice(http, outcome.channel_id, notice).await;
}

/// Tell a channel once that slowmode could not be changed there.
pub async fn announce_missing_permissions(http: &serenity::Http, guild_id: u64, channel_id: u64) {
    warn!(guild_id, channel_id, "slowmode refused; notifying channel");
    post_notice(http, channel_id, missing_permissions_notice()).await;
}

async fn post_notice(http: &serenity::Http, channel_id: u64, notice: impl Into<String>) {
    let channel = serenity::ChannelId::new(channel_id);
    if let Err(source) = channel.say(http, notice).await {
        if is_missing_permissions(&source) {
            warn!(channel_id, "missing permissions to post slowmode notice");
        } else {
            error!(?source, channel_id, "failed to post slowmode notice");
        }
    }
}
