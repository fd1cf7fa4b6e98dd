use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitoredChannel {
    pub guild_id: u64,
    pub channel_id: u64,
    pub added_by: u64,
    pub created_at: u64,
}
