use std::future::{Future, ready};
use std::sync::Mutex;

use crate::controller::SlowmodeApi;
use crate::error::PlatformApiError;

/// In-memory platform that records every slow-mode call.
#[derive(Debug, Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<(u64, u16)>>,
    failures: Mutex<Vec<PlatformApiError>>,
}

impl RecordingApi {
    pub fn calls(&self) -> Vec<(u64, u16)> {
        self.calls.lock().unwrap().clone()
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: PlatformApiError) {
        self.failures.lock().unwrap().push(error);
    }
}

impl SlowmodeApi for RecordingApi {
    fn set_slowmode(
        &self,
        channel_id: u64,
        delay_seconds: u16,
    ) -> impl Future<Output = Result<(), PlatformApiError>> + Send {
        self.calls.lock().unwrap().push((channel_id, delay_seconds));
        let result = match self.failures.lock().unwrap().pop() {
            Some(error) => Err(error),
            None => Ok(()),
        };
        ready(result)
    }
}
