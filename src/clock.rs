use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time, in whole seconds since the Unix epoch.
///
/// Deadlines are compared against this clock whenever a decision is
/// resolved. There is no background timer: a deadline only "fires" when
/// somebody asks.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> i64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}
