//! Wall-clock source shared by the scheduler, rounds and jobs.
//!
//! Expiry and backoff times are absolute `SystemTime`s. The default clock is
//! anchored to `tokio::time::Instant` so that tests running with a paused
//! tokio clock see expiry, backoff and round deadlines move with
//! `tokio::time::advance`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of "now" for every time-dependent decision in the updater.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock whose progress is driven by the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    wall: SystemTime,
    anchor: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::starting_at(SystemTime::now())
    }

    /// A clock that reads `wall` right now and advances with the tokio timer.
    pub fn starting_at(wall: SystemTime) -> Self {
        Self {
            wall,
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> SystemTime {
        self.wall + self.anchor.elapsed()
    }
}

/// Milliseconds since the Unix epoch (0 for times before it).
pub fn to_unix_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u64::MAX as u128) as u64)
        .unwrap_or(0)
}

pub fn from_unix_millis(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

/// Serde adapter storing a `SystemTime` as Unix milliseconds, so snapshots
/// stay hand-editable.
pub mod unix_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::SystemTime;

    pub fn serialize<S: Serializer>(t: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(super::to_unix_millis(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SystemTime, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(super::from_unix_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_millis_roundtrip() {
        let t = from_unix_millis(1_700_000_000_123);
        assert_eq!(to_unix_millis(t), 1_700_000_000_123);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        let before = clock.now();
        tokio::time::advance(Duration::from_secs(90)).await;
        let after = clock.now();
        assert_eq!(after.duration_since(before).unwrap(), Duration::from_secs(90));
    }
}
