// Range policy: static table of range key -> (lookback, sampling interval).
// Passed explicitly (AppState / tests); never a process-wide mutable.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::QueryError;

/// Bucket count bounds a sampled range must land in (lookback / interval).
pub const MIN_BUCKETS: u64 = 5;
pub const MAX_BUCKETS: u64 = 10;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDescriptor {
    pub key: String,
    pub lookback: Duration,
    /// None = always serve raw rows for this range.
    pub bucket_interval: Option<Duration>,
}

impl RangeDescriptor {
    pub fn new(key: &str, lookback_secs: u64, interval_secs: Option<u64>) -> Self {
        Self {
            key: key.to_string(),
            lookback: Duration::from_secs(lookback_secs),
            bucket_interval: interval_secs.map(Duration::from_secs),
        }
    }

    /// Start of the window for a query issued at `now` (wall clock).
    pub fn lookback_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let lookback = chrono::Duration::from_std(self.lookback).unwrap_or(chrono::Duration::MAX);
        now.checked_sub_signed(lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Human label for the interval, e.g. "10 minutes", "1 hour".
    pub fn interval_label(&self) -> Option<String> {
        self.bucket_interval.map(duration_label)
    }

    /// Number of buckets the lookback is split into, when sampled.
    pub fn bucket_count(&self) -> Option<u64> {
        let interval = self.bucket_interval?.as_secs();
        if interval == 0 {
            return None;
        }
        Some(self.lookback.as_secs() / interval)
    }
}

impl Serialize for RangeDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("RangeDescriptor", 4)?;
        s.serialize_field("key", &self.key)?;
        s.serialize_field("lookbackSecs", &self.lookback.as_secs())?;
        s.serialize_field(
            "intervalSecs",
            &self.bucket_interval.map(|d| d.as_secs()),
        )?;
        s.serialize_field("interval", &self.interval_label())?;
        s.end()
    }
}

/// "1 day", "4 hours", "10 minutes", "45 seconds": largest whole unit.
pub fn duration_label(d: Duration) -> String {
    let secs = d.as_secs();
    let (n, unit) = if secs > 0 && secs % SECS_PER_DAY == 0 {
        (secs / SECS_PER_DAY, "day")
    } else if secs > 0 && secs % SECS_PER_HOUR == 0 {
        (secs / SECS_PER_HOUR, "hour")
    } else if secs > 0 && secs % SECS_PER_MINUTE == 0 {
        (secs / SECS_PER_MINUTE, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePolicy {
    ranges: Vec<RangeDescriptor>,
}

impl Default for RangePolicy {
    /// 1h/6h/12h/24h/7d, each sampled into 6-7 buckets.
    fn default() -> Self {
        Self {
            ranges: vec![
                RangeDescriptor::new("1h", SECS_PER_HOUR, Some(10 * SECS_PER_MINUTE)),
                RangeDescriptor::new("6h", 6 * SECS_PER_HOUR, Some(SECS_PER_HOUR)),
                RangeDescriptor::new("12h", 12 * SECS_PER_HOUR, Some(2 * SECS_PER_HOUR)),
                RangeDescriptor::new("24h", 24 * SECS_PER_HOUR, Some(4 * SECS_PER_HOUR)),
                RangeDescriptor::new("7d", 7 * SECS_PER_DAY, Some(SECS_PER_DAY)),
            ],
        }
    }
}

impl RangePolicy {
    /// Builds a policy from an explicit table, rejecting entries that would produce
    /// an unbounded or uneven bucket count.
    pub fn new(ranges: Vec<RangeDescriptor>) -> anyhow::Result<Self> {
        anyhow::ensure!(!ranges.is_empty(), "ranges must not be empty");
        for (i, r) in ranges.iter().enumerate() {
            anyhow::ensure!(!r.key.is_empty(), "ranges[{}].key must be non-empty", i);
            anyhow::ensure!(
                ranges[..i].iter().all(|prev| prev.key != r.key),
                "ranges[{}].key '{}' is duplicated",
                i,
                r.key
            );
            anyhow::ensure!(
                r.lookback.as_secs() > 0,
                "ranges[{}].lookback_secs must be > 0, got {}",
                i,
                r.lookback.as_secs()
            );
            if let Some(interval) = r.bucket_interval {
                let interval = interval.as_secs();
                anyhow::ensure!(
                    interval > 0,
                    "ranges[{}].interval_secs must be > 0, got {}",
                    i,
                    interval
                );
                let lookback = r.lookback.as_secs();
                anyhow::ensure!(
                    lookback % interval == 0,
                    "ranges[{}].interval_secs ({}) must evenly divide lookback_secs ({})",
                    i,
                    interval,
                    lookback
                );
                let buckets = lookback / interval;
                anyhow::ensure!(
                    (MIN_BUCKETS..=MAX_BUCKETS).contains(&buckets),
                    "ranges[{}] yields {} buckets; interval_secs must give {}..={}",
                    i,
                    buckets,
                    MIN_BUCKETS,
                    MAX_BUCKETS
                );
            }
        }
        Ok(Self { ranges })
    }

    pub fn resolve(&self, key: &str) -> Result<&RangeDescriptor, QueryError> {
        self.ranges
            .iter()
            .find(|r| r.key == key)
            .ok_or_else(|| QueryError::UnknownRange {
                key: key.to_string(),
                valid: self.valid_keys(),
            })
    }

    pub fn ranges(&self) -> &[RangeDescriptor] {
        &self.ranges
    }

    pub fn valid_keys(&self) -> Vec<String> {
        self.ranges.iter().map(|r| r.key.clone()).collect()
    }
}
