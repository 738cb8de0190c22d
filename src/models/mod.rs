// Request-scoped value objects: readings, buckets, stats and response envelopes.

mod history;
mod reading;
mod stats;

pub use history::{BucketedSample, HistoryData, HistoryEnvelope};
pub use reading::{ReadingRow, millis_to_utc};
pub use stats::{FieldStats, StatsEnvelope, StatsSummary};
