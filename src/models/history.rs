// History response: raw rows or epoch-aligned averaged buckets.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use super::ReadingRow;

/// One downsampled point: mean of each numeric field over [bucket_start, bucket_start + interval).
#[derive(Debug, Clone, PartialEq)]
pub struct BucketedSample {
    pub bucket_start: DateTime<Utc>,
    pub fields: Vec<(&'static str, Option<f64>)>,
    pub sample_count: i64,
}

impl BucketedSample {
    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| *v)
    }
}

impl Serialize for BucketedSample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry("bucket_start", &self.bucket_start)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("sample_count", &self.sample_count)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HistoryData {
    Raw(Vec<ReadingRow>),
    Bucketed(Vec<BucketedSample>),
}

impl HistoryData {
    pub fn len(&self) -> usize {
        match self {
            HistoryData::Raw(rows) => rows.len(),
            HistoryData::Bucketed(buckets) => buckets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Envelope for GET /history/{sensor}.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEnvelope {
    pub sensor: String,
    pub range: String,
    pub sampled: bool,
    pub interval: Option<String>,
    pub count: usize,
    pub data: HistoryData,
}
