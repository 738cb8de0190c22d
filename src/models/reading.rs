// One persisted measurement row, as read back from a sensor table.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// Reading row: timestamp, id, then the sensor's numeric fields in registry order.
/// Serializes flat, e.g. `{"timestamp": ..., "id": 7, "temperature": 24.1, "humidity": 61.0}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRow {
    pub timestamp: DateTime<Utc>,
    pub id: i64,
    pub fields: Vec<(&'static str, Option<f64>)>,
}

impl ReadingRow {
    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| *v)
    }
}

impl Serialize for ReadingRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        map.serialize_entry("id", &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Epoch milliseconds (storage format) -> UTC instant. Out-of-range values clamp to the epoch.
pub fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
