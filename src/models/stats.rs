// Window statistics: one aggregate row per request.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub name: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// Extrema are None when the window is empty (total_records = 0).
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub total_records: i64,
    pub first_record: Option<DateTime<Utc>>,
    pub last_record: Option<DateTime<Utc>>,
    pub fields: Vec<FieldStats>,
}

impl StatsSummary {
    pub fn field(&self, name: &str) -> Option<&FieldStats> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// Flattened as <field>_min / <field>_max / <field>_avg.
impl Serialize for StatsSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.fields.len() * 3))?;
        map.serialize_entry("total_records", &self.total_records)?;
        map.serialize_entry("first_record", &self.first_record)?;
        map.serialize_entry("last_record", &self.last_record)?;
        for f in &self.fields {
            map.serialize_entry(&format!("{}_min", f.name), &f.min)?;
            map.serialize_entry(&format!("{}_max", f.name), &f.max)?;
            map.serialize_entry(&format!("{}_avg", f.name), &f.avg)?;
        }
        map.end()
    }
}

/// Envelope for GET /stats/{sensor}.
#[derive(Debug, Clone, Serialize)]
pub struct StatsEnvelope {
    pub sensor: String,
    pub range: String,
    pub stats: StatsSummary,
}
