// Sensor registry: closed whitelist of sensor -> table/columns.
// Every identifier that ends up in SQL text comes from SENSORS, never from request input.

use serde::Serialize;
use serde::ser::{SerializeMap, SerializeStruct, Serializer};

use crate::error::QueryError;

/// Columns present on every reading table; excluded from aggregation.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const ID_COLUMN: &str = "id";

/// One whitelisted sensor. `columns` is the full ordered column list (timestamp, id, fields...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorDescriptor {
    pub id: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
    /// Default alert thresholds, seeded into settings by the settings collaborator.
    pub default_thresholds: &'static [(&'static str, f64)],
}

impl SensorDescriptor {
    /// Numeric measurement columns (everything except timestamp and id), in declaration order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .copied()
            .filter(|c| *c != TIMESTAMP_COLUMN && *c != ID_COLUMN)
    }
}

impl Serialize for SensorDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Thresholds(&'static [(&'static str, f64)]);

        impl Serialize for Thresholds {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (k, v) in self.0 {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }

        let fields: Vec<&str> = self.numeric_columns().collect();
        let mut s = serializer.serialize_struct("SensorDescriptor", 4)?;
        s.serialize_field("id", self.id)?;
        s.serialize_field("columns", self.columns)?;
        s.serialize_field("fields", &fields)?;
        s.serialize_field("defaultThresholds", &Thresholds(self.default_thresholds))?;
        s.end()
    }
}

pub const SENSORS: &[SensorDescriptor] = &[
    SensorDescriptor {
        id: "dht22",
        table: "data_dht22",
        columns: &["timestamp", "id", "temperature", "humidity"],
        default_thresholds: &[
            ("tempMax", 35.0),
            ("tempMin", 15.0),
            ("humMax", 80.0),
            ("humMin", 30.0),
        ],
    },
    SensorDescriptor {
        id: "mq2",
        table: "data_mq2",
        columns: &["timestamp", "id", "gas_lpg", "gas_co", "smoke"],
        default_thresholds: &[
            ("smokeMax", 500.0),
            ("smokeWarn", 350.0),
            ("lpgMax", 1000.0),
            ("lpgWarn", 500.0),
            ("coMax", 500.0),
            ("coWarn", 200.0),
        ],
    },
    SensorDescriptor {
        id: "pzem004t",
        table: "data_pzem004t",
        columns: &[
            "timestamp",
            "id",
            "voltage",
            "current",
            "power",
            "energy",
            "power_factor",
        ],
        default_thresholds: &[
            ("powerMax", 2000.0),
            ("voltageMin", 180.0),
            ("voltageMax", 240.0),
            ("currentMax", 10.0),
            ("energyMax", 100.0),
            ("pfMin", 0.85),
        ],
    },
    SensorDescriptor {
        id: "bh1750",
        table: "data_bh1750",
        columns: &["timestamp", "id", "lux"],
        default_thresholds: &[("luxMax", 100_000.0), ("luxMin", 0.0)],
    },
];

/// Resolves a caller-supplied sensor name against the whitelist.
pub fn resolve(name: &str) -> Result<&'static SensorDescriptor, QueryError> {
    SENSORS
        .iter()
        .find(|s| s.id == name)
        .ok_or_else(|| QueryError::UnknownSensor {
            name: name.to_string(),
            valid: valid_ids(),
        })
}

/// All sensors in declaration order.
pub fn list() -> &'static [SensorDescriptor] {
    SENSORS
}

pub fn valid_ids() -> Vec<String> {
    SENSORS.iter().map(|s| s.id.to_string()).collect()
}
