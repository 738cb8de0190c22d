// Query planning: resolves sensor + range into SQL text and bind values.
// Pure (no pool); this is the only place SQL text is composed. Identifiers come from the
// sensor registry and are quoted; every value is a bound parameter.

use chrono::{DateTime, Utc};

use crate::error::QueryError;
use crate::ranges::RangePolicy;
use crate::sensors::{self, ID_COLUMN, SensorDescriptor, TIMESTAMP_COLUMN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanMode {
    /// Every row in the window, ascending by timestamp. Binds: $1 = window start (ms).
    Raw,
    /// Epoch-aligned buckets. Binds: $1 = interval (ms), $2 = window start (ms).
    Bucketed { interval_ms: i64, label: String },
}

#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub sensor: &'static SensorDescriptor,
    pub range_key: String,
    pub lookback_start: DateTime<Utc>,
    pub mode: PlanMode,
    pub sql: String,
}

impl QueryPlan {
    pub fn sampled(&self) -> bool {
        matches!(self.mode, PlanMode::Bucketed { .. })
    }

    pub fn interval_label(&self) -> Option<&str> {
        match &self.mode {
            PlanMode::Raw => None,
            PlanMode::Bucketed { label, .. } => Some(label),
        }
    }

    pub fn lookback_start_ms(&self) -> i64 {
        self.lookback_start.timestamp_millis()
    }
}

/// Plans a history query. Sensor and range are validated before any SQL is built.
pub fn plan(
    policy: &RangePolicy,
    sensor: &str,
    range_key: &str,
    raw: bool,
    now: DateTime<Utc>,
) -> Result<QueryPlan, QueryError> {
    let sensor = sensors::resolve(sensor)?;
    let range = policy.resolve(range_key)?;
    let lookback_start = range.lookback_start(now);

    let (mode, sql) = match range.bucket_interval {
        Some(interval) if !raw => {
            let interval_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
            let label = range.interval_label().unwrap_or_default();
            (PlanMode::Bucketed { interval_ms, label }, bucketed_sql(sensor))
        }
        _ => (PlanMode::Raw, raw_window_sql(sensor)),
    };

    Ok(QueryPlan {
        sensor,
        range_key: range.key.clone(),
        lookback_start,
        mode,
        sql,
    })
}

/// Quotes a registry identifier. Registry names are plain snake_case, never caller input.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

fn select_list(sensor: &SensorDescriptor) -> String {
    sensor
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn raw_window_sql(sensor: &SensorDescriptor) -> String {
    let ts = quote_ident(TIMESTAMP_COLUMN);
    format!(
        "SELECT {} FROM {} WHERE {ts} >= $1 ORDER BY {ts} ASC, {} ASC",
        select_list(sensor),
        quote_ident(sensor.table),
        quote_ident(ID_COLUMN),
    )
}

/// Binds: $1 = interval (ms), $2 = window start (ms).
/// Buckets are floored to the epoch grid; SQLite `/` truncates toward zero, so the floor uses `%`.
pub fn bucketed_sql(sensor: &SensorDescriptor) -> String {
    let ts = quote_ident(TIMESTAMP_COLUMN);
    let avg_cols = sensor
        .numeric_columns()
        .map(|c| format!("AVG({0}) AS {0}", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {ts} - (({ts} % $1) + $1) % $1 AS bucket_start, {avg_cols}, COUNT(*) AS sample_count \
         FROM {} WHERE {ts} >= $2 GROUP BY bucket_start ORDER BY bucket_start ASC",
        quote_ident(sensor.table),
    )
}

/// Single-row aggregate over the window. Binds: $1 = window start (ms).
/// Per-field aliases are `<field>_min`, `<field>_max`, `<field>_avg`.
pub fn stats_sql(sensor: &SensorDescriptor) -> String {
    let ts = quote_ident(TIMESTAMP_COLUMN);
    let mut parts = vec![
        "COUNT(*) AS total_records".to_string(),
        format!("MIN({ts}) AS first_record"),
        format!("MAX({ts}) AS last_record"),
    ];
    for c in sensor.numeric_columns() {
        let col = quote_ident(c);
        parts.push(format!("MIN({col}) AS {}", quote_ident(&format!("{}_min", c))));
        parts.push(format!("MAX({col}) AS {}", quote_ident(&format!("{}_max", c))));
        parts.push(format!("AVG({col}) AS {}", quote_ident(&format!("{}_avg", c))));
    }
    format!(
        "SELECT {} FROM {} WHERE {ts} >= $1",
        parts.join(", "),
        quote_ident(sensor.table),
    )
}

pub fn latest_sql(sensor: &SensorDescriptor) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {} DESC, {} DESC LIMIT 1",
        select_list(sensor),
        quote_ident(sensor.table),
        quote_ident(TIMESTAMP_COLUMN),
        quote_ident(ID_COLUMN),
    )
}

/// First export page, newest first. Binds: $1 = limit.
pub fn export_first_page_sql(sensor: &SensorDescriptor) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {} DESC, {} DESC LIMIT $1",
        select_list(sensor),
        quote_ident(sensor.table),
        quote_ident(TIMESTAMP_COLUMN),
        quote_ident(ID_COLUMN),
    )
}

/// Next export page strictly after the (timestamp, id) keyset cursor.
/// Binds: $1 = cursor timestamp (ms), $2 = cursor id, $3 = limit.
pub fn export_next_page_sql(sensor: &SensorDescriptor) -> String {
    let ts = quote_ident(TIMESTAMP_COLUMN);
    let id = quote_ident(ID_COLUMN);
    format!(
        "SELECT {} FROM {} WHERE {ts} < $1 OR ({ts} = $1 AND {id} < $2) \
         ORDER BY {ts} DESC, {id} DESC LIMIT $3",
        select_list(sensor),
        quote_ident(sensor.table),
    )
}

/// Schema bootstrap for a sensor table (idempotent).
pub fn create_table_sql(sensor: &SensorDescriptor) -> String {
    let fields = sensor
        .numeric_columns()
        .map(|c| format!("{} REAL", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} INTEGER PRIMARY KEY AUTOINCREMENT, {} INTEGER NOT NULL, {})",
        quote_ident(sensor.table),
        quote_ident(ID_COLUMN),
        quote_ident(TIMESTAMP_COLUMN),
        fields,
    )
}

pub fn create_index_sql(sensor: &SensorDescriptor) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {}({})",
        quote_ident(&format!("idx_{}_timestamp", sensor.table)),
        quote_ident(sensor.table),
        quote_ident(TIMESTAMP_COLUMN),
    )
}
