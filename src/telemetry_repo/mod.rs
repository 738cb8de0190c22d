// SQLite telemetry store (read side). Sensor tables are written by the ingestion path;
// this repo only bootstraps the schema and reads.

pub mod export;
pub mod planner;

use crate::config::DatabaseConfig;
use crate::error::QueryError;
use crate::models::{
    BucketedSample, FieldStats, HistoryData, HistoryEnvelope, ReadingRow, StatsEnvelope,
    StatsSummary, millis_to_utc,
};
use crate::ranges::RangePolicy;
use crate::sensors::{self, ID_COLUMN, SensorDescriptor, TIMESTAMP_COLUMN};
use chrono::{DateTime, Utc};
use planner::PlanMode;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{instrument, warn};

pub use export::{PageSource, SqlitePageSource};

pub struct TelemetryRepo {
    pool: SqlitePool,
    ranges: RangePolicy,
}

impl TelemetryRepo {
    pub async fn connect(config: &DatabaseConfig, ranges: RangePolicy) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(&config.path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        // Callers wait for a free connection (up to acquire_timeout) instead of failing fast.
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(opts)
            .await?;
        Ok(Self { pool, ranges })
    }

    /// Creates every registry table and its timestamp index if missing.
    pub async fn init(&self) -> anyhow::Result<()> {
        for sensor in sensors::list() {
            sqlx::query(&planner::create_table_sql(sensor))
                .execute(&self.pool)
                .await?;
            sqlx::query(&planner::create_index_sql(sensor))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn ranges(&self) -> &RangePolicy {
        &self.ranges
    }

    /// Newest reading, or None when the sensor has no data yet.
    #[instrument(skip(self), fields(repo = "telemetry", operation = "latest"))]
    pub async fn latest(&self, sensor: &str) -> Result<Option<ReadingRow>, QueryError> {
        let sensor = sensors::resolve(sensor)?;
        let row = sqlx::query(&planner::latest_sql(sensor))
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| warn!(sensor = sensor.id, error = %e, "latest query failed"))?;
        row.map(|r| parse_reading_row(sensor, &r)).transpose()
    }

    pub async fn history(
        &self,
        sensor: &str,
        range_key: &str,
        raw: bool,
    ) -> Result<HistoryEnvelope, QueryError> {
        self.history_at(sensor, range_key, raw, Utc::now()).await
    }

    /// History as of `now`; raw rows or averaged epoch-aligned buckets, ascending.
    #[instrument(skip(self, now), fields(repo = "telemetry", operation = "history"))]
    pub async fn history_at(
        &self,
        sensor: &str,
        range_key: &str,
        raw: bool,
        now: DateTime<Utc>,
    ) -> Result<HistoryEnvelope, QueryError> {
        let plan = planner::plan(&self.ranges, sensor, range_key, raw, now)?;
        let start_ms = plan.lookback_start_ms();

        let data = match &plan.mode {
            PlanMode::Raw => {
                let rows = sqlx::query(&plan.sql)
                    .bind(start_ms)
                    .fetch_all(&self.pool)
                    .await
                    .inspect_err(
                        |e| warn!(sensor = plan.sensor.id, error = %e, "raw history query failed"),
                    )?;
                let mut out = Vec::with_capacity(rows.len());
                for row in &rows {
                    out.push(parse_reading_row(plan.sensor, row)?);
                }
                HistoryData::Raw(out)
            }
            PlanMode::Bucketed { interval_ms, .. } => {
                let rows = sqlx::query(&plan.sql)
                    .bind(*interval_ms)
                    .bind(start_ms)
                    .fetch_all(&self.pool)
                    .await
                    .inspect_err(
                        |e| warn!(sensor = plan.sensor.id, error = %e, "bucketed history query failed"),
                    )?;
                let mut out = Vec::with_capacity(rows.len());
                for row in &rows {
                    out.push(parse_bucket_row(plan.sensor, row)?);
                }
                HistoryData::Bucketed(out)
            }
        };

        Ok(HistoryEnvelope {
            sensor: plan.sensor.id.to_string(),
            range: plan.range_key.clone(),
            sampled: plan.sampled(),
            interval: plan.interval_label().map(str::to_string),
            count: data.len(),
            data,
        })
    }

    pub async fn stats(&self, sensor: &str, range_key: &str) -> Result<StatsEnvelope, QueryError> {
        self.stats_at(sensor, range_key, Utc::now()).await
    }

    /// One aggregate query over the window; an empty window yields total_records = 0.
    #[instrument(skip(self, now), fields(repo = "telemetry", operation = "stats"))]
    pub async fn stats_at(
        &self,
        sensor: &str,
        range_key: &str,
        now: DateTime<Utc>,
    ) -> Result<StatsEnvelope, QueryError> {
        let sensor = sensors::resolve(sensor)?;
        let range = self.ranges.resolve(range_key)?;
        let start_ms = range.lookback_start(now).timestamp_millis();

        let row = sqlx::query(&planner::stats_sql(sensor))
            .bind(start_ms)
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| warn!(sensor = sensor.id, error = %e, "stats query failed"))?;

        Ok(StatsEnvelope {
            sensor: sensor.id.to_string(),
            range: range.key.clone(),
            stats: parse_stats_row(sensor, &row)?,
        })
    }

    /// Paged newest-first reader holding one pooled connection until dropped.
    #[instrument(skip(self), fields(repo = "telemetry", operation = "export"))]
    pub async fn export_source(&self, sensor: &str) -> Result<SqlitePageSource, QueryError> {
        let sensor = sensors::resolve(sensor)?;
        let conn = self
            .pool
            .acquire()
            .await
            .inspect_err(|e| warn!(sensor = sensor.id, error = %e, "export acquire failed"))?;
        Ok(SqlitePageSource::new(conn, sensor))
    }
}

pub(crate) fn parse_reading_row(
    sensor: &'static SensorDescriptor,
    row: &SqliteRow,
) -> Result<ReadingRow, QueryError> {
    let timestamp: i64 = row.try_get(TIMESTAMP_COLUMN)?;
    let id: i64 = row.try_get(ID_COLUMN)?;
    let mut fields = Vec::with_capacity(sensor.columns.len() - 2);
    for col in sensor.numeric_columns() {
        fields.push((col, row.try_get::<Option<f64>, _>(col)?));
    }
    Ok(ReadingRow {
        timestamp: millis_to_utc(timestamp),
        id,
        fields,
    })
}

fn parse_bucket_row(
    sensor: &'static SensorDescriptor,
    row: &SqliteRow,
) -> Result<BucketedSample, QueryError> {
    let bucket_start: i64 = row.try_get("bucket_start")?;
    let sample_count: i64 = row.try_get("sample_count")?;
    let mut fields = Vec::with_capacity(sensor.columns.len() - 2);
    for col in sensor.numeric_columns() {
        fields.push((col, row.try_get::<Option<f64>, _>(col)?));
    }
    Ok(BucketedSample {
        bucket_start: millis_to_utc(bucket_start),
        fields,
        sample_count,
    })
}

fn parse_stats_row(
    sensor: &'static SensorDescriptor,
    row: &SqliteRow,
) -> Result<StatsSummary, QueryError> {
    let total_records: i64 = row.try_get("total_records")?;
    let first_record: Option<i64> = row.try_get("first_record")?;
    let last_record: Option<i64> = row.try_get("last_record")?;
    let mut fields = Vec::with_capacity(sensor.columns.len() - 2);
    for name in sensor.numeric_columns() {
        fields.push(FieldStats {
            name,
            min: row.try_get(format!("{}_min", name).as_str())?,
            max: row.try_get(format!("{}_max", name).as_str())?,
            avg: row.try_get(format!("{}_avg", name).as_str())?,
        });
    }
    Ok(StatsSummary {
        total_records,
        first_record: first_record.map(millis_to_utc),
        last_record: last_record.map(millis_to_utc),
        fields,
    })
}
