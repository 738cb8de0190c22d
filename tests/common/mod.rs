// Shared test helpers: temp SQLite repo + direct inserts standing in for the ingestion path

#![allow(dead_code)]

use sensor_telemetry::config::DatabaseConfig;
use sensor_telemetry::ranges::RangePolicy;
use sensor_telemetry::telemetry_repo::TelemetryRepo;
use tempfile::TempDir;

pub async fn temp_repo() -> (TempDir, TelemetryRepo) {
    temp_repo_with(RangePolicy::default()).await
}

pub async fn temp_repo_with(ranges: RangePolicy) -> (TempDir, TelemetryRepo) {
    open_repo(ranges, 4, 5).await
}

/// Repo with an explicit pool bound, for connection hand-back and acquire-wait tests.
pub async fn temp_repo_pooled(
    max_pool_size: u32,
    acquire_timeout_secs: u64,
) -> (TempDir, TelemetryRepo) {
    open_repo(RangePolicy::default(), max_pool_size, acquire_timeout_secs).await
}

async fn open_repo(
    ranges: RangePolicy,
    max_pool_size: u32,
    acquire_timeout_secs: u64,
) -> (TempDir, TelemetryRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("telemetry.db");
    let config = DatabaseConfig {
        path: path.to_str().unwrap().to_string(),
        max_pool_size,
        acquire_timeout_secs,
    };
    let repo = TelemetryRepo::connect(&config, ranges).await.unwrap();
    repo.init().await.unwrap();
    (dir, repo)
}

pub async fn insert_dht22(repo: &TelemetryRepo, ts_ms: i64, temperature: f64, humidity: f64) {
    sqlx::query("INSERT INTO data_dht22 (timestamp, temperature, humidity) VALUES ($1, $2, $3)")
        .bind(ts_ms)
        .bind(temperature)
        .bind(humidity)
        .execute(repo.pool())
        .await
        .unwrap();
}

/// Inserts `count` bh1750 rows one second apart ending at `newest_ms`, in one transaction.
pub async fn insert_bh1750_series(repo: &TelemetryRepo, newest_ms: i64, count: i64) {
    let mut tx = repo.pool().begin().await.unwrap();
    for i in 0..count {
        sqlx::query("INSERT INTO data_bh1750 (timestamp, lux) VALUES ($1, $2)")
            .bind(newest_ms - i * 1000)
            .bind(i as f64)
            .execute(&mut *tx)
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
