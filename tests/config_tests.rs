// Config loading and validation tests

use sensor_telemetry::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 8000
host = "0.0.0.0"

[database]
path = "data/telemetry.db"
max_pool_size = 10
"#;

#[test]
fn test_config_loads_from_str_with_defaults() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert!(config.server.cors_origins.is_empty());
    assert_eq!(config.database.path, "data/telemetry.db");
    assert_eq!(config.database.max_pool_size, 10);
    assert_eq!(config.database.acquire_timeout_secs, 30);
    assert_eq!(config.export.page_size, 1000);
    assert!(config.ranges.is_none());
    let policy = config.range_policy().unwrap();
    assert_eq!(policy.valid_keys(), vec!["1h", "6h", "12h", "24h", "7d"]);
}

#[test]
fn test_config_export_and_pool_overrides() {
    let s = format!(
        "{}acquire_timeout_secs = 3\n\n[export]\npage_size = 250\n",
        VALID_CONFIG
    );
    let config = AppConfig::load_from_str(&s).unwrap();
    assert_eq!(config.database.acquire_timeout_secs, 3);
    assert_eq!(config.export.page_size, 250);
}

#[test]
fn test_config_custom_ranges_replace_defaults() {
    let s = format!(
        r#"{}
[[ranges]]
key = "30m"
lookback_secs = 1800

[[ranges]]
key = "3h"
lookback_secs = 10800
interval_secs = 1800
"#,
        VALID_CONFIG
    );
    let config = AppConfig::load_from_str(&s).unwrap();
    let policy = config.range_policy().unwrap();
    assert_eq!(policy.valid_keys(), vec!["30m", "3h"]);
    assert!(policy.resolve("30m").unwrap().bucket_interval.is_none());
    assert_eq!(
        policy.resolve("3h").unwrap().interval_label().as_deref(),
        Some("30 minutes")
    );
    assert!(policy.resolve("1h").is_err());
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8000", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = VALID_CONFIG.replace("path = \"data/telemetry.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = VALID_CONFIG.replace("max_pool_size = 10", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn test_config_validation_rejects_page_size_zero() {
    let bad = format!("{}\n[export]\npage_size = 0\n", VALID_CONFIG);
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("export.page_size"));
}

#[test]
fn test_config_validation_rejects_bad_cors_origin() {
    let bad = VALID_CONFIG.replace(
        "host = \"0.0.0.0\"",
        "host = \"0.0.0.0\"\ncors_origins = [\"http://ok.example\", \"bad\\norigin\"]",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("cors_origins"));
}

#[test]
fn test_config_validation_rejects_uneven_range_interval() {
    let bad = format!(
        "{}\n[[ranges]]\nkey = \"1h\"\nlookback_secs = 3600\ninterval_secs = 700\n",
        VALID_CONFIG
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("evenly divide"));
}

#[test]
fn test_config_validation_rejects_too_many_buckets() {
    let bad = format!(
        "{}\n[[ranges]]\nkey = \"1h\"\nlookback_secs = 3600\ninterval_secs = 60\n",
        VALID_CONFIG
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("60 buckets"));
}

#[test]
fn test_config_validation_rejects_duplicate_range_key() {
    let bad = format!(
        "{}\n[[ranges]]\nkey = \"1h\"\nlookback_secs = 3600\n\n[[ranges]]\nkey = \"1h\"\nlookback_secs = 7200\n",
        VALID_CONFIG
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("duplicated"));
}
