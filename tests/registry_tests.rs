// Sensor registry and range policy tests (pure, no data source)

use chrono::{TimeZone, Utc};
use sensor_telemetry::error::QueryError;
use sensor_telemetry::ranges::{
    MAX_BUCKETS, MIN_BUCKETS, RangeDescriptor, RangePolicy, duration_label,
};
use sensor_telemetry::sensors;
use std::time::Duration;

#[test]
fn resolve_known_sensor_returns_whitelisted_table() {
    let s = sensors::resolve("pzem004t").unwrap();
    assert_eq!(s.table, "data_pzem004t");
    assert_eq!(
        s.numeric_columns().collect::<Vec<_>>(),
        vec!["voltage", "current", "power", "energy", "power_factor"]
    );
}

#[test]
fn resolve_unknown_sensor_lists_valid_ids() {
    let err = sensors::resolve("foo").unwrap_err();
    match &err {
        QueryError::UnknownSensor { name, valid } => {
            assert_eq!(name, "foo");
            assert_eq!(valid, &vec!["dht22", "mq2", "pzem004t", "bh1750"]);
        }
        other => panic!("expected UnknownSensor, got {:?}", other),
    }
    assert!(err.is_validation());
    assert!(err.to_string().contains("dht22, mq2, pzem004t, bh1750"));
}

#[test]
fn resolve_rejects_near_miss_and_injection_names() {
    for name in ["DHT22", "dht22 ", "data_dht22", "dht22; DROP TABLE data_dht22", ""] {
        assert!(
            matches!(
                sensors::resolve(name),
                Err(QueryError::UnknownSensor { .. })
            ),
            "{:?} should be rejected",
            name
        );
    }
}

#[test]
fn sensor_listing_serializes_fields_and_thresholds() {
    let json = serde_json::to_value(sensors::list()).unwrap();
    let dht = &json[0];
    assert_eq!(dht["id"], "dht22");
    assert_eq!(dht["fields"], serde_json::json!(["temperature", "humidity"]));
    assert_eq!(dht["defaultThresholds"]["tempMax"], 35.0);
    assert_eq!(json[2]["defaultThresholds"]["pfMin"], 0.85);
    assert!(dht.get("table").is_none());
}

#[test]
fn default_ranges_have_positive_lookback_and_bounded_buckets() {
    let policy = RangePolicy::default();
    for r in policy.ranges() {
        assert!(r.lookback > Duration::ZERO, "{}", r.key);
        if let Some(interval) = r.bucket_interval {
            assert_eq!(r.lookback.as_secs() % interval.as_secs(), 0, "{}", r.key);
            let n = r.bucket_count().unwrap();
            assert!((MIN_BUCKETS..=MAX_BUCKETS).contains(&n), "{} -> {}", r.key, n);
        }
    }
}

#[test]
fn default_range_labels() {
    let policy = RangePolicy::default();
    let labels: Vec<_> = policy
        .ranges()
        .iter()
        .map(|r| (r.key.as_str(), r.interval_label().unwrap()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("1h", "10 minutes".to_string()),
            ("6h", "1 hour".to_string()),
            ("12h", "2 hours".to_string()),
            ("24h", "4 hours".to_string()),
            ("7d", "1 day".to_string()),
        ]
    );
}

#[test]
fn unknown_range_lists_valid_keys() {
    let policy = RangePolicy::default();
    match policy.resolve("2h") {
        Err(QueryError::UnknownRange { key, valid }) => {
            assert_eq!(key, "2h");
            assert_eq!(valid, vec!["1h", "6h", "12h", "24h", "7d"]);
        }
        other => panic!("expected UnknownRange, got {:?}", other),
    }
}

#[test]
fn lookback_start_is_now_minus_lookback() {
    let policy = RangePolicy::default();
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
    let start = policy.resolve("7d").unwrap().lookback_start(now);
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap());
}

#[test]
fn duration_label_picks_largest_whole_unit() {
    assert_eq!(duration_label(Duration::from_secs(45)), "45 seconds");
    assert_eq!(duration_label(Duration::from_secs(60)), "1 minute");
    assert_eq!(duration_label(Duration::from_secs(90)), "90 seconds");
    assert_eq!(duration_label(Duration::from_secs(7200)), "2 hours");
    assert_eq!(duration_label(Duration::from_secs(172_800)), "2 days");
}

#[test]
fn policy_new_rejects_empty_and_zero_lookback() {
    assert!(RangePolicy::new(vec![]).is_err());
    let err = RangePolicy::new(vec![RangeDescriptor::new("0h", 0, None)]).unwrap_err();
    assert!(err.to_string().contains("lookback_secs"));
}

#[test]
fn policy_new_accepts_unsampled_range() {
    let policy = RangePolicy::new(vec![RangeDescriptor::new("15m", 900, None)]).unwrap();
    let r = policy.resolve("15m").unwrap();
    assert!(r.bucket_interval.is_none());
    assert!(r.interval_label().is_none());
    assert!(r.bucket_count().is_none());
}
