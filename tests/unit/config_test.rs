//! Tests for configuration validation

use room_dispatch::config::{SchedulerConfig, StateBackendConfig, ZoneConfig};

#[test]
fn test_zone_config_validation() {
    assert!(ZoneConfig::default().validate().is_ok());
    assert!(ZoneConfig::default().with_default_need(0).validate().is_err());
}

#[test]
fn test_zone_config_builders() {
    let cfg = ZoneConfig::default()
        .with_default_need(3)
        .with_audit_capacity(64)
        .with_verify_invariants(false);
    assert_eq!(cfg.default_need, 3);
    assert_eq!(cfg.audit_capacity, 64);
    assert!(!cfg.verify_invariants);
}

#[test]
fn test_scheduler_config_requires_zones() {
    let err = SchedulerConfig::from_json_str(r#"{ "zones": {} }"#).unwrap_err();
    assert!(err.contains("at least one zone"));
}

#[test]
fn test_file_state_requires_state_dir() {
    let err = SchedulerConfig::from_json_str(r#"{ "zones": { "W1N1": { "state": "file" } } }"#)
        .unwrap_err();
    assert!(err.contains("no state_dir"));

    let cfg = SchedulerConfig::from_json_str(
        r#"{ "zones": { "W1N1": { "state": "file" } }, "state_dir": "/tmp/rooms" }"#,
    )
    .unwrap();
    assert_eq!(cfg.zone("W1N1").state, StateBackendConfig::File);
}

#[test]
fn test_invalid_zone_is_named() {
    let err = SchedulerConfig::from_json_str(r#"{ "zones": { "W2N2": { "default_need": 0 } } }"#)
        .unwrap_err();
    assert!(err.contains("W2N2"));
}

#[test]
fn test_parse_error_is_reported() {
    let err = SchedulerConfig::from_json_str("{").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_from_file_round_trip() {
    let path = std::env::temp_dir().join(format!("room-dispatch-cfg-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, r#"{ "zones": { "W1N1": { "default_need": 2, "audit_capacity": 8 } } }"#)
        .unwrap();
    let cfg = SchedulerConfig::from_file(&path).unwrap();
    assert_eq!(cfg.zone("W1N1").default_need, 2);
    assert_eq!(cfg.zone("W1N1").audit_capacity, 8);
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_from_file_missing_is_error() {
    let err = SchedulerConfig::from_file("/nonexistent/room-dispatch.json").unwrap_err();
    assert!(err.to_string().contains("reading config"));
}
