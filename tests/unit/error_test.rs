//! Tests for error types

use room_dispatch::core::SchedulerError;

#[test]
fn test_invariant_violation_error() {
    let err = SchedulerError::InvariantViolation("task #1 has requireUnit 2 > unit 1".to_string());
    assert_eq!(format!("{err}"), "invariant violated: task #1 has requireUnit 2 > unit 1");
}

#[test]
fn test_unknown_zone_error() {
    let err = SchedulerError::UnknownZone("W9N9".to_string());
    assert_eq!(format!("{err}"), "unknown zone: W9N9");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("default_need must be greater than 0".to_string());
    assert_eq!(format!("{err}"), "invalid configuration: default_need must be greater than 0");
}

#[test]
fn test_backend_error() {
    let err = SchedulerError::Backend("disk full".to_string());
    assert_eq!(format!("{err}"), "backend error: disk full");
}

#[test]
fn test_error_converts_into_anyhow() {
    let result: room_dispatch::core::AppResult<()> = Err(SchedulerError::Backend("x".into()).into());
    assert!(result.unwrap_err().downcast_ref::<SchedulerError>().is_some());
}
