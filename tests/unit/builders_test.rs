//! Tests for builder modules

use room_dispatch::builders::{build_state_store, build_zones, ZoneBuilder};
use room_dispatch::config::{SchedulerConfig, ZoneConfig};
use room_dispatch::core::{AuditAction, NewTask, SchedulerError};

#[test]
fn test_zone_builder_defaults() {
    let builder = ZoneBuilder::new("W1N1", ZoneConfig::default().with_default_need(2));
    assert_eq!(builder.name(), "W1N1");
    assert_eq!(builder.config().default_need, 2);

    let (mut zone, audit) = builder.build().unwrap();
    assert!(audit.is_none());
    let key = zone.add_task(NewTask::new("a"));
    assert_eq!(zone.get_task(key).unwrap().need, 2);
}

#[test]
fn test_zone_builder_wires_audit() {
    let (mut zone, audit) = ZoneBuilder::new("W1N1", ZoneConfig::default().with_audit_capacity(4))
        .build()
        .unwrap();
    zone.add_task(NewTask::new("a"));
    zone.get_assignment("w1", None);
    let events = audit.unwrap().lock().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::Assign);
}

#[test]
fn test_zone_builder_rejects_invalid_config() {
    let err = ZoneBuilder::new("W1N1", ZoneConfig::default().with_default_need(0))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}

#[test]
fn test_build_zones_registers_every_zone() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{ "zones": { "W1N1": {}, "W2N2": { "audit_capacity": 16 } } }"#,
    )
    .unwrap();
    let registry = build_zones(&cfg).unwrap();
    assert_eq!(registry.zone_names(), vec!["W1N1".to_string(), "W2N2".to_string()]);

    registry
        .with_zone("W2N2", |zone| {
            zone.add_task(NewTask::new("a"));
            zone.get_assignment("w1", None);
        })
        .unwrap();
    assert_eq!(registry.audit_events("W2N2").len(), 1);
    assert!(registry.audit_events("W1N1").is_empty());
}

#[test]
fn test_build_zones_rejects_empty_config() {
    let err = build_zones(&SchedulerConfig::default()).unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}

#[test]
fn test_build_state_store_in_memory() {
    let cfg = SchedulerConfig::default();
    let mut store = build_state_store(&cfg, &ZoneConfig::default()).unwrap();
    assert!(store.load("W1N1").unwrap().is_none());
}
