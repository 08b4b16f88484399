//! Tests for the zone registry and tick driver

use std::sync::Arc;
use std::thread;

use room_dispatch::config::ZoneConfig;
use room_dispatch::core::{NewTask, SchedulerError, ZoneScheduler};
use room_dispatch::infra::InMemoryStateStore;
use room_dispatch::runtime::{TickDriver, ZoneRegistry};

#[test]
fn test_unknown_zone_is_error() {
    let registry = ZoneRegistry::new();
    let err = registry.with_zone("W9N9", |_| ()).unwrap_err();
    assert!(matches!(err, SchedulerError::UnknownZone(ref z) if z == "W9N9"));
    assert!(registry.get("W9N9").is_none());
}

#[test]
fn test_zones_are_independent() {
    let mut registry = ZoneRegistry::new();
    registry.insert(ZoneScheduler::new("W1N1", ZoneConfig::default()), None);
    registry.insert(ZoneScheduler::new("W2N2", ZoneConfig::default()), None);

    registry
        .with_zone("W1N1", |zone| zone.add_task(NewTask::new("harvest")))
        .unwrap();
    let other = registry.with_zone("W2N2", |zone| zone.has_task("harvest")).unwrap();
    assert!(!other);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_zones_can_be_driven_from_threads() {
    let mut registry = ZoneRegistry::new();
    for name in ["W1N1", "W2N2", "W3N3"] {
        let mut zone = ZoneScheduler::new(name, ZoneConfig::default());
        zone.add_task(NewTask::new("work").need(4));
        registry.insert(zone, None);
    }
    let registry = Arc::new(registry);

    let handles: Vec<_> = registry
        .zone_names()
        .into_iter()
        .map(|name| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry
                    .with_zone(&name, |zone| {
                        for w in 0..4 {
                            zone.get_assignment(&format!("{name}-w{w}"), None);
                        }
                        zone.demand().is_satisfied()
                    })
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_tick_driver_starts_empty_zone() {
    let mut driver = TickDriver::new(InMemoryStateStore::new());
    let tasks = driver
        .run_tick("W1N1", ZoneConfig::default(), |zone| zone.tasks().count())
        .unwrap();
    assert_eq!(tasks, 0);
    assert_eq!(driver.into_inner().len(), 1);
}
