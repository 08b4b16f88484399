//! # Room Dispatch
//!
//! A per-zone task/worker dispatcher for tick-driven simulations.
//!
//! Each zone keeps a priority-ordered list of tasks. Every task wants some
//! number of workers (`need`) and may prefer workers carrying a
//! specialization tag (`require`). Workers ask for an assignment each tick
//! and the zone answers from a persistent ledger, running a fresh
//! assignment only when the worker has none.
//!
//! ## Key Features
//!
//! - **Priority Ordering**: higher priority first, unprioritised tasks last, insertion order breaks ties
//! - **Specialist Preemption**: a tagged worker can displace a generalist from a task that wants its tag
//! - **Rebalancing**: surplus workers flow to higher-priority tasks whenever structure changes
//! - **Removal Cleanup**: workers on removed tasks are re-placed or parked in the same call
//! - **Persistence**: snapshots carry counters and the ledger across ticks (memory or JSON files)
//!
//! ```rust
//! use room_dispatch::config::ZoneConfig;
//! use room_dispatch::core::{NewTask, TaskPatch, ZoneScheduler};
//!
//! let mut zone = ZoneScheduler::new("W1N1", ZoneConfig::default());
//! let mine = zone.add_task(NewTask::new("mine").priority(5).require("miner"));
//! zone.add_task(NewTask::new("upgrade").priority(1).need(2));
//!
//! // A generalist fills the open mining slot first.
//! assert_eq!(zone.get_assignment("g1", None).map(|t| t.key), Some(mine));
//! // A miner preempts it.
//! assert_eq!(zone.get_assignment("m1", Some("miner")).map(|t| t.key), Some(mine));
//!
//! zone.update_task(TaskPatch::for_key(mine).need(2));
//! zone.verify().unwrap();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, ledger, dispatcher and façade.
pub mod core;
/// Configuration models for zones and backends.
pub mod config;
/// Builders to construct zone schedulers from configuration.
pub mod builders;
/// Infrastructure adapters for state storage.
pub mod infra;
/// Runtime glue: zone registry and tick driver.
pub mod runtime;
/// Shared utilities.
pub mod util;
