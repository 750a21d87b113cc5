#![forbid(unsafe_code)]

//! Drive Telemetry Pipeline (dtp) — synthetic vehicle telemetry from generator
//! to durable store.
//!
//! Two cooperating processes share an append-only JSONL log:
//! 1. **Simulator** — seeded vehicle dynamics ticked at a fixed rate, one
//!    sample line per tick
//! 2. **Ingester** — tails the log, classifies safety events against fixed
//!    thresholds, persists samples and events transactionally to SQLite
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use drive_telemetry::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use drive_telemetry::core::config::Config;
//! use drive_telemetry::sim::dynamics::DynamicsEngine;
//! ```

pub mod prelude;

pub mod core;
pub mod ingest;
pub mod pipeline;
pub mod sim;
pub mod stream;
