//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use drive_telemetry::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{DtpError, Result};
pub use crate::core::pacing::{Poller, Ticker};
pub use crate::core::retry::{RetryOutcome, RetryPolicy};

// Simulation
pub use crate::sim::dynamics::{DynamicsEngine, VehicleState};

// Stream
pub use crate::stream::appender::SampleAppender;
pub use crate::stream::sample::TelemetrySample;
pub use crate::stream::tailer::LogTailer;

// Ingest
pub use crate::ingest::classifier::{EventKind, EventRecord, classify};
pub use crate::ingest::event_log::{EventLine, EventLogWriter};
pub use crate::ingest::sink::TelemetrySink;

// Pipeline
pub use crate::pipeline::signals::SignalHandler;
