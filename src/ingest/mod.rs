//! Ingestion side: classification and durable persistence of samples.

pub mod classifier;
pub mod event_log;
pub mod sink;
