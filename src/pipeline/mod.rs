//! Long-running pipeline loops and their shared signal handling.

pub mod ingest;
pub mod signals;
pub mod simulate;
