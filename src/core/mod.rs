//! Cross-cutting foundations: configuration, errors, retry and pacing.

pub mod config;
pub mod errors;
pub mod pacing;
pub mod retry;
