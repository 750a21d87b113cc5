//! The shared append-only log: sample codec, producer appender, consumer tailer.

pub mod appender;
pub mod sample;
pub mod tailer;
