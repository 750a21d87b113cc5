//! Append-only writer for the shared telemetry log.
//!
//! Exactly one producer process appends; existing bytes are never rewritten.
//! Each sample goes out as one newline-terminated line in a single
//! `write_all` call so a concurrently tailing consumer never observes an
//! interleaved partial line, and is flushed immediately so detection latency
//! is bounded by the consumer's poll interval, not by buffering.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::errors::{DtpError, Result};
use crate::stream::sample::TelemetrySample;

/// Single-producer appender for line-delimited telemetry.
pub struct SampleAppender {
    file: File,
    path: PathBuf,
    lines_written: u64,
}

impl SampleAppender {
    /// Open (or create) the log for appending, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| DtpError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| DtpError::io(path, source))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            lines_written: 0,
        })
    }

    /// Append one sample as a single atomic line and flush it.
    pub fn append(&mut self, sample: &TelemetrySample) -> Result<()> {
        let mut line = sample.encode_line()?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .map_err(|source| DtpError::io(&self.path, source))?;
        self.file
            .flush()
            .map_err(|source| DtpError::io(&self.path, source))?;
        self.lines_written += 1;
        Ok(())
    }

    /// Force file contents to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file
            .sync_data()
            .map_err(|source| DtpError::io(&self.path, source))
    }

    /// Lines appended through this handle.
    #[must_use]
    pub const fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
