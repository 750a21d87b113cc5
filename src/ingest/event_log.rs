//! Auxiliary events log: one JSONL line per sample that produced >= 1 event.
//!
//! Best-effort secondary output. Lines are assembled in memory and written
//! atomically via `write_all`; on write failure the writer degrades to a
//! prefixed stderr line rather than taking the ingestion run down with it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{DtpError, Result};
use crate::ingest::classifier::EventKind;
use crate::stream::sample::format_ts;

/// One events-log line: all kinds fired by a single sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLine {
    /// Timestamp of the triggering sample (RFC 3339, millis).
    pub ts: String,
    /// Vehicle that produced the sample.
    pub vehicle_id: String,
    /// Every kind fired, in classifier rule order.
    pub events: Vec<EventKind>,
}

impl EventLine {
    /// Build a line from a sample's identity and its classified kinds.
    #[must_use]
    pub fn new(ts: DateTime<Utc>, vehicle_id: &str, events: Vec<EventKind>) -> Self {
        Self {
            ts: format_ts(ts),
            vehicle_id: vehicle_id.to_string(),
            events,
        }
    }
}

/// Append-only writer for the events log, degrading to stderr on failure.
pub struct EventLogWriter {
    file: Option<File>,
    path: PathBuf,
}

impl EventLogWriter {
    /// Open (or create) the events log, creating parent directories.
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
            file: Some(file),
            path: path.to_path_buf(),
        })
    }

    /// Write one event line. Never fails; a broken file handle degrades the
    /// writer to stderr for the rest of the run.
    pub fn write_line(&mut self, entry: &EventLine) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[DTP-EVENTS] serialize error: {e}");
                return;
            }
        };

        if let Some(file) = self.file.as_mut() {
            if file.write_all(line.as_bytes()).is_ok() && file.flush().is_ok() {
                return;
            }
            let _ = writeln!(
                io::stderr(),
                "[DTP-EVENTS] write to {} failed, degrading to stderr",
                self.path.display()
            );
            self.file = None;
        }
        let _ = write!(io::stderr(), "[DTP-EVENTS] {line}");
    }

    /// Whether the writer is still backed by its file.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.file.is_some()
    }
}
