//! Log tailer: read only lines appended after open, in append order.
//!
//! Opening waits (bounded polling, never busy-spin) for the file to exist,
//! then seeks to end-of-file so historical lines are never replayed on a
//! fresh start. `next_line` is non-blocking: `Ok(None)` means "would block",
//! and the caller owns the poll-interval sleep.
//!
//! The log is assumed append-only. Rotation and truncation are unsupported;
//! the reader never seeks backward past its last read position.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::core::errors::{DtpError, Result};
use crate::core::retry::{RetryOutcome, RetryPolicy};

/// Tail handle over the shared telemetry log.
#[derive(Debug)]
pub struct LogTailer {
    reader: BufReader<File>,
    path: PathBuf,
    /// Partial trailing line observed mid-append; held until its newline
    /// arrives so the producer's write granularity never splits a sample.
    pending: String,
    lines_read: u64,
}

impl LogTailer {
    /// Wait for the log file to exist (per `wait_policy`), then open it and
    /// seek to end-of-file.
    ///
    /// Returns `Ok(None)` when `cancel` fires during the wait.
    pub fn open(
        path: &Path,
        wait_policy: &RetryPolicy,
        cancel: impl Fn() -> bool,
    ) -> Result<Option<Self>> {
        let opened = wait_policy.run_cancellable("telemetry log file", cancel, || {
            if path.exists() {
                match File::open(path) {
                    Ok(file) => RetryOutcome::Ready(file),
                    Err(source) => RetryOutcome::Rejected(DtpError::io(path, source)),
                }
            } else {
                RetryOutcome::NotYet(format!("{} does not exist", path.display()))
            }
        })?;

        let Some(file) = opened else {
            return Ok(None);
        };

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::End(0))
            .map_err(|source| DtpError::io(path, source))?;

        Ok(Some(Self {
            reader,
            path: path.to_path_buf(),
            pending: String::new(),
            lines_read: 0,
        }))
    }

    /// Return the next complete appended line, or `Ok(None)` when no
    /// newline-terminated line is available yet.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let read = self
            .reader
            .read_line(&mut self.pending)
            .map_err(|source| DtpError::io(&self.path, source))?;

        if read == 0 || !self.pending.ends_with('\n') {
            // EOF, or a line still being appended. Keep what we have.
            return Ok(None);
        }

        let mut line = std::mem::take(&mut self.pending);
        line.pop(); // trailing '\n'
        self.lines_read += 1;
        Ok(Some(line))
    }

    /// Count of complete lines returned so far. Doubles as the 1-based line
    /// number of the most recently returned line (relative to open).
    #[must_use]
    pub const fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::time::Duration;

    fn append(path: &Path, data: &str) {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(data.as_bytes()).unwrap();
        f.flush().unwrap();
    }

    fn open_now(path: &Path) -> LogTailer {
        let policy = RetryPolicy::bounded(Duration::from_millis(1), 5);
        LogTailer::open(path, &policy, || false).unwrap().unwrap()
    }

    #[test]
    fn historical_lines_are_never_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        append(&path, "old line 1\nold line 2\nold line 3\n");

        let mut tailer = open_now(&path);
        assert_eq!(tailer.next_line().unwrap(), None);

        append(&path, "new line\n");
        assert_eq!(tailer.next_line().unwrap(), Some("new line".to_string()));
        assert_eq!(tailer.next_line().unwrap(), None);
    }

    #[test]
    fn lines_returned_in_append_order_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        append(&path, "");

        let mut tailer = open_now(&path);
        append(&path, "a\nb\nc\n");

        assert_eq!(tailer.next_line().unwrap(), Some("a".to_string()));
        assert_eq!(tailer.next_line().unwrap(), Some("b".to_string()));
        assert_eq!(tailer.next_line().unwrap(), Some("c".to_string()));
        assert_eq!(tailer.next_line().unwrap(), None);
        assert_eq!(tailer.lines_read(), 3);
    }

    #[test]
    fn partial_line_is_held_until_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        append(&path, "");

        let mut tailer = open_now(&path);
        append(&path, "half a sam");
        assert_eq!(tailer.next_line().unwrap(), None);

        append(&path, "ple\n");
        assert_eq!(
            tailer.next_line().unwrap(),
            Some("half a sample".to_string())
        );
    }

    #[test]
    fn open_waits_for_file_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");

        let policy = RetryPolicy::bounded(Duration::from_millis(5), 50);
        let path_clone = path.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            append(&path_clone, "first\n");
        });

        let mut tailer = LogTailer::open(&path, &policy, || false).unwrap().unwrap();
        writer.join().unwrap();

        // The first line may land before or after our end-seek depending on
        // timing; only lines appended after open are guaranteed visible.
        append(&path, "second\n");
        let mut seen = Vec::new();
        while let Some(line) = tailer.next_line().unwrap() {
            seen.push(line);
        }
        assert_eq!(seen.last().map(String::as_str), Some("second"));
    }

    #[test]
    fn open_gives_up_per_bounded_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never_created.jsonl");
        let policy = RetryPolicy::bounded(Duration::from_millis(1), 3);
        let err = LogTailer::open(&path, &policy, || false).unwrap_err();
        assert_eq!(err.code(), "DTP-3900");
    }

    #[test]
    fn open_cancellable_while_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never_created.jsonl");
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        let result = LogTailer::open(&path, &policy, || true).unwrap();
        assert!(result.is_none());
    }
}
