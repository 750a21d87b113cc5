//! Consumer loop: tail the telemetry log, classify each sample, persist
//! sample and events atomically, mirror events to the auxiliary log.

use std::time::Duration;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::core::pacing::Poller;
use crate::core::retry::RetryPolicy;
use crate::ingest::classifier::{EventKind, classify};
use crate::ingest::event_log::{EventLine, EventLogWriter};
use crate::ingest::sink::TelemetrySink;
use crate::pipeline::signals::SignalHandler;
use crate::stream::sample::{TelemetrySample, format_ts};
use crate::stream::tailer::LogTailer;

/// Backoff while waiting for the producer to create the telemetry log.
const LOG_WAIT_INTERVAL: Duration = Duration::from_secs(1);

/// Run the consumer until a shutdown signal arrives.
///
/// Startup blocks (cancellably) until both the telemetry log and the durable
/// store are available. A malformed log line or a store write failure is
/// fatal; silently dropping samples would make the store lie about what the
/// vehicle did.
pub fn run(cfg: &Config, signals: &SignalHandler) -> Result<()> {
    eprintln!(
        "[DTP-INGEST] waiting for telemetry log {}",
        cfg.paths.telemetry_log.display()
    );
    let wait_policy = RetryPolicy::unbounded(LOG_WAIT_INTERVAL);
    let Some(mut tailer) =
        LogTailer::open(&cfg.paths.telemetry_log, &wait_policy, || {
            signals.should_shutdown()
        })?
    else {
        return Ok(());
    };

    let connect_policy =
        RetryPolicy::unbounded(Duration::from_millis(cfg.store.connect_retry_ms));
    let Some(mut sink) =
        TelemetrySink::connect(&cfg.store.db_path, &connect_policy, || {
            signals.should_shutdown()
        })?
    else {
        return Ok(());
    };
    eprintln!("[DTP-INGEST] store connected at {}", sink.path().display());

    sink.ensure_schema()?;
    sink.apply_range_scan_indexes();
    eprintln!("[DTP-INGEST] schema ready");

    let mut event_log = if cfg.ingest.events_log_enabled {
        Some(EventLogWriter::open(&cfg.paths.events_log)?)
    } else {
        None
    };

    let poller = Poller::new(Duration::from_millis(cfg.ingest.poll_interval_ms));
    eprintln!(
        "[DTP-INGEST] started: tailing {} into {} (poll {}ms)",
        cfg.paths.telemetry_log.display(),
        sink.path().display(),
        cfg.ingest.poll_interval_ms
    );

    let mut events_detected: u64 = 0;
    while !signals.should_shutdown() {
        match tailer.next_line()? {
            Some(line) => {
                let sample = TelemetrySample::decode_line(&line, tailer.lines_read())?;
                let kinds = classify(&sample);
                sink.persist(&sample, &kinds)?;

                if kinds.is_empty() {
                    continue;
                }
                events_detected += kinds.len() as u64;
                println!("{}", detection_line(&sample, &kinds));
                if let Some(writer) = event_log.as_mut() {
                    writer.write_line(&EventLine::new(sample.ts, &sample.vehicle_id, kinds));
                }
            }
            None => poller.pause(),
        }
    }

    eprintln!(
        "[DTP-INGEST] stopped: {} samples ingested, {} events detected",
        tailer.lines_read(),
        events_detected
    );
    Ok(())
}

/// One detection line per triggering sample, carrying every kind it fired,
/// mirroring the events-log granularity.
fn detection_line(sample: &TelemetrySample, kinds: &[EventKind]) -> String {
    let labels: Vec<&str> = kinds.iter().map(|kind| kind.as_str()).collect();
    format!(
        "[EVENT DETECTED] {} {} {}",
        format_ts(sample.ts),
        sample.vehicle_id,
        labels.join(",")
    )
}
