//! Telemetry sample model and the shared-log line codec.
//!
//! One sample per line, UTF-8 JSON, newline-terminated. Numeric fields carry
//! the persisted precision (speed/steer 2 decimals, throttle/brake 1,
//! g-forces 3, rpm integer) so encode/decode round-trips are lossless.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{DtpError, Result};

/// One instant of one vehicle's state. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// UTC timestamp, millisecond precision on the wire.
    #[serde(with = "ts_millis")]
    pub ts: DateTime<Utc>,
    /// Opaque vehicle identifier.
    pub vehicle_id: String,
    /// Speed in km/h, >= 0.
    pub speed_kmh: f64,
    /// Engine speed in rpm, clamped to the idle/redline range.
    pub rpm: i64,
    /// Throttle position, 0-100.
    pub throttle_pct: f64,
    /// Brake position, 0-100.
    pub brake_pct: f64,
    /// Steering angle in degrees, signed, bounded +-25.
    pub steer_deg: f64,
    /// Lateral g-force, sign follows steering direction.
    pub g_lat: f64,
    /// Longitudinal g-force.
    pub g_lon: f64,
}

impl TelemetrySample {
    /// Encode as a single JSON line (no trailing newline; the appender owns
    /// line termination).
    pub fn encode_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode one log line. Any structural defect is a protocol violation:
    /// fatal for the ingestion run, never skipped.
    pub fn decode_line(line: &str, line_no: u64) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| DtpError::Protocol {
            line_no,
            details: e.to_string(),
        })
    }
}

/// Round to a fixed number of decimal places (half away from zero).
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals.try_into().unwrap_or(i32::MAX));
    (value * factor).round() / factor
}

mod ts_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Format a timestamp the way the wire and the store expect it.
#[must_use]
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
