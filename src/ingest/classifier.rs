//! Safety-event classifier: fixed threshold predicates over one sample.
//!
//! Pure function, no side effects, no hysteresis: a sample that stays above
//! a threshold across consecutive ticks re-triggers its event every tick.
//! Rules are independent and non-exclusive; emission order is fixed
//! (brake, accel, overspeed) so output is deterministic per sample.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stream::sample::TelemetrySample;

/// Brake percentage above which braking counts as harsh.
pub const HARSH_BRAKE_PCT: f64 = 60.0;
/// Longitudinal g above which acceleration counts as hard.
pub const HARD_ACCEL_G: f64 = 0.4;
/// Speed in km/h above which the vehicle is overspeeding.
pub const OVERSPEED_KMH: f64 = 120.0;

/// Discrete driving-event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    HarshBrake,
    HardAccel,
    Overspeed,
}

impl EventKind {
    /// Stable wire/store label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HarshBrake => "HARSH_BRAKE",
            Self::HardAccel => "HARD_ACCEL",
            Self::Overspeed => "OVERSPEED",
        }
    }
}

/// A classified occurrence, persisted one row per (sample, kind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Timestamp of the triggering sample.
    pub ts: DateTime<Utc>,
    /// Vehicle that produced the sample.
    pub vehicle_id: String,
    /// What happened.
    pub kind: EventKind,
}

/// Classify one sample. Returns zero or more kinds in fixed rule order.
#[must_use]
pub fn classify(sample: &TelemetrySample) -> Vec<EventKind> {
    let mut events = Vec::new();
    if sample.brake_pct > HARSH_BRAKE_PCT {
        events.push(EventKind::HarshBrake);
    }
    if sample.g_lon > HARD_ACCEL_G {
        events.push(EventKind::HardAccel);
    }
    if sample.speed_kmh > OVERSPEED_KMH {
        events.push(EventKind::Overspeed);
    }
    events
}
