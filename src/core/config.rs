//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DtpError, Result};

/// Full pipeline configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub simulator: SimulatorConfig,
    pub ingest: IngestConfig,
    pub store: StoreConfig,
    pub paths: PathsConfig,
}

/// Generator-side knobs: identity, tick rate, reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Opaque vehicle identifier stamped on every sample.
    pub vehicle_id: String,
    /// Samples generated per second. Must be finite and > 0.
    pub rate_hz: f64,
    /// RNG seed. Two runs with the same seed and tick count produce
    /// identical sample sequences.
    pub seed: u64,
}

/// Consumer-side knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// Sleep between tail polls when no new line is available. Detection
    /// latency is bounded by this interval.
    pub poll_interval_ms: u64,
    /// Whether to mirror detected events to the auxiliary events log.
    pub events_log_enabled: bool,
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Fixed backoff between store connection attempts at startup.
    pub connect_retry_ms: u64,
}

/// Filesystem paths used by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    /// The shared append-only telemetry log (producer writes, consumer tails).
    pub telemetry_log: PathBuf,
    /// Auxiliary events log: one line per sample that produced >= 1 event.
    pub events_log: PathBuf,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            vehicle_id: "demo_vehicle".to_string(),
            rate_hz: 1.0,
            seed: 0,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            events_log_enabled: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_data_dir().join("telemetry.sqlite3"),
            connect_retry_ms: 2_000,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data = default_data_dir();
        Self {
            config_file: default_config_dir().join("config.toml"),
            telemetry_log: data.join("telemetry.jsonl"),
            events_log: data.join("events.jsonl"),
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[DTP-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn default_data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("dtp")
}

fn default_config_dir() -> PathBuf {
    home_dir().join(".config").join("dtp")
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| DtpError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(DtpError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for startup logging.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes and
    /// Rust releases.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_string("DTP_VEHICLE_ID", &mut self.simulator.vehicle_id);
        set_env_f64("DTP_RATE_HZ", &mut self.simulator.rate_hz)?;
        set_env_u64("DTP_SEED", &mut self.simulator.seed)?;
        set_env_path("DTP_OUT_PATH", &mut self.paths.telemetry_log);
        set_env_path("DTP_EVENTS_PATH", &mut self.paths.events_log);
        set_env_path("DTP_DB_PATH", &mut self.store.db_path);
        set_env_u64("DTP_POLL_INTERVAL_MS", &mut self.ingest.poll_interval_ms)?;
        set_env_bool(
            "DTP_EVENTS_LOG_ENABLED",
            &mut self.ingest.events_log_enabled,
        )?;
        set_env_u64("DTP_CONNECT_RETRY_MS", &mut self.store.connect_retry_ms)?;
        Ok(())
    }

    /// Check cross-field constraints on the effective configuration.
    ///
    /// `load` runs this automatically; callers that mutate the config after
    /// loading (CLI flag overrides) must re-run it before use.
    pub fn validate(&self) -> Result<()> {
        if !self.simulator.rate_hz.is_finite() || self.simulator.rate_hz <= 0.0 {
            return Err(DtpError::InvalidConfig {
                details: format!(
                    "simulator.rate_hz must be finite and > 0, got {}",
                    self.simulator.rate_hz
                ),
            });
        }
        if self.simulator.vehicle_id.is_empty() {
            return Err(DtpError::InvalidConfig {
                details: "simulator.vehicle_id must not be empty".to_string(),
            });
        }
        if self.ingest.poll_interval_ms == 0 {
            return Err(DtpError::InvalidConfig {
                details: "ingest.poll_interval_ms must be >= 1".to_string(),
            });
        }
        if self.store.connect_retry_ms == 0 {
            return Err(DtpError::InvalidConfig {
                details: "store.connect_retry_ms must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

// ──────────────────── env override helpers ────────────────────

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn set_env_string(name: &str, target: &mut String) {
    if let Some(raw) = env_var(name) {
        *target = raw;
    }
}

fn set_env_path(name: &str, target: &mut PathBuf) {
    if let Some(raw) = env_var(name) {
        *target = PathBuf::from(raw);
    }
}

fn set_env_f64(name: &str, target: &mut f64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *target = raw.parse().map_err(|_| DtpError::InvalidConfig {
            details: format!("{name} must be a number, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_u64(name: &str, target: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *target = raw.parse().map_err(|_| DtpError::InvalidConfig {
            details: format!("{name} must be a non-negative integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, target: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *target = parse_env_bool(name, &raw)?;
    }
    Ok(())
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DtpError::InvalidConfig {
            details: format!("{name} must be a boolean, got {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.simulator.vehicle_id, "demo_vehicle");
        assert!((cfg.simulator.rate_hz - 1.0).abs() < f64::EPSILON);
        assert_eq!(cfg.simulator.seed, 0);
    }

    #[test]
    fn rejects_non_positive_rate() {
        let mut cfg = Config::default();
        cfg.simulator.rate_hz = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(DtpError::InvalidConfig { .. })
        ));

        cfg.simulator.rate_hz = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut cfg = Config::default();
        cfg.ingest.poll_interval_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_vehicle_id() {
        let mut cfg = Config::default();
        cfg.simulator.vehicle_id.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent_dtp_test/config.toml"))).unwrap_err();
        assert_eq!(err.code(), "DTP-1002");
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[simulator]
vehicle_id = "car_42"
rate_hz = 10.0
seed = 7

[ingest]
poll_interval_ms = 250
"#,
        )
        .unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.simulator.vehicle_id, "car_42");
        assert!((cfg.simulator.rate_hz - 10.0).abs() < f64::EPSILON);
        assert_eq!(cfg.simulator.seed, 7);
        assert_eq!(cfg.ingest.poll_interval_ms, 250);
        // Unspecified sections keep defaults.
        assert!(cfg.ingest.events_log_enabled);
        assert_eq!(cfg.paths.config_file, path);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "= not toml").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.code(), "DTP-1003");
    }

    #[test]
    fn stable_hash_is_deterministic() {
        let a = Config::default();
        let b = Config::default();
        assert_eq!(a.stable_hash().unwrap(), b.stable_hash().unwrap());

        let mut c = Config::default();
        c.simulator.seed = 99;
        assert_ne!(a.stable_hash().unwrap(), c.stable_hash().unwrap());
    }

    #[test]
    fn env_bool_parsing() {
        assert!(parse_env_bool("DTP_EVENTS_LOG_ENABLED", "yes").unwrap());
        assert!(parse_env_bool("DTP_EVENTS_LOG_ENABLED", "TRUE").unwrap());
        assert!(!parse_env_bool("DTP_EVENTS_LOG_ENABLED", "0").unwrap());
        assert!(parse_env_bool("DTP_EVENTS_LOG_ENABLED", "banana").is_err());
    }
}
