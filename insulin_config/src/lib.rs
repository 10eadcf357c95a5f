#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Config schemas, persisted record schemas, and key-value store backends.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `persisted` holds the JSON records kept in the key-value store, read
//!   leniently so records written by older app versions still load.
//! - `store` provides the in-memory and JSON-file `KvStore` backends.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod persisted;
pub mod store;

pub use persisted::{LegacyPreset, LegacyPresets, PersistedProfile};
pub use store::{FileStore, MemoryStore, StoreError};

/// Glucose unit used for user-facing input and output.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// mg/dL; also the internal storage unit
    #[default]
    Mgdl,
    /// mmol/L
    Mmol,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// User settings. Stored as JSON under `ic_settings`; the same shape seeds
/// fresh installs from the `[defaults]` table of the TOML config.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub units: Units,
    /// Dose rounding step in insulin units (always rounds down).
    pub rounding: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            units: Units::Mgdl,
            rounding: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// JSON file backing the key-value store
    pub path: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            path: PathBuf::from("insulin_state.json"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Settings used until the user stores their own
    #[serde(default)]
    pub defaults: Settings,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const ROTATIONS: [&str; 3] = ["never", "daily", "hourly"];

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Defaults
        let step = self.defaults.rounding;
        if !step.is_finite() || step <= 0.0 {
            eyre::bail!("defaults.rounding must be > 0");
        }
        if step > 10.0 {
            eyre::bail!("defaults.rounding is unreasonably large (>10 units)");
        }

        // Storage
        if self.storage.path.as_os_str().is_empty() {
            eyre::bail!("storage.path must not be empty");
        }

        // Logging
        if let Some(level) = &self.logging.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            eyre::bail!(
                "logging.level must be one of {}, got '{level}'",
                LOG_LEVELS.join("|")
            );
        }
        if let Some(rotation) = &self.logging.rotation
            && !ROTATIONS.contains(&rotation.to_ascii_lowercase().as_str())
        {
            eyre::bail!(
                "logging.rotation must be one of {}, got '{rotation}'",
                ROTATIONS.join("|")
            );
        }

        Ok(())
    }
}
