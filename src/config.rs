//! Loading application configuration (store backend, study constants, sample set) from TOML.
//!
//! See `AppConfig` for the expected schema. Every section is optional.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Difficulty;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub store: StoreCfg,
  #[serde(default)]
  pub study: StudyCfg,
  /// Replaces the bundled sample words when non-empty.
  #[serde(default)]
  pub samples: Vec<SampleCfg>,
}

#[derive(Clone, Copy, Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
  Memory,
  #[default]
  JsonFile,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StoreCfg {
  #[serde(default)]
  pub backend: StoreBackend,
  #[serde(default = "default_store_path")]
  pub path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("data/tango.json") }

impl Default for StoreCfg {
  fn default() -> Self {
    Self { backend: StoreBackend::default(), path: default_store_path() }
  }
}

/// Tunable study settings. Round cap and minimum pool size are fixed
/// (`session::ROUND_CAP`, `session::MIN_POOL`) and rejected here.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StudyCfg {
  /// Words at or above this level are drilled in difficulty mode.
  #[serde(default = "default_hard_threshold")]
  pub hard_threshold: Difficulty,
}

fn default_hard_threshold() -> Difficulty { Difficulty::new(3).unwrap_or(Difficulty::MAX) }

impl Default for StudyCfg {
  fn default() -> Self {
    Self { hard_threshold: default_hard_threshold() }
  }
}

/// Sample word entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct SampleCfg {
  pub headword: String,
  pub translation: String,
  #[serde(default)]
  pub difficulty: Difficulty,
}

/// Load `AppConfig` from TANGO_CONFIG_PATH. Missing variable, IO or parse errors
/// all fall back to defaults.
pub fn load_config_from_env() -> AppConfig {
  let Ok(path) = std::env::var("TANGO_CONFIG_PATH") else {
    info!(target: "tango_backend", "TANGO_CONFIG_PATH not set; using default config");
    return AppConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "tango_backend", %path, "Loaded config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "tango_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
        AppConfig::default()
      }
    },
    Err(e) => {
      error!(target: "tango_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
      AppConfig::default()
    }
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}
