//! Logger configuration.
//!
//! Loaded in three layers, later ones winning:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables prefixed with `ATTODRY_`, nested keys separated
//!    by `__` (e.g. `ATTODRY_POLLING__COOLDOWN_INTERVAL=10s`)
//!
//! # Example
//! ```no_run
//! use attodry_logger::LoggerConfig;
//!
//! let config = LoggerConfig::load(Some("attodry.toml".as_ref()))?;
//! println!("Logging to {}", config.base_log_dir.display());
//! # Ok::<(), figment::Error>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Root under which the monthly log folders are created.
    pub base_log_dir: PathBuf,
    pub connection: ConnectionConfig,
    pub polling: PollingConfig,
    pub plot: PlotConfig,
    pub handoff: HandoffConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub com_port: String,
    pub setup_version: u16,
    /// Wait between opening the port and checking the device flags.
    #[serde(with = "humantime_serde")]
    pub settle: Duration,
    #[serde(with = "humantime_serde")]
    pub disconnect_settle: Duration,
    /// Warn if `com_port` is not one of the host's serial ports.
    pub check_port: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    #[serde(with = "humantime_serde")]
    pub cooldown_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub stability_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub progress_every: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    #[serde(with = "humantime_serde")]
    pub refresh: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Program used to run the post-cooldown script, e.g. `python`.
    pub interpreter: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            base_log_dir: dirs::document_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("AttoDRY Log Files"),
            connection: ConnectionConfig::default(),
            polling: PollingConfig::default(),
            plot: PlotConfig::default(),
            handoff: HandoffConfig::default(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            com_port: "COM4".to_string(),
            setup_version: 1,
            settle: Duration::from_secs(10),
            disconnect_settle: Duration::from_secs(2),
            check_port: true,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            cooldown_interval: Duration::from_secs(5),
            stability_interval: Duration::from_secs(1),
            progress_every: Duration::from_secs(1000),
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh: Duration::from_secs(2),
        }
    }
}

impl LoggerConfig {
    /// The layered figment, before extraction.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed("ATTODRY_").split("__"))
    }

    /// Extract the configuration. A file that was asked for must exist.
    pub fn load(file: Option<&Path>) -> Result<Self, figment::Error> {
        if let Some(file) = file {
            if !file.is_file() {
                return Err(format!("config file {} not found", file.display()).into());
            }
        }
        Self::figment(file).extract()
    }
}
