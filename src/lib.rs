//! # AttoDRY Logger
//!
//! Sensor logging, live plotting and wait helpers for attocube AttoDRY cryostats.
//!
//! The crate polls an [`AttoDry`] driver for its temperatures, heater powers,
//! magnetic field and pressures, and appends one tab separated row per poll to
//! a dated log file. The same log file feeds a four-pane live plot window.
//!
//! ## Features
//!
//! - **Session logging**: one file per [`LogSession`], laid out as
//!   `<base>/<Month Year>/Log_File-<dd-mm-yy>[_<description>][NN].txt`
//! - **Wait helpers**: block until the cooldown finished or until the sample
//!   temperature settled, logging all the way
//! - **Cancellable pacing**: every wait goes through a [`Pacer`], so a
//!   [`CancelToken`] can stop it from another thread
//! - **DataFrame I/O**: uses `polars` to write and re-read the log files
//! - **Live plots** (`gui` feature): `egui` window with four selectable panes,
//!   plus a file picker for old logs
//!
//! ## Examples
//!
//! ### Logging a few samples
//!
//! ```rust,no_run
//! use attodry_logger::{AttoDryConnector, LogSession, LoggerConfig, SimulatedAttoDry, WallPacer};
//!
//! let config = LoggerConfig::load(None)?;
//! let mut device = SimulatedAttoDry::new();
//! let mut pacer = WallPacer::default();
//!
//! AttoDryConnector::connect(&mut device, &config.connection, &mut pacer)?;
//!
//! let mut session = LogSession::new(&config.base_log_dir);
//! for _ in 0..3 {
//!     let row = session.log(&mut device, Some("Test"))?;
//!     println!("t={}s sample={} K", row.time, row.sample_temperature);
//! }
//!
//! AttoDryConnector::cleanup(&mut device, &config.connection, &mut pacer)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Waiting for a stable temperature
//!
//! ```rust
//! use attodry_logger::{wait_until_stable, LogSession, SimulatedAttoDry, StabilityCriteria, VirtualPacer};
//! use std::time::Duration;
//!
//! let dir = tempfile::tempdir()?;
//! let mut session = LogSession::new(dir.path());
//! let mut device = SimulatedAttoDry::connected().with_sample_temperatures([10.02]);
//! let mut pacer = VirtualPacer::new();
//!
//! let criteria = StabilityCriteria::new(10.0, 0.05, Duration::from_secs(30));
//! let report = wait_until_stable(&mut device, &mut session, &mut pacer, &criteria)?;
//! assert_eq!(report.settled_at, Duration::from_secs(30));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod connector;
pub mod driver;
pub mod file_namer;
pub mod log_row;
pub mod pacing;
pub mod plot_board;
pub mod script;
pub mod session;
pub mod simulated;
pub mod waiters;

#[cfg(feature = "gui")]
pub mod plotter;
#[cfg(feature = "gui")]
pub mod viewer;

// Re-export the main types for convenience
pub use config::{ConnectionConfig, LoggerConfig, PlotConfig, PollingConfig};

pub use connector::{AttoDryConnector, ConnectionStatus, ConnectorError};

pub use driver::{AttoDry, AttoDryError};

pub use log_row::{LogRow, HEADERS};

pub use pacing::{CancelToken, Cancelled, Pacer, VirtualPacer, WallPacer};

pub use plot_board::{PlotBoard, PlotError, PlotEvent, PlotPane, PANE_COUNT};

pub use script::{ScriptError, ScriptRunner};

pub use session::{LogSession, LogSessionError};

pub use simulated::SimulatedAttoDry;

pub use waiters::{
    start_when_cold, wait_for_cooldown, wait_until_stable, StabilityCriteria, StabilityReport,
    WaitError,
};

#[cfg(feature = "gui")]
pub use plotter::{run_log_plot, LivePlotApp};
#[cfg(feature = "gui")]
pub use viewer::{pick_log_file, view_old_log};
