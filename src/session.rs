use chrono::{Local, NaiveDate};
use polars::prelude::*;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;

use crate::driver::{AttoDry, AttoDryError};
use crate::file_namer::{base_log_name, log_folder, unique_log_path};
use crate::log_row::LogRow;
use crate::plot_board::PlotEvent;

#[derive(Debug, thiserror::Error)]
pub enum LogSessionError {
    #[error("Instrument read failed: {0}")]
    Driver(#[from] AttoDryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write log file: {0}")]
    Polars(#[from] PolarsError),
}

/// One run's worth of logging: a single tab separated file and its start time.
///
/// The file is picked lazily on the first [`LogSession::log`] call, inside a
/// monthly folder under the base directory. Later calls only append.
#[derive(Debug)]
pub struct LogSession {
    base_dir: PathBuf,
    log_file: Option<PathBuf>,
    started: Option<Instant>,
    notifier: Option<Sender<PlotEvent>>,
}

impl LogSession {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            log_file: None,
            started: None,
            notifier: None,
        }
    }

    /// Announce the log file to a live plot after every appended row.
    pub fn with_plot_notifier(mut self, notifier: Sender<PlotEvent>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.started.is_some()
    }

    /// Append one snapshot of the instrument to the session's log file.
    ///
    /// `description` only matters on the call that creates the file; it ends
    /// up in the file name. Read or write failures are returned as is.
    pub fn log<D: AttoDry + ?Sized>(
        &mut self,
        driver: &mut D,
        description: Option<&str>,
    ) -> Result<LogRow, LogSessionError> {
        self.log_on(driver, description, Local::now().date_naive())
    }

    fn log_on<D: AttoDry + ?Sized>(
        &mut self,
        driver: &mut D,
        description: Option<&str>,
        date: NaiveDate,
    ) -> Result<LogRow, LogSessionError> {
        let folder = log_folder(&self.base_dir, date);
        fs::create_dir_all(&folder)?;

        let path = match &self.log_file {
            Some(path) => path.clone(),
            None => {
                let path = unique_log_path(&folder, &base_log_name(date, description));
                self.log_file = Some(path.clone());
                path
            }
        };

        let started = match self.started {
            Some(started) => started,
            None => {
                Self::write_header(&path)?;
                let started = Instant::now();
                self.started = Some(started);
                log::info!("Initialized log file: {}", path.display());
                started
            }
        };

        let row = driver.snapshot(LogRow::round_time(started.elapsed().as_secs_f64()))?;
        Self::append_row(&path, &row)?;
        log::debug!("Logged row at t={}s to {}", row.time, path.display());

        self.notify_plot(&path);
        Ok(row)
    }

    fn write_header(path: &Path) -> Result<(), LogSessionError> {
        let mut file = File::create(path)?;
        let mut header = LogRow::header_frame()?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b'\t')
            .finish(&mut header)?;
        Ok(())
    }

    fn append_row(path: &Path, row: &LogRow) -> Result<(), LogSessionError> {
        let mut file = OpenOptions::new().append(true).open(path)?;
        let mut df = row.to_frame()?;
        CsvWriter::new(&mut file)
            .include_header(false)
            .with_separator(b'\t')
            .finish(&mut df)?;
        Ok(())
    }

    fn notify_plot(&mut self, path: &Path) {
        if let Some(notifier) = &self.notifier {
            if notifier.send(PlotEvent::LogFile(path.to_path_buf())).is_err() {
                log::debug!("Live plot closed, no longer sending refreshes");
                self.notifier = None;
            }
        }
    }
}
