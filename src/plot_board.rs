use polars::prelude::*;
use std::path::{Path, PathBuf};

use crate::log_row::{NON_PLOTTABLE_COLUMNS, TIME_COLUMN};

pub const PANE_COUNT: usize = 4;

/// Sent by a [`crate::LogSession`] after every appended row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotEvent {
    LogFile(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("Failed to read log file: {0}")]
    Polars(#[from] PolarsError),

    #[error("There is no plot pane {0}")]
    NoSuchPane(usize),

    #[error("Column '{0}' cannot be plotted")]
    UnknownColumn(String),
}

/// One chart and the column its selector points at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotPane {
    column: Option<String>,
    series: Vec<[f64; 2]>,
    title: String,
}

impl PlotPane {
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// `[time, value]` points, rows with a missing value are dropped.
    pub fn series(&self) -> &[[f64; 2]] {
        &self.series
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn render(&mut self, df: &DataFrame) -> Result<(), PlotError> {
        let Some(column) = self.column.clone() else {
            return Ok(());
        };
        if df.column(&column).is_err() {
            return Ok(());
        }

        self.series = read_series(df, &column)?;
        self.title = format!("{column} vs. Time");
        Ok(())
    }
}

/// The four panes of a log plot window and the file they are drawn from.
///
/// Every refresh re-parses the whole file. That is fine for the few thousand
/// rows a cooldown produces.
#[derive(Debug, Clone, Default)]
pub struct PlotBoard {
    source: Option<PathBuf>,
    columns: Vec<String>,
    panes: [PlotPane; PANE_COUNT],
}

impl PlotBoard {
    /// A board with no file yet; it attaches on the first [`PlotEvent`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Columns offered by the selectors; empty until the header was read.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn panes(&self) -> &[PlotPane; PANE_COUNT] {
        &self.panes
    }

    pub fn pane(&self, index: usize) -> Option<&PlotPane> {
        self.panes.get(index)
    }

    /// Point the board at another file. Returns false if nothing changed.
    pub fn attach(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.source.as_ref() == Some(&path) {
            return false;
        }
        log::debug!("Plotting {}", path.display());
        self.source = Some(path);
        self.columns.clear();
        self.panes = Default::default();
        true
    }

    /// Fill the selectors from the log header, each defaulting to the first column.
    ///
    /// Returns false, without error, when there is no file to read yet.
    pub fn load_available_columns(&mut self) -> Result<bool, PlotError> {
        let Some(df) = self.read_source(Some(1))? else {
            return Ok(false);
        };

        self.columns = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| !NON_PLOTTABLE_COLUMNS.contains(&name.as_str()))
            .collect();

        let default = self.columns.first().cloned();
        for pane in &mut self.panes {
            pane.column.clone_from(&default);
        }
        Ok(true)
    }

    /// Re-read the file and redraw every pane.
    pub fn refresh(&mut self) -> Result<bool, PlotError> {
        if self.columns.is_empty() && !self.load_available_columns()? {
            return Ok(false);
        }
        let Some(df) = self.read_source(None)? else {
            return Ok(false);
        };
        if df.column(TIME_COLUMN).is_err() {
            return Ok(false);
        }

        for pane in &mut self.panes {
            pane.render(&df)?;
        }
        Ok(true)
    }

    /// Change one selector and redraw only that pane.
    pub fn select_column(&mut self, pane: usize, column: &str) -> Result<(), PlotError> {
        if pane >= PANE_COUNT {
            return Err(PlotError::NoSuchPane(pane));
        }
        if !self.columns.iter().any(|c| c == column) {
            return Err(PlotError::UnknownColumn(column.to_string()));
        }

        self.panes[pane].column = Some(column.to_string());

        if let Some(df) = self.read_source(None)? {
            if df.column(TIME_COLUMN).is_ok() {
                self.panes[pane].render(&df)?;
            }
        }
        Ok(())
    }

    /// React to a session announcing its log file.
    pub fn handle(&mut self, event: PlotEvent) -> Result<bool, PlotError> {
        match event {
            PlotEvent::LogFile(path) => {
                self.attach(path);
                self.refresh()
            }
        }
    }

    fn read_source(&self, n_rows: Option<usize>) -> Result<Option<DataFrame>, PlotError> {
        match &self.source {
            Some(path) if path.exists() => Ok(Some(read_log(path, n_rows)?)),
            _ => Ok(None),
        }
    }
}

/// Parse a tab separated log file.
pub fn read_log(path: &Path, n_rows: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(n_rows)
        .with_parse_options(CsvParseOptions::default().with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

fn read_series(df: &DataFrame, column: &str) -> PolarsResult<Vec<[f64; 2]>> {
    let points = df
        .clone()
        .lazy()
        .select([
            col(TIME_COLUMN).cast(DataType::Float64).alias("x"),
            col(column).cast(DataType::Float64).alias("y"),
        ])
        .collect()?;

    let xs = points.column("x")?.f64()?;
    let ys = points.column("y")?.f64()?;

    Ok(xs
        .into_iter()
        .zip(ys.into_iter())
        .filter_map(|(x, y)| Some([x?, y?]))
        .collect())
}
