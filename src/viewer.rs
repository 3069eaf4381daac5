use std::path::{Path, PathBuf};

use crate::config::LoggerConfig;
use crate::plot_board::PlotBoard;
use crate::plotter::run_log_plot;

/// Ask the user for a historical log file, starting in `start_dir`.
pub fn pick_log_file(start_dir: &Path) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select Log File")
        .set_directory(start_dir)
        .add_filter("Text Files", &["txt"])
        .pick_file()
}

/// Plot an old log file; without `file` a picker dialog is shown first.
///
/// Returns without opening a window when the dialog is dismissed.
pub fn view_old_log(file: Option<PathBuf>, config: &LoggerConfig) -> Result<(), eframe::Error> {
    let Some(path) = file.or_else(|| pick_log_file(&config.base_log_dir)) else {
        log::info!("No log file selected.");
        return Ok(());
    };

    log::info!("Selected log file: {}", path.display());
    let title = path.file_name().map_or_else(
        || "Log Plot".to_string(),
        |name| format!("Log Plot - {}", name.to_string_lossy()),
    );
    run_log_plot(&title, PlotBoard::for_file(path), None, config.plot.refresh)
}
