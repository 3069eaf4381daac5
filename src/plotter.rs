use egui_plot::{Line, Plot, PlotPoints, Points};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use crate::plot_board::{PlotBoard, PlotEvent, PlotPane, PANE_COUNT};

const WINDOW_SIZE: [f32; 2] = [1200.0, 800.0];
const MARKER_RADIUS: f32 = 2.5;

/// Window with four log plots, redrawn from disk on a fixed timer.
pub struct LivePlotApp {
    board: PlotBoard,
    events: Option<Receiver<PlotEvent>>,
    refresh_every: Duration,
    last_refresh: Option<Instant>,
}

impl LivePlotApp {
    pub fn new(mut board: PlotBoard, refresh_every: Duration) -> Self {
        if let Err(e) = board.load_available_columns() {
            log::warn!("Could not read log header: {}", e);
        }
        Self {
            board,
            events: None,
            refresh_every,
            last_refresh: None,
        }
    }

    /// Follow the log file announced by a running session.
    pub fn with_events(mut self, events: Receiver<PlotEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn board(&self) -> &PlotBoard {
        &self.board
    }

    fn poll_events(&mut self) {
        let Some(events) = &self.events else {
            return;
        };

        let mut latest = None;
        let mut finished = false;
        loop {
            match events.try_recv() {
                Ok(event) => latest = Some(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }
        if finished {
            log::debug!("Logging session finished");
            self.events = None;
        }

        if let Some(event) = latest {
            match self.board.handle(event) {
                Ok(_) => self.last_refresh = Some(Instant::now()),
                Err(e) => log::warn!("Live plot refresh failed: {}", e),
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        let due = self
            .last_refresh
            .is_none_or(|last| now.duration_since(last) >= self.refresh_every);
        if !due {
            return;
        }

        self.last_refresh = Some(now);
        if let Err(e) = self.board.refresh() {
            log::warn!("Live plot refresh failed: {}", e);
        }
    }

    fn selector_row(&self, ui: &mut egui::Ui) -> Option<(usize, String)> {
        let mut selection = None;
        ui.horizontal(|ui| {
            for (index, pane) in self.board.panes().iter().enumerate() {
                let current = pane.column().unwrap_or_default();
                egui::ComboBox::from_label(format!("Plot {}", index + 1))
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        for column in self.board.columns() {
                            let selected = column == current;
                            if ui.selectable_label(selected, column.as_str()).clicked() && !selected {
                                selection = Some((index, column.clone()));
                            }
                        }
                    });
            }
        });
        selection
    }
}

impl eframe::App for LivePlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.tick(Instant::now());

        let selection = egui::TopBottomPanel::top("selectors")
            .show(ctx, |ui| self.selector_row(ui))
            .inner;

        if let Some((pane, column)) = selection {
            if let Err(e) = self.board.select_column(pane, &column) {
                log::warn!("Could not plot {}: {}", column, e);
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(PANE_COUNT, |columns| {
                for (index, (ui, pane)) in columns.iter_mut().zip(self.board.panes()).enumerate() {
                    draw_pane(ui, index, pane);
                }
            });
        });

        ctx.request_repaint_after(self.refresh_every);
    }
}

fn draw_pane(ui: &mut egui::Ui, index: usize, pane: &PlotPane) {
    ui.label(egui::RichText::new(pane.title()).strong());

    let points = pane.series().to_vec();
    Plot::new(("log_pane", index))
        .x_axis_label("Time (s)")
        .y_axis_label(pane.column().unwrap_or_default())
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::from(points.clone())).color(egui::Color32::RED));
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .radius(MARKER_RADIUS)
                    .color(egui::Color32::RED),
            );
        });
}

/// Open a plot window and block until it is closed.
pub fn run_log_plot(
    title: &str,
    board: PlotBoard,
    events: Option<Receiver<PlotEvent>>,
    refresh_every: Duration,
) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size(WINDOW_SIZE),
        ..Default::default()
    };

    let mut app = LivePlotApp::new(board, refresh_every);
    if let Some(events) = events {
        app = app.with_events(events);
    }

    eframe::run_native(title, options, Box::new(move |_cc| Ok(Box::new(app))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::mpsc;

    const LOG: &str = "Time\tSample Temperature\tAction Message\tError Status\n\
                       0.0\t295.0\tIdle\tNo Error\n";

    #[test]
    fn test_event_attaches_and_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, LOG).unwrap();

        let (tx, rx) = mpsc::channel();
        let mut app = LivePlotApp::new(PlotBoard::new(), Duration::from_secs(2)).with_events(rx);
        assert!(app.board().columns().is_empty());

        tx.send(PlotEvent::LogFile(path.clone())).unwrap();
        app.poll_events();

        assert_eq!(app.board().source(), Some(path.as_path()));
        assert_eq!(app.board().pane(0).unwrap().series(), [[0.0, 295.0]]);
    }

    #[test]
    fn test_timer_refresh_reads_new_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, LOG).unwrap();

        let mut app = LivePlotApp::new(PlotBoard::for_file(&path), Duration::from_secs(2));
        let start = Instant::now();
        app.tick(start);
        assert_eq!(app.board().pane(0).unwrap().series().len(), 1);

        fs::write(&path, format!("{LOG}1.0\t290.0\tIdle\tNo Error\n")).unwrap();
        app.tick(start + Duration::from_secs(1));
        assert_eq!(app.board().pane(0).unwrap().series().len(), 1);

        app.tick(start + Duration::from_secs(2));
        assert_eq!(app.board().pane(0).unwrap().series().len(), 2);
    }

    #[test]
    fn test_closed_session_is_dropped() {
        let (tx, rx) = mpsc::channel::<PlotEvent>();
        let mut app = LivePlotApp::new(PlotBoard::new(), Duration::from_secs(2)).with_events(rx);
        drop(tx);

        app.poll_events();
        assert!(app.events.is_none());
    }
}
