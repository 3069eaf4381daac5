use attodry_logger::log_row::TIME_COLUMN;
use attodry_logger::plot_board::read_log;
use attodry_logger::{
    start_when_cold, AttoDryConnector, ConnectionConfig, LogSession, Pacer, PlotBoard,
    PlotEvent, SimulatedAttoDry, VirtualPacer, WaitError, HEADERS,
};
use std::sync::mpsc;
use std::time::Duration;

fn test_connection() -> ConnectionConfig {
    ConnectionConfig {
        check_port: false,
        ..ConnectionConfig::default()
    }
}

#[test]
fn n_calls_give_header_plus_n_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = LogSession::new(dir.path());
    let mut device = SimulatedAttoDry::connected();

    for _ in 0..7 {
        session.log(&mut device, None).unwrap();
    }

    let df = read_log(session.log_file().unwrap(), None).unwrap();
    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    assert_eq!(names, HEADERS);
    assert_eq!(df.height(), 7);

    let times: Vec<f64> = df
        .column(TIME_COLUMN)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn full_cooldown_run_feeds_live_plot() {
    let dir = tempfile::tempdir().unwrap();
    let (events, receiver) = mpsc::channel();
    let mut session = LogSession::new(dir.path()).with_plot_notifier(events);
    let mut device = SimulatedAttoDry::new().with_cooldown_polls(5);
    let mut pacer = VirtualPacer::new();
    let config = test_connection();

    let status = AttoDryConnector::connect(&mut device, &config, &mut pacer).unwrap();
    assert!(status.is_ready());

    let handed_off = start_when_cold(
        &mut device,
        &mut session,
        &mut pacer,
        Duration::from_secs(5),
        |_, _| Ok::<_, WaitError>(true),
    )
    .unwrap();
    assert!(handed_off);

    AttoDryConnector::cleanup(&mut device, &config, &mut pacer).unwrap();
    assert_eq!(pacer.now(), Duration::from_secs(10 + 5 * 5 + 2));

    let mut board = PlotBoard::new();
    let mut announcements = 0;
    while let Ok(event) = receiver.try_recv() {
        announcements += 1;
        board.handle(event).unwrap();
    }
    assert_eq!(announcements, 5);

    board.select_column(3, "Magnetic Field").unwrap();
    assert_eq!(board.pane(0).unwrap().title(), "Temperature Setpoint vs. Time");
    assert_eq!(board.pane(0).unwrap().series().len(), 5);
    assert_eq!(board.pane(3).unwrap().title(), "Magnetic Field vs. Time");
    assert!(board.pane(3).unwrap().series().iter().all(|[_, field]| *field == 0.0));
}

#[test]
fn plot_event_names_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let (events, receiver) = mpsc::channel();
    let mut session = LogSession::new(dir.path()).with_plot_notifier(events);
    let mut device = SimulatedAttoDry::connected();

    session.log(&mut device, Some("Check")).unwrap();

    assert_eq!(
        receiver.try_recv().unwrap(),
        PlotEvent::LogFile(session.log_file().unwrap().to_path_buf())
    );
}
