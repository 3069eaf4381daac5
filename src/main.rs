use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use attodry_logger::{
    start_when_cold, wait_until_stable, AttoDry, AttoDryConnector, ConnectorError, LogSession,
    LoggerConfig, Pacer, ScriptRunner, SimulatedAttoDry, StabilityCriteria, WaitError, WallPacer,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "attodry-logger", version, about = "Log and plot AttoDRY cryostat sensors")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the built-in simulated cryostat instead of a real device
    #[arg(long)]
    simulate: bool,

    /// Do not open the live plot window
    #[arg(long)]
    no_plot: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the serial ports present on this host
    Ports,
    /// Log samples at a fixed interval
    Log {
        /// Added to the log file name
        #[arg(short, long)]
        description: Option<String>,
        /// Stop after this many samples instead of running until killed
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Time between samples, e.g. `5s` or `500ms`
        #[arg(short, long, default_value = "5s", value_parser = humantime::parse_duration)]
        interval: Duration,
    },
    /// Log while the cryostat cools down, then run a script
    WaitCold {
        script: PathBuf,
        /// Program that runs the script, e.g. `python`
        #[arg(long)]
        interpreter: Option<PathBuf>,
    },
    /// Log until the sample temperature settled around a setpoint
    WaitStable {
        /// Kelvin
        #[arg(long)]
        setpoint: f64,
        /// Kelvin
        #[arg(long)]
        tolerance: f64,
        /// How long the temperature must stay in band, e.g. `10min`
        #[arg(long, value_parser = humantime::parse_duration)]
        settling: Duration,
    },
    /// Plot an old log file, picking one in a dialog if none is given
    View { file: Option<PathBuf> },
}

fn main() -> Result<(), BoxError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = LoggerConfig::load(cli.config.as_deref())?;
    if cli.no_plot {
        config.plot.enabled = false;
    }

    match cli.command {
        Command::Ports => {
            for port in AttoDryConnector::available_ports()? {
                println!("{port}");
            }
            Ok(())
        }
        Command::View { file } => view(file, &config),
        command => {
            let driver = open_driver(cli.simulate)?;
            run_polling(command, driver, config)
        }
    }
}

fn open_driver(simulate: bool) -> Result<Box<dyn AttoDry + Send>, BoxError> {
    if simulate {
        log::info!("Using the simulated AttoDRY");
        Ok(Box::new(SimulatedAttoDry::new().with_cooldown_polls(12)))
    } else {
        Err("no AttoDRY vendor driver is linked into this build, rerun with --simulate".into())
    }
}

#[cfg(feature = "gui")]
fn view(file: Option<PathBuf>, config: &LoggerConfig) -> Result<(), BoxError> {
    attodry_logger::view_old_log(file, config).map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn view(_file: Option<PathBuf>, _config: &LoggerConfig) -> Result<(), BoxError> {
    Err("log viewer needs the `gui` feature".into())
}

/// Run a polling command, next to a live plot window when enabled.
///
/// Closing the plot window stops the command; the device session is still
/// closed afterwards.
fn run_polling(
    command: Command,
    mut driver: Box<dyn AttoDry + Send>,
    config: LoggerConfig,
) -> Result<(), BoxError> {
    #[cfg(feature = "gui")]
    if config.plot.enabled {
        let (events, receiver) = std::sync::mpsc::channel();
        let mut session = LogSession::new(&config.base_log_dir).with_plot_notifier(events);
        let refresh = config.plot.refresh;
        let stop = attodry_logger::CancelToken::new();
        let mut pacer = WallPacer::new(stop.clone());

        let worker = std::thread::spawn(move || {
            with_device(command, driver.as_mut(), &mut session, &mut pacer, &config)
        });
        let shown = attodry_logger::run_log_plot(
            "Live Log Plot",
            attodry_logger::PlotBoard::new(),
            Some(receiver),
            refresh,
        );

        if !worker.is_finished() {
            log::info!("Plot window closed, stopping");
            stop.cancel();
        }
        worker.join().map_err(|_| "logging thread panicked")??;
        shown.map_err(|e| e.to_string())?;
        return Ok(());
    }

    let mut session = LogSession::new(&config.base_log_dir);
    let mut pacer = WallPacer::default();
    with_device(command, driver.as_mut(), &mut session, &mut pacer, &config)
}

/// Connect, run the command and always close the device session afterwards.
///
/// A cancelled pacer ends the command early without counting as an error.
fn with_device<P: Pacer>(
    command: Command,
    driver: &mut (dyn AttoDry + Send),
    session: &mut LogSession,
    pacer: &mut P,
    config: &LoggerConfig,
) -> Result<(), BoxError> {
    let result = match AttoDryConnector::connect(&mut *driver, &config.connection, pacer) {
        Ok(_) => execute(command, &mut *driver, session, pacer, config),
        Err(ConnectorError::Cancelled(_)) => {
            log::info!("Stopped while connecting");
            Ok(())
        }
        Err(e) => Err(e.into()),
    };

    let cleanup = AttoDryConnector::cleanup(&mut *driver, &config.connection, pacer);
    keep_command_error(result, cleanup)
}

/// The command's own error wins over a failing cleanup.
fn keep_command_error(
    result: Result<(), BoxError>,
    cleanup: Result<(), ConnectorError>,
) -> Result<(), BoxError> {
    match cleanup {
        // The driver is ended even when the disconnect pause is cancelled.
        Ok(()) | Err(ConnectorError::Cancelled(_)) => result,
        Err(e) if result.is_err() => {
            log::error!("Cleanup failed: {}", e);
            result
        }
        Err(e) => Err(e.into()),
    }
}

fn execute<P: Pacer>(
    command: Command,
    driver: &mut (dyn AttoDry + Send),
    session: &mut LogSession,
    pacer: &mut P,
    config: &LoggerConfig,
) -> Result<(), BoxError> {
    match command {
        Command::Log {
            description,
            count,
            interval,
        } => {
            let mut logged = 0;
            while count.is_none_or(|count| logged < count) {
                let row = session.log(&mut *driver, description.as_deref())?;
                logged += 1;
                log::info!("t={}s sample={} K", row.time, row.sample_temperature);
                if count.is_none_or(|count| logged < count) && pacer.pause(interval).is_err() {
                    log::info!("Logging stopped after {} samples", logged);
                    break;
                }
            }
        }
        Command::WaitCold {
            script,
            interpreter,
        } => {
            let runner = match interpreter.or_else(|| config.handoff.interpreter.clone()) {
                Some(interpreter) => ScriptRunner::with_interpreter(interpreter),
                None => ScriptRunner::new(),
            };
            let handed_off = start_when_cold(
                &mut *driver,
                session,
                pacer,
                config.polling.cooldown_interval,
                |_, _| {
                    runner.run(&script)?;
                    Ok(())
                },
            );
            match handed_off {
                Ok(()) => {}
                Err(WaitError::Cancelled(_)) => {
                    log::info!("Cooldown wait stopped, {} not started", script.display());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::WaitStable {
            setpoint,
            tolerance,
            settling,
        } => {
            let criteria = StabilityCriteria::new(setpoint, tolerance, settling)
                .with_poll_interval(config.polling.stability_interval)
                .with_progress_every(config.polling.progress_every);
            match wait_until_stable(&mut *driver, session, pacer, &criteria) {
                Ok(report) => log::info!(
                    "Stable after {} samples and {} resets",
                    report.samples,
                    report.resets
                ),
                Err(WaitError::Cancelled(_)) => log::info!("Stability wait stopped"),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Ports | Command::View { .. } => {}
    }

    if let Some(path) = session.log_file() {
        log::info!("Log written to {}", path.display());
    }
    Ok(())
}
