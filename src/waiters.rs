//! Polling loops that block until the cryostat reaches a state.
//!
//! Both loops log one row per iteration through the caller's [`LogSession`]
//! and pace themselves through a [`Pacer`], so they can be cancelled from
//! another thread and driven by simulated time in tests.

use std::time::Duration;

use crate::driver::{AttoDry, AttoDryError};
use crate::pacing::{Cancelled, Pacer};
use crate::script::ScriptError;
use crate::session::{LogSession, LogSessionError};

pub const COOLDOWN_DESCRIPTION: &str = "Cooldown";
pub const STABILITY_DESCRIPTION: &str = "RampingtoTempSetpoint";

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("Instrument read failed: {0}")]
    Driver(#[from] AttoDryError),

    #[error("Logging failed: {0}")]
    Log(#[from] LogSessionError),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Log every `interval` for as long as the device is going to base temperature.
///
/// Returns the number of rows logged while waiting.
pub fn wait_for_cooldown<D, P>(
    driver: &mut D,
    session: &mut LogSession,
    pacer: &mut P,
    interval: Duration,
) -> Result<usize, WaitError>
where
    D: AttoDry + ?Sized,
    P: Pacer + ?Sized,
{
    let _span = tracing::info_span!("cooldown", interval_s = interval.as_secs_f64()).entered();
    log::info!("Monitoring cooldown process...");

    let mut logged = 0;
    while driver.is_going_to_base_temperature()? {
        session.log(driver, Some(COOLDOWN_DESCRIPTION))?;
        logged += 1;
        pacer.pause(interval)?;
    }

    log::info!("Cooldown complete after {} polls", logged);
    Ok(logged)
}

/// Wait for the cooldown to finish, then hand the device over to `handoff`.
pub fn start_when_cold<D, P, F, T>(
    driver: &mut D,
    session: &mut LogSession,
    pacer: &mut P,
    interval: Duration,
    handoff: F,
) -> Result<T, WaitError>
where
    D: AttoDry + ?Sized,
    P: Pacer + ?Sized,
    F: FnOnce(&mut D, &mut LogSession) -> Result<T, WaitError>,
{
    wait_for_cooldown(driver, session, pacer, interval)?;
    handoff(driver, session)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityCriteria {
    /// Target sample temperature in kelvin.
    pub setpoint: f64,
    /// Allowed deviation from the setpoint in kelvin, inclusive.
    pub tolerance: f64,
    /// How long the temperature has to stay in band.
    pub settling: Duration,
    pub poll_interval: Duration,
    /// Period of the "current temperature" progress message.
    pub progress_every: Duration,
}

impl StabilityCriteria {
    pub fn new(setpoint: f64, tolerance: f64, settling: Duration) -> Self {
        Self {
            setpoint,
            tolerance,
            settling,
            poll_interval: Duration::from_secs(1),
            progress_every: Duration::from_secs(1000),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_progress_every(mut self, progress_every: Duration) -> Self {
        self.progress_every = progress_every;
        self
    }

    pub fn is_within(&self, temperature: f64) -> bool {
        (temperature - self.setpoint).abs() <= self.tolerance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StabilityReport {
    pub samples: usize,
    /// How often a drift out of band restarted the settling clock.
    pub resets: usize,
    pub last_temperature: Option<f64>,
    /// Pacer time at which the temperature counted as settled.
    pub settled_at: Duration,
    /// Number of "current temperature" messages emitted.
    pub progress_reports: usize,
}

/// Block until the sample temperature stayed within tolerance for the settling time.
///
/// Each iteration logs a row and checks the sample temperature of that row.
/// Any sample out of band restarts the settling clock.
pub fn wait_until_stable<D, P>(
    driver: &mut D,
    session: &mut LogSession,
    pacer: &mut P,
    criteria: &StabilityCriteria,
) -> Result<StabilityReport, WaitError>
where
    D: AttoDry + ?Sized,
    P: Pacer + ?Sized,
{
    let _span = tracing::info_span!(
        "stability",
        setpoint = criteria.setpoint,
        tolerance = criteria.tolerance,
        settling_s = criteria.settling.as_secs_f64()
    )
    .entered();

    let mut report = StabilityReport {
        samples: 0,
        resets: 0,
        last_temperature: None,
        settled_at: Duration::ZERO,
        progress_reports: 0,
    };
    let mut settle_start = pacer.now();
    let mut next_progress = settle_start + criteria.progress_every;

    while pacer.now().saturating_sub(settle_start) < criteria.settling {
        let row = session.log(driver, Some(STABILITY_DESCRIPTION))?;
        let temperature = row.sample_temperature;
        report.samples += 1;
        report.last_temperature = Some(temperature);

        if !criteria.is_within(temperature) {
            settle_start = pacer.now();
            report.resets += 1;
            log::debug!(
                "Sample temperature {} K outside {} ± {} K, restarting settling clock",
                temperature,
                criteria.setpoint,
                criteria.tolerance
            );
        }

        pacer.pause(criteria.poll_interval)?;

        if pacer.now() >= next_progress {
            log::info!("Current temperature is {} K", temperature);
            report.progress_reports += 1;
            next_progress += criteria.progress_every;
        }
    }

    report.settled_at = pacer.now();
    log::info!(
        "Temperature stable at {} K after {:?}",
        criteria.setpoint,
        report.settled_at
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::VirtualPacer;
    use crate::simulated::SimulatedAttoDry;
    use std::fs;

    fn rows_in(session: &LogSession) -> usize {
        session
            .log_file()
            .map_or(0, |path| fs::read_to_string(path).unwrap().lines().count() - 1)
    }

    #[test]
    fn test_cooldown_logs_once_per_poll() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new(dir.path());
        let mut device = SimulatedAttoDry::connected().with_cooldown_polls(4);
        let mut pacer = VirtualPacer::new();

        let logged =
            wait_for_cooldown(&mut device, &mut session, &mut pacer, Duration::from_secs(5)).unwrap();

        assert_eq!(logged, 4);
        assert_eq!(rows_in(&session), 4);
        assert_eq!(pacer.now(), Duration::from_secs(20));
        assert!(session
            .log_file()
            .unwrap()
            .to_string_lossy()
            .contains("_Cooldown"));
    }

    #[test]
    fn test_already_cold_hands_off_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new(dir.path());
        let mut device = SimulatedAttoDry::connected();
        let mut pacer = VirtualPacer::new();

        let logged_before = start_when_cold(
            &mut device,
            &mut session,
            &mut pacer,
            Duration::from_secs(5),
            |_, session| Ok(session.is_initialized()),
        )
        .unwrap();

        assert!(!logged_before);
        assert_eq!(pacer.pauses(), 0);
    }

    #[test]
    fn test_handoff_runs_after_last_poll() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new(dir.path());
        let mut device = SimulatedAttoDry::connected().with_cooldown_polls(3);
        let mut pacer = VirtualPacer::new();

        let rows_at_handoff = start_when_cold(
            &mut device,
            &mut session,
            &mut pacer,
            Duration::from_secs(5),
            |device, session| {
                assert!(!device.is_going_to_base_temperature()?);
                Ok(rows_in(session))
            },
        )
        .unwrap();

        assert_eq!(rows_at_handoff, 3);
    }

    #[test]
    fn test_cooldown_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new(dir.path());
        let mut device = SimulatedAttoDry::connected().with_cooldown_polls(100);
        let mut pacer = VirtualPacer::new().cancel_after(2);

        let result = wait_for_cooldown(&mut device, &mut session, &mut pacer, Duration::from_secs(5));
        assert!(matches!(result, Err(WaitError::Cancelled(Cancelled))));
        assert_eq!(rows_in(&session), 3);
    }

    #[test]
    fn test_stable_sequence_settles_after_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new(dir.path());
        let mut device = SimulatedAttoDry::connected().with_sample_temperatures([4.0, 4.05, 3.95]);
        let mut pacer = VirtualPacer::new();
        let criteria = StabilityCriteria::new(4.0, 0.1, Duration::from_secs(5));

        let report = wait_until_stable(&mut device, &mut session, &mut pacer, &criteria).unwrap();

        assert_eq!(report.samples, 5);
        assert_eq!(report.resets, 0);
        assert_eq!(report.settled_at, Duration::from_secs(5));
        assert_eq!(report.progress_reports, 0);
        assert_eq!(rows_in(&session), 5);
    }

    #[test]
    fn test_progress_reported_every_period() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new(dir.path());
        let mut device = SimulatedAttoDry::connected().with_sample_temperatures([4.0]);
        let mut pacer = VirtualPacer::new();
        let criteria = StabilityCriteria::new(4.0, 0.1, Duration::from_secs(5))
            .with_progress_every(Duration::from_secs(2));

        let report = wait_until_stable(&mut device, &mut session, &mut pacer, &criteria).unwrap();

        // At t = 2 s and t = 4 s.
        assert_eq!(report.progress_reports, 2);
        assert_eq!(report.settled_at, Duration::from_secs(5));
    }

    #[test]
    fn test_drift_restarts_settling_clock() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new(dir.path());
        // Fourth sample (t = 3 s) is out of band.
        let mut device =
            SimulatedAttoDry::connected().with_sample_temperatures([4.0, 4.0, 4.0, 4.5, 4.0]);
        let mut pacer = VirtualPacer::new();
        let criteria = StabilityCriteria::new(4.0, 0.1, Duration::from_secs(5));

        let report = wait_until_stable(&mut device, &mut session, &mut pacer, &criteria).unwrap();

        assert_eq!(report.resets, 1);
        assert_eq!(report.settled_at, Duration::from_secs(3) + criteria.settling);
        assert_eq!(report.samples, 8);
        assert_eq!(report.last_temperature, Some(4.0));
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let criteria = StabilityCriteria::new(10.0, 0.5, Duration::from_secs(1));
        assert!(criteria.is_within(10.5));
        assert!(criteria.is_within(9.5));
        assert!(!criteria.is_within(10.51));
    }

    #[test]
    fn test_stability_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new(dir.path());
        let mut device = SimulatedAttoDry::connected().with_sample_temperatures([50.0]);
        let mut pacer = VirtualPacer::new().cancel_after(10);
        let criteria = StabilityCriteria::new(4.0, 0.1, Duration::from_secs(5));

        let result = wait_until_stable(&mut device, &mut session, &mut pacer, &criteria);
        assert!(matches!(result, Err(WaitError::Cancelled(_))));
    }
}
