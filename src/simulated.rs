//! In-memory AttoDRY used by the tests and the `--simulate` mode of the binary.
//!
//! The simulated cryostat starts warm and relaxes its sample temperature toward
//! the user setpoint on every read. Scripted temperature sequences and a fixed
//! number of "going to base temperature" polls make the wait helpers
//! deterministic.

use std::collections::VecDeque;

use crate::driver::{AttoDry, AttoDryError};

const ROOM_TEMPERATURE: f64 = 295.0;
const BASE_TEMPERATURE: f64 = 1.8;
const RELAXATION: f64 = 0.85;

#[derive(Debug, Clone)]
pub struct SimulatedAttoDry {
    setup_version: Option<u16>,
    port: Option<String>,
    refuse_connection: bool,
    cooldown_polls: usize,
    scripted_temperatures: VecDeque<f64>,
    user_temperature: f64,
    sample_temperature: f64,
    magnetic_field: f64,
    reads: usize,
}

impl Default for SimulatedAttoDry {
    fn default() -> Self {
        Self {
            setup_version: None,
            port: None,
            refuse_connection: false,
            cooldown_polls: 0,
            scripted_temperatures: VecDeque::new(),
            user_temperature: BASE_TEMPERATURE,
            sample_temperature: ROOM_TEMPERATURE,
            magnetic_field: 0.0,
            reads: 0,
        }
    }
}

impl SimulatedAttoDry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that has already been started and connected on `SIM`.
    pub fn connected() -> Self {
        Self {
            setup_version: Some(1),
            port: Some("SIM".to_string()),
            ..Self::default()
        }
    }

    /// Report "going to base temperature" for the next `polls` queries.
    pub fn with_cooldown_polls(mut self, polls: usize) -> Self {
        self.cooldown_polls = polls;
        self
    }

    /// Sample temperatures returned in order; the last one repeats.
    pub fn with_sample_temperatures(mut self, temperatures: impl IntoIterator<Item = f64>) -> Self {
        self.scripted_temperatures = temperatures.into_iter().collect();
        self
    }

    pub fn with_user_temperature(mut self, kelvin: f64) -> Self {
        self.user_temperature = kelvin;
        self
    }

    pub fn with_magnetic_field(mut self, tesla: f64) -> Self {
        self.magnetic_field = tesla;
        self
    }

    /// Accept `connect` calls but never report the link as up.
    pub fn refusing_connection(mut self) -> Self {
        self.refuse_connection = true;
        self
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.setup_version.is_some()
    }

    /// Number of sample temperature reads served so far.
    pub fn sample_reads(&self) -> usize {
        self.reads
    }

    fn ensure_connected(&self) -> Result<(), AttoDryError> {
        if self.port.is_some() && !self.refuse_connection {
            Ok(())
        } else {
            Err(AttoDryError::NotConnected)
        }
    }

    fn next_sample_temperature(&mut self) -> f64 {
        self.reads += 1;
        if let Some(next) = self.scripted_temperatures.pop_front() {
            self.sample_temperature = next;
            if self.scripted_temperatures.is_empty() {
                self.scripted_temperatures.push_back(next);
            }
        } else {
            self.sample_temperature = self.user_temperature
                + (self.sample_temperature - self.user_temperature) * RELAXATION;
        }
        self.sample_temperature
    }
}

impl AttoDry for SimulatedAttoDry {
    fn begin(&mut self, setup_version: u16) -> Result<(), AttoDryError> {
        log::debug!("Simulated AttoDRY started with setup version {}", setup_version);
        self.setup_version = Some(setup_version);
        Ok(())
    }

    fn connect(&mut self, com_port: &str) -> Result<(), AttoDryError> {
        if self.setup_version.is_none() {
            return Err(AttoDryError::CallFailed {
                call: "connect",
                status: -1,
            });
        }
        self.port = Some(com_port.to_string());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), AttoDryError> {
        self.port = None;
        Ok(())
    }

    fn end(&mut self) -> Result<(), AttoDryError> {
        self.setup_version = None;
        Ok(())
    }

    fn is_device_initialised(&mut self) -> Result<bool, AttoDryError> {
        Ok(self.setup_version.is_some())
    }

    fn is_device_connected(&mut self) -> Result<bool, AttoDryError> {
        Ok(self.ensure_connected().is_ok())
    }

    fn is_going_to_base_temperature(&mut self) -> Result<bool, AttoDryError> {
        self.ensure_connected()?;
        if self.cooldown_polls == 0 {
            return Ok(false);
        }
        self.cooldown_polls -= 1;
        Ok(true)
    }

    fn user_temperature(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(self.user_temperature)
    }

    fn sample_temperature(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(self.next_sample_temperature())
    }

    fn vti_temperature(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(self.sample_temperature * 0.97)
    }

    fn reservoir_temperature(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(self.sample_temperature.min(4.2))
    }

    fn sample_heater_power(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(if self.sample_temperature < self.user_temperature { 0.05 } else { 0.0 })
    }

    fn vti_heater_power(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(0.0)
    }

    fn reservoir_heater_power(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(0.0)
    }

    fn stage_40k_temperature(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(self.sample_temperature.max(38.0))
    }

    fn magnetic_field(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(self.magnetic_field)
    }

    fn dump_pressure(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(820.0)
    }

    fn cryostat_in_pressure(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(14.5)
    }

    fn cryostat_out_pressure(&mut self) -> Result<f64, AttoDryError> {
        self.ensure_connected()?;
        Ok(13.9)
    }

    fn action_message(&mut self) -> Result<String, AttoDryError> {
        self.ensure_connected()?;
        let message = if self.cooldown_polls > 0 {
            "Going to base temperature"
        } else {
            "Idle"
        };
        Ok(message.to_string())
    }

    fn error_status(&mut self) -> Result<String, AttoDryError> {
        self.ensure_connected()?;
        Ok("No Error".to_string())
    }
}
