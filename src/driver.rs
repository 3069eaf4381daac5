use crate::log_row::LogRow;

#[derive(Debug, thiserror::Error)]
pub enum AttoDryError {
    #[error("Device is not connected")]
    NotConnected,

    #[error("Driver call {call} failed with status {status}")]
    CallFailed { call: &'static str, status: i32 },

    #[error("Port {port} could not be opened")]
    PortUnavailable { port: String },
}

/// The subset of the AttoDRY vendor interface used by this crate.
///
/// Implementations wrap whatever binding talks to the controller. Every call
/// may fail; callers propagate those failures instead of retrying.
pub trait AttoDry {
    /// Start the driver for the given setup version (1 = AttoDRY2100).
    fn begin(&mut self, setup_version: u16) -> Result<(), AttoDryError>;
    fn connect(&mut self, com_port: &str) -> Result<(), AttoDryError>;
    fn disconnect(&mut self) -> Result<(), AttoDryError>;
    fn end(&mut self) -> Result<(), AttoDryError>;

    fn is_device_initialised(&mut self) -> Result<bool, AttoDryError>;
    fn is_device_connected(&mut self) -> Result<bool, AttoDryError>;
    fn is_going_to_base_temperature(&mut self) -> Result<bool, AttoDryError>;

    fn user_temperature(&mut self) -> Result<f64, AttoDryError>;
    fn sample_temperature(&mut self) -> Result<f64, AttoDryError>;
    fn vti_temperature(&mut self) -> Result<f64, AttoDryError>;
    fn reservoir_temperature(&mut self) -> Result<f64, AttoDryError>;
    fn sample_heater_power(&mut self) -> Result<f64, AttoDryError>;
    fn vti_heater_power(&mut self) -> Result<f64, AttoDryError>;
    fn reservoir_heater_power(&mut self) -> Result<f64, AttoDryError>;
    fn stage_40k_temperature(&mut self) -> Result<f64, AttoDryError>;
    fn magnetic_field(&mut self) -> Result<f64, AttoDryError>;
    fn dump_pressure(&mut self) -> Result<f64, AttoDryError>;
    fn cryostat_in_pressure(&mut self) -> Result<f64, AttoDryError>;
    fn cryostat_out_pressure(&mut self) -> Result<f64, AttoDryError>;
    fn action_message(&mut self) -> Result<String, AttoDryError>;
    fn error_status(&mut self) -> Result<String, AttoDryError>;

    /// Read every logged field, stamped with the given session offset.
    fn snapshot(&mut self, time: f64) -> Result<LogRow, AttoDryError> {
        Ok(LogRow {
            time,
            temperature_setpoint: self.user_temperature()?,
            sample_temperature: self.sample_temperature()?,
            vti_temperature: self.vti_temperature()?,
            reservoir_temperature: self.reservoir_temperature()?,
            sample_heater_power: self.sample_heater_power()?,
            vti_heater_power: self.vti_heater_power()?,
            reservoir_heater_power: self.reservoir_heater_power()?,
            magnet_temperature: self.stage_40k_temperature()?,
            magnetic_field: self.magnetic_field()?,
            dump_pressure: self.dump_pressure()?,
            cryostat_in_pressure: self.cryostat_in_pressure()?,
            cryostat_out_pressure: self.cryostat_out_pressure()?,
            action_message: self.action_message()?,
            error_status: self.error_status()?,
        })
    }
}
