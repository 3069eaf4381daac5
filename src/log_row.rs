use polars::prelude::*;

pub const TIME_COLUMN: &str = "Time";
pub const ACTION_MESSAGE_COLUMN: &str = "Action Message";
pub const ERROR_STATUS_COLUMN: &str = "Error Status";

/// Header row of every log file, in column order.
pub const HEADERS: [&str; 15] = [
    TIME_COLUMN,
    "Temperature Setpoint",
    "Sample Temperature",
    "VTI Temperature",
    "Reservoir Temperature",
    "Sample Heater Power",
    "VTI Heater Power",
    "Reservoir Heater Power",
    "Magnet Temperature",
    "Magnetic Field",
    "Dump Pressure",
    "Cryostat In Pressure",
    "Cryostat Out Pressure",
    ACTION_MESSAGE_COLUMN,
    ERROR_STATUS_COLUMN,
];

/// Columns that never make sense on a plot's Y axis.
pub const NON_PLOTTABLE_COLUMNS: [&str; 3] =
    [ERROR_STATUS_COLUMN, ACTION_MESSAGE_COLUMN, TIME_COLUMN];

/// One sample of every logged instrument field.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    /// Seconds since the session started, rounded to 10 ms.
    pub time: f64,
    pub temperature_setpoint: f64,
    pub sample_temperature: f64,
    pub vti_temperature: f64,
    pub reservoir_temperature: f64,
    pub sample_heater_power: f64,
    pub vti_heater_power: f64,
    pub reservoir_heater_power: f64,
    /// Read from the 40K stage sensor.
    pub magnet_temperature: f64,
    pub magnetic_field: f64,
    pub dump_pressure: f64,
    pub cryostat_in_pressure: f64,
    pub cryostat_out_pressure: f64,
    pub action_message: String,
    pub error_status: String,
}

impl LogRow {
    /// Round a session offset in seconds the way it is written to disk.
    pub fn round_time(seconds: f64) -> f64 {
        (seconds * 100.0).round() / 100.0
    }

    fn numeric_values(&self) -> [f64; 13] {
        [
            self.time,
            self.temperature_setpoint,
            self.sample_temperature,
            self.vti_temperature,
            self.reservoir_temperature,
            self.sample_heater_power,
            self.vti_heater_power,
            self.reservoir_heater_power,
            self.magnet_temperature,
            self.magnetic_field,
            self.dump_pressure,
            self.cryostat_in_pressure,
            self.cryostat_out_pressure,
        ]
    }

    /// Single-row frame in header order, ready to be appended to a log file.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = HEADERS
            .iter()
            .zip(self.numeric_values())
            .map(|(name, value)| Series::new((*name).into(), &[value]).into())
            .collect();

        for (name, text) in [
            (ACTION_MESSAGE_COLUMN, &self.action_message),
            (ERROR_STATUS_COLUMN, &self.error_status),
        ] {
            columns.push(Series::new(name.into(), &[text.as_str()]).into());
        }

        DataFrame::new(columns)
    }

    /// Zero-row frame carrying only the header, used to start a new file.
    pub fn header_frame() -> PolarsResult<DataFrame> {
        let columns: Vec<Column> = HEADERS
            .iter()
            .map(|name| {
                let dtype = if [ACTION_MESSAGE_COLUMN, ERROR_STATUS_COLUMN].contains(name) {
                    DataType::String
                } else {
                    DataType::Float64
                };
                Series::new_empty((*name).into(), &dtype).into()
            })
            .collect();

        DataFrame::new(columns)
    }
}
