use crate::config::ConnectionConfig;
use crate::driver::{AttoDry, AttoDryError};
use crate::pacing::{Cancelled, Pacer};

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Driver error: {0}")]
    Driver(#[from] AttoDryError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Device state flags read back after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub initialised: bool,
    pub connected: bool,
}

impl ConnectionStatus {
    pub fn is_ready(&self) -> bool {
        self.initialised && self.connected
    }
}

pub struct AttoDryConnector;

impl AttoDryConnector {
    /// Names of the serial ports present on this host.
    pub fn available_ports() -> Result<Vec<String>, serialport::Error> {
        Ok(serialport::available_ports()?
            .into_iter()
            .map(|port| port.port_name)
            .collect())
    }

    /// Warn when the configured port is not among the host's serial ports.
    ///
    /// Only advisory: the vendor driver may reach the device in other ways.
    fn check_port(port: &str) -> bool {
        match Self::available_ports() {
            Ok(ports) if ports.iter().any(|p| p == port) => true,
            Ok(ports) => {
                log::warn!("Port {} not found, available ports: {:?}", port, ports);
                false
            }
            Err(e) => {
                log::warn!("Could not enumerate serial ports: {}", e);
                false
            }
        }
    }

    /// Start the driver, open the port and report whether the device came up.
    ///
    /// A device that is not ready is logged but not treated as an error; only
    /// failing driver calls are.
    pub fn connect<D, P>(
        driver: &mut D,
        config: &ConnectionConfig,
        pacer: &mut P,
    ) -> Result<ConnectionStatus, ConnectorError>
    where
        D: AttoDry + ?Sized,
        P: Pacer + ?Sized,
    {
        log::info!("Connecting to the AttoDRY on {}...", config.com_port);
        if config.check_port {
            Self::check_port(&config.com_port);
        }

        driver.begin(config.setup_version)?;
        driver.connect(&config.com_port)?;

        log::debug!("Waiting {:?} for the device to settle", config.settle);
        pacer.pause(config.settle)?;

        let status = ConnectionStatus {
            initialised: driver.is_device_initialised()?,
            connected: driver.is_device_connected()?,
        };

        if status.is_ready() {
            log::info!("The AttoDRY device is initialized and connected");
        } else {
            log::warn!("Something went wrong: {:?}", status);
        }
        Ok(status)
    }

    /// Close this session's connection to the device.
    ///
    /// The driver is always ended, even if the settle pause was cancelled.
    pub fn cleanup<D, P>(
        driver: &mut D,
        config: &ConnectionConfig,
        pacer: &mut P,
    ) -> Result<(), ConnectorError>
    where
        D: AttoDry + ?Sized,
        P: Pacer + ?Sized,
    {
        driver.disconnect()?;
        let paused = pacer.pause(config.disconnect_settle);
        driver.end()?;
        log::info!("Disconnected.");
        paused?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::VirtualPacer;
    use crate::simulated::SimulatedAttoDry;
    use std::time::Duration;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            check_port: false,
            ..ConnectionConfig::default()
        }
    }

    #[test]
    fn test_connect_waits_then_checks_flags() {
        let mut device = SimulatedAttoDry::new();
        let mut pacer = VirtualPacer::new();

        let status = AttoDryConnector::connect(&mut device, &config(), &mut pacer).unwrap();

        assert!(status.is_ready());
        assert_eq!(device.port(), Some("COM4"));
        assert_eq!(pacer.now(), Duration::from_secs(10));
    }

    #[test]
    fn test_not_ready_is_advisory() {
        let mut device = SimulatedAttoDry::new().refusing_connection();
        let mut pacer = VirtualPacer::new();

        let status = AttoDryConnector::connect(&mut device, &config(), &mut pacer).unwrap();

        assert_eq!(
            status,
            ConnectionStatus {
                initialised: true,
                connected: false
            }
        );
        assert!(!status.is_ready());
    }

    #[test]
    fn test_cleanup_closes_session() {
        let mut device = SimulatedAttoDry::connected();
        let mut pacer = VirtualPacer::new();

        AttoDryConnector::cleanup(&mut device, &config(), &mut pacer).unwrap();

        assert_eq!(device.port(), None);
        assert!(!device.is_started());
        assert_eq!(pacer.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_cancelled_cleanup_still_ends_driver() {
        let mut device = SimulatedAttoDry::connected();
        let mut pacer = VirtualPacer::new().cancel_after(0);

        let result = AttoDryConnector::cleanup(&mut device, &config(), &mut pacer);

        assert!(matches!(result, Err(ConnectorError::Cancelled(_))));
        assert!(!device.is_started());
    }
}
