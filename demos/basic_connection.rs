// Basic connection and logging example
//
// This example connects to a simulated AttoDRY, logs a handful of samples and
// closes the device session again.

use attodry_logger::{AttoDryConnector, LogSession, LoggerConfig, SimulatedAttoDry, WallPacer};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (optional)
    env_logger::init();

    println!("AttoDRY Connection Example");
    println!("==========================\n");

    // Method 1: List the serial ports the real device could be on
    println!("1. Serial ports on this host:");
    let ports = AttoDryConnector::available_ports()?;
    if ports.is_empty() {
        println!("  (none)");
    }
    for (i, port) in ports.iter().enumerate() {
        println!("  {}. {}", i + 1, port);
    }
    println!();

    // Method 2: Connect to the simulated device
    println!("2. Connecting...");
    let mut config = LoggerConfig::load(None)?;
    config.connection.settle = Duration::from_millis(200);
    config.connection.check_port = false;

    let mut device = SimulatedAttoDry::new().with_user_temperature(4.0);
    let mut pacer = WallPacer::default();
    let status = AttoDryConnector::connect(&mut device, &config.connection, &mut pacer)?;
    if !status.is_ready() {
        println!("Device did not come up: {:?}", status);
        return Ok(());
    }
    println!("Successfully connected!\n");

    // Method 3: Log a few samples into a scratch folder
    println!("3. Logging samples...");
    let base_dir = std::env::temp_dir().join("attodry-demo");
    let mut session = LogSession::new(&base_dir);
    for _ in 0..5 {
        let row = session.log(&mut device, Some("Demo"))?;
        println!("  t={:>5.2}s  sample={:>7.2} K", row.time, row.sample_temperature);
        std::thread::sleep(Duration::from_millis(250));
    }
    if let Some(path) = session.log_file() {
        println!("Log written to {}", path.display());
    }

    // Method 4: Close the session
    println!("\n4. Disconnecting...");
    AttoDryConnector::cleanup(&mut device, &config.connection, &mut pacer)?;
    println!("Connection test completed successfully!");

    Ok(())
}
