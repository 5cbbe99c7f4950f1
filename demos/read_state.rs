//! Read and print a thermostat's full temperature state.
//!
//! Run with: cargo run --example read_state -- <address> [pin]

use cometblue_ble::{CometBlue, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (minimal)
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let mut args = std::env::args().skip(1);
    let address = match args.next() {
        Some(address) => address,
        None => {
            eprintln!("Usage: read_state <address> [pin]");
            std::process::exit(1);
        }
    };
    let pin = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    println!("CometBlue State Reader");
    println!("======================\n");
    println!("Connecting to {address}...\n");

    let mut thermostat = CometBlue::new(address, pin).await?;
    thermostat.update().await?;

    if !thermostat.available() {
        println!("The thermostat did not answer. Is the PIN correct?");
        return Ok(());
    }

    if let Some(record) = thermostat.record() {
        println!("Current temperature: {:.1}°C", record.current_temperature.to_celsius());
        println!("Manual setpoint:     {:.1}°C", record.manual_setpoint.to_celsius());
        println!(
            "Schedule bounds:     {:.1}°C to {:.1}°C",
            record.target_low.to_celsius(),
            record.target_high.to_celsius()
        );
        println!("Offset:              {:.1}°C", record.offset.to_celsius());
        println!(
            "Window-open:         sensitivity {}, {} minutes",
            record.window_open_sensitivity, record.window_open_minutes
        );
    }

    Ok(())
}
