//! Stage a new manual setpoint and flush it to the device.
//!
//! Run with: cargo run --example set_target -- <address> <temperature> [pin]

use cometblue_ble::{CometBlue, Result, MAX_TARGET_TEMPERATURE, MIN_TARGET_TEMPERATURE};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (minimal)
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let mut args = std::env::args().skip(1);
    let (address, temperature) = match (args.next(), args.next().and_then(|s| s.parse().ok())) {
        (Some(address), Some(temperature)) => (address, temperature),
        _ => {
            eprintln!("Usage: set_target <address> <temperature> [pin]");
            std::process::exit(1);
        }
    };
    let pin = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    // The operational range is caller policy, so enforce it here.
    if !(MIN_TARGET_TEMPERATURE..=MAX_TARGET_TEMPERATURE).contains(&temperature) {
        eprintln!(
            "Temperature {temperature} is outside the device range \
             ({MIN_TARGET_TEMPERATURE} to {MAX_TARGET_TEMPERATURE})"
        );
        std::process::exit(1);
    }

    println!("Setting {address} to {temperature}°C...");

    let mut thermostat = CometBlue::new(address, pin).await?;
    thermostat.set_target_temperature(temperature);
    thermostat.update().await?;

    if thermostat.pending_target_temperature().is_some() {
        println!("The write did not go through; it will be retried on the next update.");
    } else if let Some(target) = thermostat.target_temperature() {
        println!("Setpoint is now {target:.1}°C");
    }

    Ok(())
}
