//! Watch one Inkbird sensor and print every reading
//!
//! Configure with INKBIRD_MAC (and optionally INKBIRD_NAME, INKBIRD_LAYOUT,
//! INKBIRD_STALE_TIMEOUT_SECS) in the environment or a `.env` file.
//!
//! Run with: cargo run --example watch_sensor

use inkbird_rust_ble::{Result, SensorConfig, SensorMonitor};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("inkbird_rust_ble=debug".parse().unwrap()),
        )
        .init();

    let config = SensorConfig::from_env()?;

    println!("Watching {} ({})", config.name, config.address);
    println!("Layout: {}", config.layout);
    println!("Press Ctrl+C to exit.\n");

    let monitor = SensorMonitor::with_ble(config).await?;

    let _handle = monitor.on_reading(|reading| {
        let temp = reading
            .temperature_celsius()
            .map(|t| format!("{:.1}°C", t))
            .unwrap_or_else(|| "--".to_string());
        let hum = reading
            .humidity_percent()
            .map(|h| format!("{:.1}%", h))
            .unwrap_or_else(|| "--".to_string());
        let batt = reading
            .battery
            .map(|b| format!("{}%", b))
            .unwrap_or_else(|| "--".to_string());

        println!(
            "[{}] temperature {}  humidity {}  battery {}",
            reading.observed_at.format("%H:%M:%S"),
            temp,
            hum,
            batt
        );
    });

    monitor.start().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nExiting...");
                break;
            }
            _ = tokio::time::sleep(Duration::from_secs(30)) => {
                let state = monitor.state();
                if monitor.is_stale() {
                    println!(
                        "Sensor unavailable ({} rejected since last reading)",
                        state.consecutive_rejections
                    );
                } else if let Some(raw) = &state.raw_manufacturer {
                    println!("Last payload: {}", raw);
                }
            }
        }
    }

    monitor.stop().await?;

    Ok(())
}
