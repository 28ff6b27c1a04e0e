//! Fan monitor example
//!
//! Connects to a fan and prints every state change until Ctrl-C.
//!
//! Run with: cargo run --example fan_monitor -- <ADDRESS> [POLL_SECONDS]

use lasko_fan_ble::{CommandOutcome, Error, FanDevice, Result};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("warn,lasko_fan_ble=debug")
        .init();

    println!("Fan Monitor");
    println!("===========\n");

    let args: Vec<String> = std::env::args().collect();
    let address = args.get(1).ok_or_else(|| Error::InvalidParameter {
        name: "address".to_string(),
        value: String::new(),
    })?;
    let poll = args
        .get(2)
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30));

    let fan = FanDevice::new(address.to_uppercase());

    fan.register_observer(|state| {
        println!("State: {}", state);
    });

    let mut events = fan.subscribe_connection_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("{}: {}", event.identifier, event.state);
        }
    });

    if fan.connect().await.is_connected() {
        match fan.read_device_info().await {
            Ok(info) => println!("{}\n", info),
            Err(e) => println!("Could not read device information: {}\n", e),
        }
    }

    let mut interval = tokio::time::interval(poll);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if fan.refresh_state().await == CommandOutcome::Lost {
                    println!("Fan unreachable, will try again in {:?}", poll);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    fan.clear_observer();
    fan.disconnect().await;
    Ok(())
}
