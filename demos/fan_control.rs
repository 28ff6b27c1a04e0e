//! Fan control example
//!
//! Sends a single command to a fan and prints the resulting state.
//!
//! Run with: cargo run --example fan_control -- <ADDRESS> <COMMAND> [VALUE]
//!
//! Commands:
//!   on | off
//!   speed off|low|medium|high
//!   direction forward|reverse|mixed
//!   info
//!   state

use lasko_fan_ble::{Direction, Error, FanDevice, FanSpeed, Result};

fn usage() -> Error {
    eprintln!("Usage: fan_control <ADDRESS> <on|off|speed|direction|info|state> [VALUE]");
    Error::InvalidParameter {
        name: "arguments".to_string(),
        value: std::env::args().skip(1).collect::<Vec<_>>().join(" "),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("warn,lasko_fan_ble=info")
        .init();

    let args: Vec<String> = std::env::args().collect();
    let (Some(address), Some(command)) = (args.get(1), args.get(2)) else {
        return Err(usage());
    };
    let value = args.get(3).map(String::as_str);

    let fan = FanDevice::new(address.to_uppercase());

    println!("Connecting to {}...", fan.name());
    if !fan.connect().await.is_connected() {
        println!("Fan not reachable.");
        return Ok(());
    }

    let outcome = match (command.as_str(), value) {
        ("on", _) => Some(fan.turn_on().await),
        ("off", _) => Some(fan.turn_off().await),
        ("speed", Some(speed)) => Some(fan.set_speed(speed.parse::<FanSpeed>()?).await),
        ("direction", Some(direction)) => {
            Some(fan.set_direction(direction.parse::<Direction>()?).await)
        }
        ("info", _) => {
            let info = fan.read_device_info().await?;
            println!("{}", info);
            if !info.is_supported_fan() {
                println!("Warning: manufacturer does not look like a Lasko fan");
            }
            None
        }
        ("state", _) => None,
        _ => {
            fan.disconnect().await;
            return Err(usage());
        }
    };

    if let Some(outcome) = outcome {
        println!("Command outcome: {:?}", outcome);
    }

    // Give the state report a moment to arrive
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    println!("Power:       {}", if fan.power_on() { "on" } else { "off" });
    println!("Speed:       {}", fan.speed());
    println!("Direction:   {}", fan.direction());
    println!("Temperature: {}", fan.temperature());
    if fan.alternate_control() {
        println!("Alternate control active: power cycle the fan to regain app control");
    }

    fan.disconnect().await;
    Ok(())
}
