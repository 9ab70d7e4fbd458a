//! zdt-cli — command-line tool for bring-up and diagnostics against a ZDT
//! CAN bus. A debugging collaborator, not part of the core's public
//! contract: it talks to the bus through the same `MotorController` API
//! any other caller would use.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use zdt_bus::BusKey;
use zdt_motor::MotorController;
use zdt_types::{DEFAULT_BAUD, DEFAULT_TIMEOUT_MS};

#[derive(Parser)]
#[command(name = "zdt-cli", about = "ZDT CAN bus debugging interface")]
struct Args {
    /// Serial device the SLCAN gateway is attached to (e.g. /dev/ttyUSB0).
    #[arg(short, long)]
    port: String,

    /// CAN bitrate selected at gateway init.
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Response timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe motor ids 1..=max for a response, reporting which answer.
    Scan {
        /// Highest motor id to probe.
        #[arg(long, default_value_t = 6)]
        max_id: u8,
    },
    /// Enable or disable a motor.
    Enable {
        motor_id: u8,
        #[arg(long)]
        off: bool,
    },
    /// Send immediate_stop to a motor.
    Stop { motor_id: u8 },
    /// Issue a speed-mode move.
    Speed {
        motor_id: u8,
        rpm: f64,
        #[arg(long, default_value_t = 500)]
        accel: u16,
    },
    /// Issue a trapezoid-profile absolute position move.
    MoveTo {
        motor_id: u8,
        degrees: f64,
        #[arg(long, default_value_t = 500.0)]
        speed_rpm: f64,
        #[arg(long, default_value_t = 1000)]
        accel: u16,
        #[arg(long, default_value_t = 1000)]
        decel: u16,
    },
    /// Dump a motor's parsed status as JSON.
    Status { motor_id: u8 },
    /// Dump a motor's homing status as JSON.
    HomingStatus { motor_id: u8 },
    /// Dump a motor's current position, speed, and temperature as JSON.
    Telemetry { motor_id: u8 },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("zdt_cli=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let bus_key = BusKey::new(args.port.clone(), args.baud);
    let timeout = Duration::from_millis(args.timeout_ms);

    match args.command {
        Commands::Scan { max_id } => scan(&bus_key, timeout, max_id),
        Commands::Enable { motor_id, off } => {
            let mut motor = connect(motor_id, &bus_key, timeout)?;
            motor.enable(!off)?;
            println!("motor {motor_id}: {}", if off { "disabled" } else { "enabled" });
            Ok(())
        }
        Commands::Stop { motor_id } => {
            let mut motor = connect(motor_id, &bus_key, timeout)?;
            motor.stop(false)?;
            println!("motor {motor_id}: stopped");
            Ok(())
        }
        Commands::Speed { motor_id, rpm, accel } => {
            let mut motor = connect(motor_id, &bus_key, timeout)?;
            motor.set_speed(rpm, accel, false)?;
            println!("motor {motor_id}: speed set to {rpm} RPM");
            Ok(())
        }
        Commands::MoveTo { motor_id, degrees, speed_rpm, accel, decel } => {
            let mut motor = connect(motor_id, &bus_key, timeout)?;
            motor.move_to_position_trapezoid(degrees, speed_rpm, accel, decel, true, false)?;
            println!("motor {motor_id}: moving to {degrees} deg");
            Ok(())
        }
        Commands::Status { motor_id } => {
            let mut motor = connect(motor_id, &bus_key, timeout)?;
            let status = motor.read_motor_status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Commands::HomingStatus { motor_id } => {
            let mut motor = connect(motor_id, &bus_key, timeout)?;
            let status = motor.read_homing_status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Commands::Telemetry { motor_id } => {
            let mut motor = connect(motor_id, &bus_key, timeout)?;
            let position = motor.read_realtime_target_position()?;
            let speed = motor.read_speed()?;
            let temperature = motor.read_temperature()?;
            println!(
                "{}",
                serde_json::json!({
                    "motor_id": motor_id,
                    "position_deg": position,
                    "speed_rpm": speed,
                    "temperature_c": temperature,
                })
            );
            Ok(())
        }
    }
}

fn connect(motor_id: u8, bus_key: &BusKey, timeout: Duration) -> Result<MotorController> {
    let mut motor = MotorController::new(motor_id, bus_key.clone(), timeout)
        .with_context(|| format!("constructing session for motor {motor_id}"))?;
    motor
        .connect(Duration::from_secs(2))
        .with_context(|| format!("connecting to {} for motor {motor_id}", bus_key.port))?;
    Ok(motor)
}

/// Probes motor ids `1..=max_id` by reading motor status; any id that
/// responds without a transport-level error is reported present. This is
/// a best-effort bring-up helper, not device discovery (out of scope for
/// the core itself).
fn scan(bus_key: &BusKey, timeout: Duration, max_id: u8) -> Result<()> {
    let mut found = Vec::new();
    for motor_id in 1..=max_id {
        let mut motor = connect(motor_id, bus_key, timeout)?;
        match motor.read_motor_status() {
            Ok(status) => {
                println!("motor {motor_id}: present ({status:?})");
                found.push(motor_id);
            }
            Err(zdt_types::Error::Timeout) => {
                tracing::debug!(motor_id, "no response");
            }
            Err(e) => {
                tracing::warn!(motor_id, error = %e, "unexpected error while scanning");
            }
        }
        motor.disconnect();
    }
    println!("found {} of {} probed ids", found.len(), max_id);
    Ok(())
}
