//! Shared data model, wire scaling helpers, and error taxonomy for the ZDT
//! closed-loop stepper stack.
//!
//! This crate has no transport or concurrency concerns: it only knows how to
//! represent and scale the values that flow across the wire.

mod config;
mod error;
mod params;
mod scale;
mod status;

pub use config::{ArmConfig, AxisConfig, BusConfig};
pub use error::{ConditionNotMet, Error};
pub use params::{DriveParameters, HomingParameters, PIDParameters, ResistanceInductance, SystemStatus, VersionInfo};
pub use scale::{
    degree_to_motor_position, encoder_calibrated_to_degree, encoder_raw_to_degree,
    motor_position_error_to_degree, motor_position_to_degree, motor_speed_to_rpm,
    rpm_to_motor_speed, validate_acceleration, validate_current, validate_motor_id,
    validate_position, validate_speed, Direction,
};
pub use status::{HomingStatus, MotorStatus};

/// Protocol-fixed trailing byte. Not a checksum: every observed response and
/// command ends with this constant regardless of payload.
pub const FRAME_TAIL: u8 = 0x6B;

/// Reserved motor id addressing every controller on the bus at once.
pub const BROADCAST_MOTOR_ID: u8 = 0;

/// Default CAN bitrate selected by the `S6` SLCAN command.
pub const DEFAULT_BAUD: u32 = 500_000;

/// Default time to wait for a matching response frame.
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000;
