use crate::status::{HomingStatus, MotorStatus};

/// Homing configuration block. Exactly 15 bytes on the wire; the parser in
/// `zdt-protocol` rejects any other length with `InvalidResponseLength`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HomingParameters {
    pub mode: u8,
    pub direction: u8,
    pub speed_rpm: u16,
    pub timeout_ms: u32,
    pub collision_speed_rpm: u16,
    pub collision_current_ma: u16,
    pub collision_time_ms: u16,
    pub auto_homing: bool,
}

/// Closed-loop PID gains. Firmware sometimes truncates the response to 7
/// bytes; callers get [`PIDParameters::default`] gains for whichever trailing
/// fields were not present on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PIDParameters {
    pub trapezoid_kp: u32,
    pub direct_kp: u32,
    pub speed_kp: u32,
    pub speed_ki: u32,
}

impl Default for PIDParameters {
    fn default() -> Self {
        Self {
            trapezoid_kp: 0,
            direct_kp: 0,
            speed_kp: 0,
            speed_ki: 0,
        }
    }
}

/// Drive configuration block. The firmware exposes this at several response
/// lengths (37, 33, 24, or 7 bytes); fields that a short-form response cannot
/// supply are left `None` rather than reconstructed from a heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct DriveParameters {
    pub control_mode: Option<u8>,
    pub subdivision: Option<u8>,
    pub open_loop_current_ma: Option<u16>,
    pub closed_loop_current_ma: Option<u16>,
    pub max_speed_rpm: Option<u16>,
    pub current_loop_bandwidth_hz: Option<u16>,
    pub serial_baud_index: Option<u8>,
    pub can_baud_index: Option<u8>,
    pub stall_protection_enabled: Option<bool>,
    pub stall_speed_threshold_rpm: Option<u16>,
    pub stall_current_threshold_ma: Option<u16>,
    pub stall_time_ms: Option<u16>,
    pub arrival_window_pulses: Option<u16>,
    /// Raw trailing bytes from a short-form response that carry real
    /// configuration but whose field boundaries this decoder does not
    /// confidently know. Present only on truncated (7/24-byte) responses.
    pub unknown_tail: Option<Vec<u8>>,
}

/// Parsed `read_version` response (FC 0x1F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct VersionInfo {
    pub firmware_major: u8,
    pub firmware_minor: u8,
    pub hardware_major: u8,
    pub hardware_minor: u8,
}

/// Parsed `read_resistance_inductance` response (FC 0x20).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ResistanceInductance {
    pub resistance_ohms: f64,
    pub inductance_mh: f64,
}

/// Aggregate snapshot from `read_system_status` (FC 0x43). The firmware may
/// return a fully framed payload or a simplified 7-byte form carrying only
/// the two status bytes plus a handful of scalars; fields the short form
/// cannot supply are left `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct SystemStatus {
    pub bus_voltage_v: Option<f64>,
    pub bus_current_a: Option<f64>,
    pub phase_current_a: Option<f64>,
    pub encoder_raw: Option<u16>,
    pub encoder_calibrated: Option<u16>,
    pub target_position_deg: Option<f64>,
    pub realtime_speed_rpm: Option<f64>,
    pub realtime_position_deg: Option<f64>,
    pub position_error_deg: Option<f64>,
    pub temperature_c: Option<i16>,
    pub homing_status: Option<HomingStatus>,
    pub motor_status: Option<MotorStatus>,
}
