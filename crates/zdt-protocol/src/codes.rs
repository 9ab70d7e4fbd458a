//! Function and auxiliary code constants for the ZDT command set.

pub mod fc {
    pub const MOTOR_ENABLE: u8 = 0xF3;
    pub const TORQUE_MODE: u8 = 0xF5;
    pub const SPEED_MODE: u8 = 0xF6;
    pub const POSITION_DIRECT: u8 = 0xFB;
    pub const POSITION_TRAPEZOID: u8 = 0xFD;
    pub const IMMEDIATE_STOP: u8 = 0xFE;
    pub const SYNC_TRIGGER: u8 = 0xFF;
    pub const SET_ZERO: u8 = 0x93;
    pub const TRIGGER_HOMING: u8 = 0x9A;
    pub const FORCE_STOP_HOMING: u8 = 0x9C;
    pub const MODIFY_HOMING_PARAMS: u8 = 0x4C;
    pub const MODIFY_DRIVE_PARAMS: u8 = 0x48;
    pub const MODIFY_MOTOR_ID: u8 = 0xAE;
    pub const Y_BOARD_AGGREGATE: u8 = 0xAA;
    pub const TRIGGER_ENCODER_CALIBRATION: u8 = 0x06;
    pub const CLEAR_POSITION: u8 = 0x0A;
    pub const RELEASE_STALL_PROTECTION: u8 = 0x0E;
    pub const FACTORY_RESET: u8 = 0x0F;

    pub const READ_VERSION: u8 = 0x1F;
    pub const READ_RESISTANCE_INDUCTANCE: u8 = 0x20;
    pub const READ_PID_PARAMETERS: u8 = 0x21;
    pub const READ_HOMING_PARAMETERS: u8 = 0x24;
    pub const READ_HOMING_STATUS: u8 = 0x26;
    pub const READ_MOTOR_STATUS: u8 = 0x27;
    pub const READ_ENCODER_RAW: u8 = 0x29;
    pub const READ_ENCODER_CALIBRATED: u8 = 0x30;
    pub const READ_PULSE_COUNT: u8 = 0x31;
    pub const READ_INPUT_PULSE: u8 = 0x32;
    pub const READ_TARGET_POSITION: u8 = 0x33;
    pub const READ_POSITION_ERROR: u8 = 0x34;
    pub const READ_DRIVE_PARAMETERS: u8 = 0x35;
    pub const READ_REALTIME_TARGET_POSITION: u8 = 0x36;
    pub const READ_SPEED: u8 = 0x37;
    pub const READ_TEMPERATURE: u8 = 0x39;
    pub const READ_BUS_VOLTAGE: u8 = 0x3A;
    pub const READ_BUS_CURRENT: u8 = 0x3B;
    pub const READ_PHASE_CURRENT: u8 = 0x42;
    pub const READ_SYSTEM_STATUS: u8 = 0x43;

    /// Control-set function codes, for Y-board batch validation (§4.6).
    pub const CONTROL_SET: [u8; 4] = [TORQUE_MODE, SPEED_MODE, POSITION_DIRECT, POSITION_TRAPEZOID];
    /// Read-set function codes, for Y-board batch validation (§4.6).
    pub const READ_SET: [u8; 1] = [READ_REALTIME_TARGET_POSITION];

    /// Device returned an error response (`00 EE 6B`).
    pub const ERROR_RESPONSE: u8 = 0x00;
}

pub mod aux {
    pub const MOTOR_ENABLE: u8 = 0xAB;
    pub const IMMEDIATE_STOP: u8 = 0x98;
    pub const SYNC_TRIGGER: u8 = 0x66;
    pub const SET_ZERO: u8 = 0x88;
    pub const FORCE_STOP_HOMING: u8 = 0x48;
    pub const MODIFY_HOMING_PARAMS: u8 = 0xAE;
    pub const MODIFY_DRIVE_PARAMS: u8 = 0xD1;
    pub const MODIFY_MOTOR_ID: u8 = 0x4B;
    pub const TRIGGER_ENCODER_CALIBRATION: u8 = 0x45;
    pub const CLEAR_POSITION: u8 = 0x6D;
    pub const RELEASE_STALL_PROTECTION: u8 = 0x52;
    pub const FACTORY_RESET: u8 = 0x5F;
    pub const READ_PHASE_CURRENT: u8 = 0x6C;
    pub const READ_SYSTEM_STATUS: u8 = 0x7A;

    pub const ERROR_CODE: u8 = 0xEE;
}

/// Status flag reported via `ConditionNotMet`'s trigger byte in the raw
/// response stream.
pub const CONDITION_NOT_MET: u8 = 0xE2;
