//! Decodes response payloads. Tolerant of the firmware's habit of
//! returning a shorter payload than the fully framed form for several
//! queries; length dispatch lives here rather than scattered version checks.

use tracing::warn;
use zdt_types::{
    encoder_calibrated_to_degree, encoder_raw_to_degree, motor_position_error_to_degree,
    motor_position_to_degree, motor_speed_to_rpm, DriveParameters, Direction, Error,
    HomingParameters, HomingStatus, MotorStatus, PIDParameters, ResistanceInductance,
    SystemStatus, VersionInfo, FRAME_TAIL,
};

use crate::codes::{aux, fc, CONDITION_NOT_MET};

pub struct ResponseParser;

impl ResponseParser {
    /// Strips an optional trailing tail byte and verifies the function code
    /// echoed in byte 0 matches what was expected. Firmware error responses
    /// (`00 EE [6B]`) become [`Error::CommandError`]; a condition-not-met
    /// status becomes [`Error::ConditionNotMet`] with the unrefined variant,
    /// left for the caller to refine via a follow-up status read.
    pub fn payload(expected_fc: u8, raw: &[u8]) -> Result<&[u8], Error> {
        if raw.is_empty() {
            return Err(Error::MalformedFrame("empty response".into()));
        }
        let body = if raw.last() == Some(&FRAME_TAIL) {
            &raw[..raw.len() - 1]
        } else {
            raw
        };
        if body.is_empty() {
            return Err(Error::MalformedFrame("response has no function code".into()));
        }

        let actual_fc = body[0];
        if actual_fc == fc::ERROR_RESPONSE {
            if body.get(1) == Some(&aux::ERROR_CODE) {
                warn!(expected_fc, frame = ?body, "device returned a command error");
                return Err(Error::CommandError);
            }
            if body.get(1) == Some(&CONDITION_NOT_MET) {
                return Err(Error::ConditionNotMet(zdt_types::ConditionNotMet::Generic));
            }
            warn!(expected_fc, frame = ?body, "device returned an unrecognized error frame");
            return Err(Error::CommandError);
        }
        if actual_fc != expected_fc {
            warn!(expected_fc, actual_fc, "function code mismatch in response");
            return Err(Error::FunctionCodeMismatch {
                expected: expected_fc,
                actual: actual_fc,
            });
        }
        Ok(&body[1..])
    }

    fn require_len(data: &[u8], expected: usize) -> Result<(), Error> {
        if data.len() != expected {
            return Err(Error::InvalidResponseLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }

    fn u16_be(data: &[u8], at: usize) -> u16 {
        u16::from_be_bytes([data[at], data[at + 1]])
    }

    fn u32_be(data: &[u8], at: usize) -> u32 {
        u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
    }

    pub fn parse_motor_status(data: &[u8]) -> Result<MotorStatus, Error> {
        Self::require_len(data, 1)?;
        Ok(MotorStatus::from_byte(data[0]))
    }

    pub fn parse_homing_status(data: &[u8]) -> Result<HomingStatus, Error> {
        Self::require_len(data, 1)?;
        Ok(HomingStatus::from_byte(data[0]))
    }

    /// Exactly 15 bytes or rejected outright (Testable Property #8).
    pub fn parse_homing_parameters(data: &[u8]) -> Result<HomingParameters, Error> {
        Self::require_len(data, 15)?;
        Ok(HomingParameters {
            mode: data[0],
            direction: data[1],
            speed_rpm: Self::u16_be(data, 2),
            timeout_ms: Self::u32_be(data, 4),
            collision_speed_rpm: Self::u16_be(data, 8),
            collision_current_ma: Self::u16_be(data, 10),
            collision_time_ms: Self::u16_be(data, 12),
            auto_homing: data[14] != 0,
        })
    }

    /// Tolerant of a 7-byte truncated response: fields beyond what fits are
    /// left at their [`PIDParameters::default`] value rather than rejected.
    pub fn parse_pid_parameters(data: &[u8]) -> Result<PIDParameters, Error> {
        if data.len() >= 16 {
            return Ok(PIDParameters {
                trapezoid_kp: Self::u32_be(data, 0),
                direct_kp: Self::u32_be(data, 4),
                speed_kp: Self::u32_be(data, 8),
                speed_ki: Self::u32_be(data, 12),
            });
        }
        if data.len() == 7 {
            return Ok(PIDParameters {
                trapezoid_kp: Self::u16_be(data, 0) as u32,
                direct_kp: Self::u16_be(data, 2) as u32,
                speed_kp: Self::u16_be(data, 4) as u32,
                ..PIDParameters::default()
            });
        }
        Err(Error::InvalidResponseLength {
            expected: 16,
            actual: data.len(),
        })
    }

    pub fn parse_version(data: &[u8]) -> Result<VersionInfo, Error> {
        Self::require_len(data, 4)?;
        let fw = Self::u16_be(data, 0);
        let hw = Self::u16_be(data, 2);
        Ok(VersionInfo {
            firmware_major: (fw / 100) as u8,
            firmware_minor: (fw % 100) as u8,
            hardware_major: (hw / 100) as u8,
            hardware_minor: (hw % 100) as u8,
        })
    }

    pub fn parse_resistance_inductance(data: &[u8]) -> Result<ResistanceInductance, Error> {
        Self::require_len(data, 4)?;
        Ok(ResistanceInductance {
            resistance_ohms: Self::u16_be(data, 0) as f64 / 1000.0,
            inductance_mh: Self::u16_be(data, 2) as f64 / 1000.0,
        })
    }

    /// Sign byte + u8 magnitude. Distinct from the generic sign-magnitude
    /// multi-byte encoding used for position/speed/current: temperature is
    /// never wider than one magnitude byte.
    pub fn parse_temperature(data: &[u8]) -> Result<i16, Error> {
        Self::require_len(data, 2)?;
        let direction = Direction::from_byte(data[0]);
        Ok(direction.apply(data[1] as f64) as i16)
    }

    /// u16 BE millivolts -> volts.
    pub fn parse_bus_voltage(data: &[u8]) -> Result<f64, Error> {
        Self::require_len(data, 2)?;
        Ok(Self::u16_be(data, 0) as f64 / 1000.0)
    }

    /// u16 BE milliamps -> amps. Shared by bus current and phase current.
    pub fn parse_current(data: &[u8]) -> Result<f64, Error> {
        Self::require_len(data, 2)?;
        Ok(Self::u16_be(data, 0) as f64 / 1000.0)
    }

    pub fn parse_speed(data: &[u8]) -> Result<f64, Error> {
        Self::require_len(data, 3)?;
        let direction = Direction::from_byte(data[0]);
        Ok(motor_speed_to_rpm(direction, Self::u16_be(data, 1)))
    }

    pub fn parse_position(data: &[u8]) -> Result<f64, Error> {
        Self::require_len(data, 5)?;
        let direction = Direction::from_byte(data[0]);
        Ok(motor_position_to_degree(direction, Self::u32_be(data, 1)))
    }

    pub fn parse_position_error(data: &[u8]) -> Result<f64, Error> {
        Self::require_len(data, 5)?;
        let direction = Direction::from_byte(data[0]);
        Ok(motor_position_error_to_degree(direction, Self::u32_be(data, 1)))
    }

    pub fn parse_encoder_raw(data: &[u8]) -> Result<f64, Error> {
        Self::require_len(data, 2)?;
        Ok(encoder_raw_to_degree(Self::u16_be(data, 0)))
    }

    pub fn parse_encoder_calibrated(data: &[u8]) -> Result<f64, Error> {
        Self::require_len(data, 2)?;
        Ok(encoder_calibrated_to_degree(Self::u16_be(data, 0)))
    }

    pub fn parse_pulse_count(data: &[u8]) -> Result<i32, Error> {
        Self::require_len(data, 5)?;
        let direction = Direction::from_byte(data[0]);
        Ok(direction.apply(Self::u32_be(data, 1) as f64) as i32)
    }

    /// Dispatches on observed length: a fully framed response (37 bytes), a
    /// framed response without the leading echo/aux pair (33 bytes, just the
    /// save flag plus the 32-byte block), a bare 24-byte block, or a
    /// simplified 7-byte form. The 7/24-byte forms only carry the first few
    /// single-byte fields on the wire; remaining fields are left `None`
    /// rather than reconstructed from the control-mode-dependent heuristics
    /// the firmware's own reference tooling uses (those are noted as
    /// potentially buggy; this decoder does not reproduce them).
    pub fn parse_drive_parameters(data: &[u8]) -> Result<DriveParameters, Error> {
        let block: &[u8] = match data.len() {
            37 => &data[4..],
            33 => &data[1..],
            24 => data,
            7 => data,
            other => {
                return Err(Error::InvalidResponseLength {
                    expected: 33,
                    actual: other,
                })
            }
        };

        if block.len() == 7 {
            return Ok(DriveParameters {
                control_mode: Some(block[0]),
                subdivision: Some(block[1]),
                open_loop_current_ma: Some(Self::u16_be(block, 2)),
                stall_protection_enabled: Some(block[4] != 0),
                unknown_tail: Some(block[5..].to_vec()),
                ..Default::default()
            });
        }

        let mut params = DriveParameters {
            control_mode: Some(block[0]),
            subdivision: Some(block[1]),
            open_loop_current_ma: Some(Self::u16_be(block, 2)),
            closed_loop_current_ma: Some(Self::u16_be(block, 4)),
            max_speed_rpm: Some(Self::u16_be(block, 6)),
            current_loop_bandwidth_hz: Some(Self::u16_be(block, 8)),
            serial_baud_index: Some(block[10]),
            can_baud_index: Some(block[11]),
            stall_protection_enabled: Some(block[12] != 0),
            stall_speed_threshold_rpm: Some(Self::u16_be(block, 13)),
            stall_current_threshold_ma: Some(Self::u16_be(block, 15)),
            stall_time_ms: Some(Self::u16_be(block, 17)),
            arrival_window_pulses: Some(Self::u16_be(block, 19)),
            unknown_tail: None,
        };
        if block.len() > 21 {
            params.unknown_tail = Some(block[21..].to_vec());
        }
        Ok(params)
    }

    /// Dispatches on a fully framed payload versus the simplified 7-byte
    /// form (two status bytes plus whatever scalar fit); fields the short
    /// form cannot supply stay `None`.
    pub fn parse_system_status(data: &[u8]) -> Result<SystemStatus, Error> {
        if data.len() == 7 {
            let direction = Direction::from_byte(data[2]);
            return Ok(SystemStatus {
                homing_status: Some(HomingStatus::from_byte(data[0])),
                motor_status: Some(MotorStatus::from_byte(data[1])),
                realtime_speed_rpm: Some(motor_speed_to_rpm(direction, Self::u16_be(data, 3))),
                temperature_c: Some(direction.apply(data[5] as f64) as i16),
                ..Default::default()
            });
        }
        if data.len() < 26 {
            return Err(Error::InvalidResponseLength {
                expected: 26,
                actual: data.len(),
            });
        }
        let dir_speed = Direction::from_byte(data[6]);
        let dir_pos = Direction::from_byte(data[12]);
        let dir_err = Direction::from_byte(data[17]);
        Ok(SystemStatus {
            bus_voltage_v: Some(Self::u16_be(data, 0) as f64 / 1000.0),
            bus_current_a: Some(Self::u16_be(data, 2) as f64 / 1000.0),
            phase_current_a: Some(Self::u16_be(data, 4) as f64 / 1000.0),
            realtime_speed_rpm: Some(motor_speed_to_rpm(dir_speed, Self::u16_be(data, 7))),
            realtime_position_deg: Some(motor_position_to_degree(dir_pos, Self::u32_be(data, 13))),
            position_error_deg: Some(motor_position_error_to_degree(dir_err, Self::u32_be(data, 18))),
            encoder_raw: Some(Self::u16_be(data, 22)),
            encoder_calibrated: None,
            target_position_deg: None,
            temperature_c: Some(Direction::from_byte(data[24]).apply(data[25] as f64) as i16),
            homing_status: None,
            motor_status: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_optional_tail() {
        let with_tail = [fc::READ_REALTIME_TARGET_POSITION, 0x01, 0x00, 0x00, 0x1C, 0x19, FRAME_TAIL];
        let without_tail = [fc::READ_REALTIME_TARGET_POSITION, 0x01, 0x00, 0x00, 0x1C, 0x19];
        let a = ResponseParser::payload(fc::READ_REALTIME_TARGET_POSITION, &with_tail).unwrap();
        let b = ResponseParser::payload(fc::READ_REALTIME_TARGET_POSITION, &without_tail).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn scenario_s4_realtime_position() {
        let raw = [0x36, 0x01, 0x00, 0x00, 0x1C, 0x19, FRAME_TAIL];
        let payload = ResponseParser::payload(fc::READ_REALTIME_TARGET_POSITION, &raw).unwrap();
        let deg = ResponseParser::parse_position(payload).unwrap();
        assert!((deg - (-719.3)).abs() < 1e-9);
    }

    #[test]
    fn scenario_s5_command_error() {
        let raw = [0x00, 0xEE, FRAME_TAIL];
        let err = ResponseParser::payload(fc::READ_MOTOR_STATUS, &raw).unwrap_err();
        assert!(matches!(err, Error::CommandError));
    }

    #[test]
    fn function_code_mismatch() {
        let raw = [0x27, 0x01, FRAME_TAIL];
        let err = ResponseParser::payload(fc::READ_SPEED, &raw).unwrap_err();
        assert!(matches!(
            err,
            Error::FunctionCodeMismatch { expected: 0x37, actual: 0x27 }
        ));
    }

    #[test]
    fn homing_parameters_length_gate() {
        let short = [0u8; 10];
        assert!(matches!(
            ResponseParser::parse_homing_parameters(&short),
            Err(Error::InvalidResponseLength { expected: 15, actual: 10 })
        ));
    }

    #[test]
    fn pid_parameters_tolerates_seven_byte_form() {
        let data = [0x00, 0x0A, 0x00, 0x14, 0x00, 0x1E, 0xFF];
        let parsed = ResponseParser::parse_pid_parameters(&data).unwrap();
        assert_eq!(parsed.trapezoid_kp, 10);
        assert_eq!(parsed.direct_kp, 20);
        assert_eq!(parsed.speed_kp, 30);
        assert_eq!(parsed.speed_ki, 0);
    }

    #[test]
    fn temperature_sign_and_magnitude() {
        let data = [0x00, 0x21];
        assert_eq!(ResponseParser::parse_temperature(&data).unwrap(), 33);
        let data = [0x01, 0x21];
        assert_eq!(ResponseParser::parse_temperature(&data).unwrap(), -33);
    }

    #[test]
    fn drive_parameters_short_form_leaves_unknown_as_none() {
        let data = [0x02, 0x10, 0x01, 0x00, 0x01, 0xFF, 0xFF];
        let parsed = ResponseParser::parse_drive_parameters(&data).unwrap();
        assert_eq!(parsed.control_mode, Some(0x02));
        assert!(parsed.max_speed_rpm.is_none());
        assert_eq!(parsed.unknown_tail.as_deref(), Some(&[0xFF, 0xFF][..]));
    }
}
