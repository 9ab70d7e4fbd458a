//! Builds complete command byte sequences (function code, parameters,
//! trailing [`FRAME_TAIL`]) ready for fragmentation and transmission.

use zdt_types::{
    degree_to_motor_position, rpm_to_motor_speed, DriveParameters, Direction, Error,
    HomingParameters, FRAME_TAIL,
};

use crate::codes::{aux, fc};

fn push_u16_be(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_u32_be(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Builds ZDT command byte sequences. All methods return the full on-wire
/// command including the trailing tail byte; fragmentation into CAN frames
/// happens downstream.
pub struct CommandBuilder;

impl CommandBuilder {
    fn simple(function_code: u8, aux_code: u8) -> Vec<u8> {
        vec![function_code, aux_code, FRAME_TAIL]
    }

    fn query(function_code: u8) -> Vec<u8> {
        vec![function_code, FRAME_TAIL]
    }

    fn query_with_aux(function_code: u8, aux_code: u8) -> Vec<u8> {
        vec![function_code, aux_code, FRAME_TAIL]
    }

    pub fn motor_enable(enable: bool, multi_sync: bool) -> Vec<u8> {
        vec![
            fc::MOTOR_ENABLE,
            aux::MOTOR_ENABLE,
            enable as u8,
            multi_sync as u8,
            FRAME_TAIL,
        ]
    }

    pub fn torque_mode(target_current_ma: i32, current_slope: u16, multi_sync: bool) -> Result<Vec<u8>, Error> {
        zdt_types::validate_current(target_current_ma.unsigned_abs())?;
        let direction = Direction::of(target_current_ma as f64);
        let mut buf = vec![fc::TORQUE_MODE, direction.to_byte()];
        push_u16_be(&mut buf, current_slope);
        push_u16_be(&mut buf, target_current_ma.unsigned_abs() as u16);
        buf.push(multi_sync as u8);
        buf.push(FRAME_TAIL);
        Ok(buf)
    }

    pub fn speed_mode(speed_rpm: f64, accel_rpm_per_s: u16, multi_sync: bool) -> Result<Vec<u8>, Error> {
        zdt_types::validate_speed(speed_rpm)?;
        let direction = Direction::of(speed_rpm);
        let mut buf = vec![fc::SPEED_MODE, direction.to_byte()];
        push_u16_be(&mut buf, accel_rpm_per_s);
        push_u16_be(&mut buf, rpm_to_motor_speed(speed_rpm));
        buf.push(multi_sync as u8);
        buf.push(FRAME_TAIL);
        Ok(buf)
    }

    pub fn position_direct(
        position_deg: f64,
        speed_rpm: f64,
        absolute: bool,
        multi_sync: bool,
    ) -> Result<Vec<u8>, Error> {
        zdt_types::validate_position(position_deg)?;
        zdt_types::validate_speed(speed_rpm)?;
        let direction = Direction::of(position_deg);
        let mut buf = vec![fc::POSITION_DIRECT, direction.to_byte()];
        push_u16_be(&mut buf, rpm_to_motor_speed(speed_rpm.abs()));
        push_u32_be(&mut buf, degree_to_motor_position(position_deg));
        buf.push(absolute as u8);
        buf.push(multi_sync as u8);
        buf.push(FRAME_TAIL);
        Ok(buf)
    }

    pub fn position_trapezoid(
        position_deg: f64,
        speed_rpm: f64,
        accel_rpm_per_s: u16,
        decel_rpm_per_s: u16,
        absolute: bool,
        multi_sync: bool,
    ) -> Result<Vec<u8>, Error> {
        zdt_types::validate_position(position_deg)?;
        zdt_types::validate_speed(speed_rpm)?;
        let direction = Direction::of(position_deg);
        let mut buf = vec![fc::POSITION_TRAPEZOID, direction.to_byte()];
        push_u16_be(&mut buf, accel_rpm_per_s);
        push_u16_be(&mut buf, decel_rpm_per_s);
        push_u16_be(&mut buf, rpm_to_motor_speed(speed_rpm.abs()));
        push_u32_be(&mut buf, degree_to_motor_position(position_deg));
        buf.push(absolute as u8);
        buf.push(multi_sync as u8);
        buf.push(FRAME_TAIL);
        Ok(buf)
    }

    pub fn immediate_stop(multi_sync: bool) -> Vec<u8> {
        vec![fc::IMMEDIATE_STOP, aux::IMMEDIATE_STOP, multi_sync as u8, FRAME_TAIL]
    }

    pub fn sync_trigger() -> Vec<u8> {
        Self::simple(fc::SYNC_TRIGGER, aux::SYNC_TRIGGER)
    }

    pub fn set_zero(save: bool) -> Vec<u8> {
        vec![fc::SET_ZERO, aux::SET_ZERO, save as u8, FRAME_TAIL]
    }

    pub fn trigger_homing(mode: u8, multi_sync: bool) -> Vec<u8> {
        vec![fc::TRIGGER_HOMING, mode, multi_sync as u8, FRAME_TAIL]
    }

    pub fn force_stop_homing() -> Vec<u8> {
        Self::simple(fc::FORCE_STOP_HOMING, aux::FORCE_STOP_HOMING)
    }

    pub fn modify_homing_parameters(params: &HomingParameters, save: bool) -> Vec<u8> {
        let mut buf = vec![fc::MODIFY_HOMING_PARAMS, aux::MODIFY_HOMING_PARAMS, save as u8];
        buf.push(params.mode);
        buf.push(params.direction);
        push_u16_be(&mut buf, params.speed_rpm);
        push_u32_be(&mut buf, params.timeout_ms);
        push_u16_be(&mut buf, params.collision_speed_rpm);
        push_u16_be(&mut buf, params.collision_current_ma);
        push_u16_be(&mut buf, params.collision_time_ms);
        buf.push(params.auto_homing as u8);
        buf.push(FRAME_TAIL);
        buf
    }

    /// Encodes the 32-byte drive parameter block. Any field left `None` is
    /// written as zero; callers should read-modify-write via
    /// `read_drive_parameters` rather than relying on this to preserve
    /// unspecified fields.
    pub fn modify_drive_parameters(params: &DriveParameters, save: bool) -> Vec<u8> {
        let mut buf = vec![fc::MODIFY_DRIVE_PARAMS, aux::MODIFY_DRIVE_PARAMS, save as u8];
        buf.push(params.control_mode.unwrap_or(0));
        buf.push(params.subdivision.unwrap_or(0));
        push_u16_be(&mut buf, params.open_loop_current_ma.unwrap_or(0));
        push_u16_be(&mut buf, params.closed_loop_current_ma.unwrap_or(0));
        push_u16_be(&mut buf, params.max_speed_rpm.unwrap_or(0));
        push_u16_be(&mut buf, params.current_loop_bandwidth_hz.unwrap_or(0));
        buf.push(params.serial_baud_index.unwrap_or(0));
        buf.push(params.can_baud_index.unwrap_or(0));
        buf.push(params.stall_protection_enabled.unwrap_or(false) as u8);
        push_u16_be(&mut buf, params.stall_speed_threshold_rpm.unwrap_or(0));
        push_u16_be(&mut buf, params.stall_current_threshold_ma.unwrap_or(0));
        push_u16_be(&mut buf, params.stall_time_ms.unwrap_or(0));
        push_u16_be(&mut buf, params.arrival_window_pulses.unwrap_or(0));
        // Pad to the full 32-byte parameter block; firmware ignores trailing
        // reserved bytes it does not define.
        while buf.len() < 3 + 32 {
            buf.push(0);
        }
        buf.push(FRAME_TAIL);
        buf
    }

    pub fn modify_motor_id(new_id: u8, save: bool) -> Result<Vec<u8>, Error> {
        zdt_types::validate_motor_id(new_id)?;
        Ok(vec![fc::MODIFY_MOTOR_ID, aux::MODIFY_MOTOR_ID, save as u8, new_id, FRAME_TAIL])
    }

    pub fn trigger_encoder_calibration() -> Vec<u8> {
        Self::simple(fc::TRIGGER_ENCODER_CALIBRATION, aux::TRIGGER_ENCODER_CALIBRATION)
    }

    pub fn clear_position() -> Vec<u8> {
        Self::simple(fc::CLEAR_POSITION, aux::CLEAR_POSITION)
    }

    pub fn release_stall_protection() -> Vec<u8> {
        Self::simple(fc::RELEASE_STALL_PROTECTION, aux::RELEASE_STALL_PROTECTION)
    }

    pub fn factory_reset() -> Vec<u8> {
        Self::simple(fc::FACTORY_RESET, aux::FACTORY_RESET)
    }

    pub fn read_version() -> Vec<u8> {
        Self::query(fc::READ_VERSION)
    }

    pub fn read_resistance_inductance() -> Vec<u8> {
        Self::query(fc::READ_RESISTANCE_INDUCTANCE)
    }

    pub fn read_pid_parameters() -> Vec<u8> {
        Self::query(fc::READ_PID_PARAMETERS)
    }

    pub fn read_homing_parameters() -> Vec<u8> {
        Self::query(fc::READ_HOMING_PARAMETERS)
    }

    pub fn read_homing_status() -> Vec<u8> {
        Self::query(fc::READ_HOMING_STATUS)
    }

    pub fn read_motor_status() -> Vec<u8> {
        Self::query(fc::READ_MOTOR_STATUS)
    }

    pub fn read_encoder_raw() -> Vec<u8> {
        Self::query(fc::READ_ENCODER_RAW)
    }

    pub fn read_encoder_calibrated() -> Vec<u8> {
        Self::query(fc::READ_ENCODER_CALIBRATED)
    }

    pub fn read_pulse_count() -> Vec<u8> {
        Self::query(fc::READ_PULSE_COUNT)
    }

    pub fn read_input_pulse() -> Vec<u8> {
        Self::query(fc::READ_INPUT_PULSE)
    }

    pub fn read_target_position() -> Vec<u8> {
        Self::query(fc::READ_TARGET_POSITION)
    }

    pub fn read_position_error() -> Vec<u8> {
        Self::query(fc::READ_POSITION_ERROR)
    }

    pub fn read_drive_parameters() -> Vec<u8> {
        Self::query(fc::READ_DRIVE_PARAMETERS)
    }

    pub fn read_realtime_target_position() -> Vec<u8> {
        Self::query(fc::READ_REALTIME_TARGET_POSITION)
    }

    pub fn read_speed() -> Vec<u8> {
        Self::query(fc::READ_SPEED)
    }

    pub fn read_temperature() -> Vec<u8> {
        Self::query(fc::READ_TEMPERATURE)
    }

    pub fn read_bus_voltage() -> Vec<u8> {
        Self::query(fc::READ_BUS_VOLTAGE)
    }

    pub fn read_bus_current() -> Vec<u8> {
        Self::query(fc::READ_BUS_CURRENT)
    }

    pub fn read_phase_current() -> Vec<u8> {
        Self::query_with_aux(fc::READ_PHASE_CURRENT, aux::READ_PHASE_CURRENT)
    }

    pub fn read_system_status() -> Vec<u8> {
        Self::query_with_aux(fc::READ_SYSTEM_STATUS, aux::READ_SYSTEM_STATUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_enable_frame() {
        assert_eq!(
            CommandBuilder::motor_enable(true, false),
            vec![0xF3, 0xAB, 0x01, 0x00, 0x6B]
        );
    }

    #[test]
    fn speed_mode_endianness() {
        // 2000 RPM positive direction, 1000 RPM/s accel.
        let cmd = CommandBuilder::speed_mode(2000.0, 1000, false).unwrap();
        assert_eq!(cmd[0], fc::SPEED_MODE);
        assert_eq!(cmd[1], Direction::Positive.to_byte());
        assert_eq!(&cmd[2..4], &1000u16.to_be_bytes());
        assert_eq!(&cmd[4..6], &[0x4E, 0x20]); // 20000 = 0x4E20
    }

    #[test]
    fn position_trapezoid_matches_scenario_s2() {
        let cmd = CommandBuilder::position_trapezoid(90.0, 500.0, 1000, 1000, true, false).unwrap();
        assert_eq!(
            cmd,
            vec![0xFD, 0x00, 0x03, 0xE8, 0x03, 0xE8, 0x13, 0x88, 0x00, 0x00, 0x03, 0x84, 0x01, 0x00, 0x6B]
        );
    }

    #[test]
    fn rejects_out_of_range_speed() {
        assert!(CommandBuilder::speed_mode(7000.0, 100, false).is_err());
    }

    #[test]
    fn read_queries_are_tail_only() {
        assert_eq!(CommandBuilder::read_realtime_target_position(), vec![0x36, 0x6B]);
    }
}
