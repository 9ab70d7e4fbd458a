use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use zdt_bus::{BusCoordinator, BusKey};
use zdt_protocol::{build_y_board_frame, codes::fc, BatchMode, CommandBuilder, ResponseParser, SubCommand};
use zdt_transport::{fragment_command, response_frame_id, Bus};
use zdt_types::{
    ConditionNotMet, DriveParameters, Error, HomingParameters, HomingStatus, MotorStatus,
    PIDParameters, ResistanceInductance, SystemStatus, VersionInfo,
};

use crate::state::{transition, MotionEvent, MotionState};

const FRAGMENT_DELAY: Duration = Duration::from_millis(50);

/// A session against one axis. Holds a shared reference to the bus
/// transport acquired through the [`BusCoordinator`]; never owns the
/// serial handle outright.
pub struct MotorController {
    motor_id: u8,
    bus_key: BusKey,
    coordinator: BusCoordinator,
    transport: Option<Arc<Mutex<Bus>>>,
    timeout: Duration,
    motion_state: MotionState,
    last_motor_status: Option<MotorStatus>,
}

impl MotorController {
    pub fn new(motor_id: u8, bus_key: BusKey, timeout: Duration) -> Result<Self, Error> {
        zdt_types::validate_motor_id(motor_id)?;
        Ok(Self {
            motor_id,
            bus_key,
            coordinator: BusCoordinator::new(),
            transport: None,
            timeout,
            motion_state: MotionState::default(),
            last_motor_status: None,
        })
    }

    pub fn motor_id(&self) -> u8 {
        self.motor_id
    }

    pub fn motion_state(&self) -> MotionState {
        self.motion_state
    }

    pub fn connect(&mut self, open_timeout: Duration) -> Result<(), Error> {
        let bus = self.coordinator.acquire(&self.bus_key, open_timeout)?;
        self.transport = Some(bus);
        Ok(())
    }

    /// Like [`Self::connect`], but takes the transport opener as a closure
    /// so tests can supply a mock transport instead of a real serial port.
    pub fn connect_with(&mut self, open: impl FnOnce() -> Result<Bus, Error>) -> Result<(), Error> {
        let bus = self.coordinator.acquire_with(&self.bus_key, open)?;
        self.transport = Some(bus);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.transport.take().is_some() {
            self.coordinator.release(&self.bus_key);
        }
    }

    fn bus(&self) -> Result<Arc<Mutex<Bus>>, Error> {
        self.transport
            .clone()
            .ok_or_else(|| Error::TransportIO("motor controller is not connected".into()))
    }

    /// Sends `command`, fragmenting if necessary, and waits for the
    /// matching response on the base frame-id. Holds the bus lock for the
    /// entire round trip so no other motor's exchange can interleave.
    fn raw_exchange(&self, command: &[u8]) -> Result<Vec<u8>, Error> {
        let bus = self.bus()?;
        let frames = fragment_command(self.motor_id, command);
        let mut bus = bus.lock().expect("bus mutex poisoned");

        for (i, (frame_id, data)) in frames.iter().enumerate() {
            bus.send_frame(*frame_id, data)?;
            if i + 1 < frames.len() {
                std::thread::sleep(FRAGMENT_DELAY);
            }
        }

        bus.recv_frame(response_frame_id(self.motor_id), self.timeout)
    }

    /// Re-queries motor (and optionally homing) status to refine an
    /// unspecific `ConditionNotMet`. Bounded to this single follow-up;
    /// never recurses back into [`Self::send_and_receive`].
    fn refine_condition_not_met(&mut self, check_homing: bool) -> Result<ConditionNotMet, Error> {
        if check_homing {
            let raw = self.raw_exchange(&CommandBuilder::read_homing_status())?;
            let payload = ResponseParser::payload(fc::READ_HOMING_STATUS, &raw)?;
            let status = ResponseParser::parse_homing_status(payload)?;
            if status.homing_in_progress {
                return Ok(ConditionNotMet::HomingInProgress);
            }
        }

        let raw = self.raw_exchange(&CommandBuilder::read_motor_status())?;
        let payload = ResponseParser::payload(fc::READ_MOTOR_STATUS, &raw)?;
        let status = ResponseParser::parse_motor_status(payload)?;
        self.last_motor_status = Some(status);

        if !status.enabled {
            Ok(ConditionNotMet::MotorNotEnabled)
        } else if status.stall_protection {
            Ok(ConditionNotMet::StallProtection)
        } else {
            Ok(ConditionNotMet::Generic)
        }
    }

    fn send_and_receive(&mut self, command: Vec<u8>, check_homing: bool) -> Result<Vec<u8>, Error> {
        let expected_fc = command[0];
        let raw = self.raw_exchange(&command)?;
        match ResponseParser::payload(expected_fc, &raw) {
            Err(Error::ConditionNotMet(_)) => {
                let refined = self.refine_condition_not_met(check_homing)?;
                Err(Error::ConditionNotMet(refined))
            }
            Ok(payload) => Ok(payload.to_vec()),
            Err(other) => Err(other),
        }
    }

    fn apply(&mut self, event: MotionEvent) {
        let next = transition(self.motion_state, event);
        if next != self.motion_state {
            debug!(motor_id = self.motor_id, from = ?self.motion_state, to = ?next, "motion state transition");
        }
        self.motion_state = next;
    }

    // -- Lifecycle ----------------------------------------------------

    pub fn modify_motor_id(&mut self, new_id: u8, save: bool) -> Result<(), Error> {
        let command = CommandBuilder::modify_motor_id(new_id, save)?;
        self.send_and_receive(command, false)?;
        self.motor_id = new_id;
        Ok(())
    }

    // -- Motion ---------------------------------------------------------

    pub fn enable(&mut self, multi_sync: bool) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::motor_enable(true, multi_sync), false)?;
        self.apply(MotionEvent::Enabled);
        Ok(())
    }

    pub fn disable(&mut self, multi_sync: bool) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::motor_enable(false, multi_sync), false)?;
        self.apply(MotionEvent::Disabled);
        Ok(())
    }

    pub fn stop(&mut self, multi_sync: bool) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::immediate_stop(multi_sync), false)?;
        self.apply(MotionEvent::Stopped);
        Ok(())
    }

    pub fn set_torque(&mut self, target_current_ma: i32, current_slope: u16, multi_sync: bool) -> Result<(), Error> {
        let command = CommandBuilder::torque_mode(target_current_ma, current_slope, multi_sync)?;
        self.send_and_receive(command, false)?;
        self.apply(MotionEvent::MoveIssued);
        Ok(())
    }

    pub fn set_speed(&mut self, speed_rpm: f64, accel_rpm_per_s: u16, multi_sync: bool) -> Result<(), Error> {
        let command = CommandBuilder::speed_mode(speed_rpm, accel_rpm_per_s, multi_sync)?;
        self.send_and_receive(command, false)?;
        self.apply(MotionEvent::MoveIssued);
        Ok(())
    }

    pub fn move_to_position_direct(
        &mut self,
        position_deg: f64,
        speed_rpm: f64,
        absolute: bool,
        multi_sync: bool,
    ) -> Result<(), Error> {
        let command = CommandBuilder::position_direct(position_deg, speed_rpm, absolute, multi_sync)?;
        self.send_and_receive(command, false)?;
        self.apply(MotionEvent::MoveIssued);
        Ok(())
    }

    pub fn move_to_position_trapezoid(
        &mut self,
        position_deg: f64,
        speed_rpm: f64,
        accel_rpm_per_s: u16,
        decel_rpm_per_s: u16,
        absolute: bool,
        multi_sync: bool,
    ) -> Result<(), Error> {
        let command = CommandBuilder::position_trapezoid(
            position_deg,
            speed_rpm,
            accel_rpm_per_s,
            decel_rpm_per_s,
            absolute,
            multi_sync,
        )?;
        self.send_and_receive(command, false)?;
        self.apply(MotionEvent::MoveIssued);
        Ok(())
    }

    // -- Homing -----------------------------------------------------------

    pub fn trigger_homing(&mut self, mode: u8, multi_sync: bool) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::trigger_homing(mode, multi_sync), true)?;
        Ok(())
    }

    pub fn force_stop_homing(&mut self) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::force_stop_homing(), false)?;
        Ok(())
    }

    pub fn set_zero_position(&mut self, save: bool) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::set_zero(save), false)?;
        Ok(())
    }

    pub fn read_homing_status(&mut self) -> Result<HomingStatus, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_homing_status(), false)?;
        ResponseParser::parse_homing_status(&payload)
    }

    pub fn read_homing_parameters(&mut self) -> Result<HomingParameters, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_homing_parameters(), false)?;
        ResponseParser::parse_homing_parameters(&payload)
    }

    pub fn modify_homing_parameters(&mut self, params: &HomingParameters, save: bool) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::modify_homing_parameters(params, save), false)?;
        Ok(())
    }

    // -- Triggers -----------------------------------------------------------

    pub fn clear_position(&mut self) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::clear_position(), false)?;
        Ok(())
    }

    pub fn release_stall_protection(&mut self) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::release_stall_protection(), false)?;
        self.apply(MotionEvent::StallReleased);
        Ok(())
    }

    pub fn trigger_encoder_calibration(&mut self) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::trigger_encoder_calibration(), false)?;
        Ok(())
    }

    pub fn factory_reset(&mut self) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::factory_reset(), false)?;
        Ok(())
    }

    // -- Readers -----------------------------------------------------------

    pub fn read_motor_status(&mut self) -> Result<MotorStatus, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_motor_status(), false)?;
        let status = ResponseParser::parse_motor_status(&payload)?;
        if status.stalled && !status.stall_protection {
            warn!(motor_id = self.motor_id, "motor reports stalled without stall protection engaged");
        }
        self.last_motor_status = Some(status);
        Ok(status)
    }

    /// Alias for [`Self::read_realtime_target_position`]; the generic
    /// "current position" reader is backed by the same query.
    pub fn read_position(&mut self) -> Result<f64, Error> {
        self.read_realtime_target_position()
    }

    pub fn read_realtime_target_position(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_realtime_target_position(), false)?;
        ResponseParser::parse_position(&payload)
    }

    pub fn read_target_position(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_target_position(), false)?;
        ResponseParser::parse_position(&payload)
    }

    pub fn read_speed(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_speed(), false)?;
        ResponseParser::parse_speed(&payload)
    }

    pub fn read_position_error(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_position_error(), false)?;
        ResponseParser::parse_position_error(&payload)
    }

    pub fn read_temperature(&mut self) -> Result<i16, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_temperature(), false)?;
        ResponseParser::parse_temperature(&payload)
    }

    pub fn read_bus_voltage(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_bus_voltage(), false)?;
        ResponseParser::parse_bus_voltage(&payload)
    }

    pub fn read_bus_current(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_bus_current(), false)?;
        ResponseParser::parse_current(&payload)
    }

    pub fn read_phase_current(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_phase_current(), false)?;
        ResponseParser::parse_current(&payload)
    }

    pub fn read_version(&mut self) -> Result<VersionInfo, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_version(), false)?;
        ResponseParser::parse_version(&payload)
    }

    pub fn read_resistance_inductance(&mut self) -> Result<ResistanceInductance, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_resistance_inductance(), false)?;
        ResponseParser::parse_resistance_inductance(&payload)
    }

    pub fn read_pid_parameters(&mut self) -> Result<PIDParameters, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_pid_parameters(), false)?;
        ResponseParser::parse_pid_parameters(&payload)
    }

    pub fn read_encoder_raw(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_encoder_raw(), false)?;
        ResponseParser::parse_encoder_raw(&payload)
    }

    pub fn read_encoder_calibrated(&mut self) -> Result<f64, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_encoder_calibrated(), false)?;
        ResponseParser::parse_encoder_calibrated(&payload)
    }

    pub fn read_pulse_count(&mut self) -> Result<i32, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_pulse_count(), false)?;
        ResponseParser::parse_pulse_count(&payload)
    }

    pub fn read_input_pulse(&mut self) -> Result<i32, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_input_pulse(), false)?;
        ResponseParser::parse_pulse_count(&payload)
    }

    pub fn read_drive_parameters(&mut self) -> Result<DriveParameters, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_drive_parameters(), false)?;
        ResponseParser::parse_drive_parameters(&payload)
    }

    pub fn modify_drive_parameters(&mut self, params: &DriveParameters, save: bool) -> Result<(), Error> {
        self.send_and_receive(CommandBuilder::modify_drive_parameters(params, save), false)?;
        Ok(())
    }

    pub fn read_system_status(&mut self) -> Result<SystemStatus, Error> {
        let payload = self.send_and_receive(CommandBuilder::read_system_status(), false)?;
        ResponseParser::parse_system_status(&payload)
    }

    // -- Bulk ---------------------------------------------------------------

    /// Sends `command` to the broadcast motor id with no response awaited.
    pub fn send_broadcast(&self, command: Vec<u8>) -> Result<(), Error> {
        let bus = self.bus()?;
        let frames = fragment_command(zdt_types::BROADCAST_MOTOR_ID, &command);
        let mut bus = bus.lock().expect("bus mutex poisoned");
        for (i, (frame_id, data)) in frames.iter().enumerate() {
            bus.send_frame(*frame_id, data)?;
            if i + 1 < frames.len() {
                std::thread::sleep(FRAGMENT_DELAY);
            }
        }
        Ok(())
    }

    /// Builds and sends a Y-board aggregate frame (§4.6) from `sub_commands`
    /// (motor id, pre-built command bytes), then, if `wait_ack`, attempts to
    /// read one response from `expected_ack`'s frame-id. Uses this
    /// session's own shared transport handle to listen on the ack motor's
    /// frame-id directly, rather than constructing a throw-away session for
    /// it (§9 design note on the dynamic broadcast controller).
    ///
    /// `mode`, if given, asserts the batch is entirely control-set or
    /// entirely read-set sub-commands rather than letting that be inferred
    /// from whichever sub-command is seen first; a mismatch raises
    /// `InvalidBatch` before anything is sent.
    ///
    /// Some firmware variants (Response=None/Reached) never answer a batch
    /// at all. Rather than surface that as a hard failure, a timeout on the
    /// ack read is treated as "no response" and the call still reports
    /// success — the broadcast frame was already sent and accepted by the
    /// bus; only the optional confirmation is degraded to fire-and-forget.
    pub fn multi_motor_command(
        &self,
        sub_commands: &[(u8, Vec<u8>)],
        expected_ack: Option<u8>,
        wait_ack: bool,
        mode: Option<BatchMode>,
    ) -> Result<Option<Vec<u8>>, Error> {
        let subs: Vec<SubCommand> = sub_commands
            .iter()
            .map(|(motor_id, command)| SubCommand::new(*motor_id, command.clone()))
            .collect();
        let frame = build_y_board_frame(&subs, mode)?;
        self.send_broadcast(frame)?;

        let (true, Some(ack_id)) = (wait_ack, expected_ack) else {
            return Ok(None);
        };

        let bus = self.bus()?;
        let mut bus = bus.lock().expect("bus mutex poisoned");
        match bus.recv_frame(response_frame_id(ack_id), self.timeout) {
            Ok(data) => Ok(Some(data)),
            Err(Error::Timeout) => {
                warn!(ack_id, "multi-motor command ack timed out, treating as fire-and-forget");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for MotorController {
    fn drop(&mut self) {
        self.disconnect();
    }
}
