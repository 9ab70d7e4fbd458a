use tracing::debug;
use zdt_protocol::{BatchMode, CommandBuilder};
use zdt_types::Error;
use zdt_motor::MotorController;

/// One axis's motion request, issued during the pre-load phase of a
/// two-phase sync.
#[derive(Debug, Clone, Copy)]
pub enum MotionCommand {
    Speed {
        rpm: f64,
        accel_rpm_per_s: u16,
    },
    PositionDirect {
        position_deg: f64,
        speed_rpm: f64,
        absolute: bool,
    },
    PositionTrapezoid {
        position_deg: f64,
        speed_rpm: f64,
        accel_rpm_per_s: u16,
        decel_rpm_per_s: u16,
        absolute: bool,
    },
    Torque {
        target_current_ma: i32,
        current_slope: u16,
    },
}

impl MotionCommand {
    fn issue(self, axis: &mut MotorController, multi_sync: bool) -> Result<(), Error> {
        match self {
            MotionCommand::Speed { rpm, accel_rpm_per_s } => axis.set_speed(rpm, accel_rpm_per_s, multi_sync),
            MotionCommand::PositionDirect { position_deg, speed_rpm, absolute } => {
                axis.move_to_position_direct(position_deg, speed_rpm, absolute, multi_sync)
            }
            MotionCommand::PositionTrapezoid {
                position_deg,
                speed_rpm,
                accel_rpm_per_s,
                decel_rpm_per_s,
                absolute,
            } => axis.move_to_position_trapezoid(position_deg, speed_rpm, accel_rpm_per_s, decel_rpm_per_s, absolute, multi_sync),
            MotionCommand::Torque { target_current_ma, current_slope } => {
                axis.set_torque(target_current_ma, current_slope, multi_sync)
            }
        }
    }
}

/// A group of up to six [`MotorController`]s sharing one bus, composed
/// over the per-axis and broadcast primitives with no protocol logic of
/// its own.
pub struct SixAxisArm {
    axes: Vec<MotorController>,
}

impl SixAxisArm {
    pub const MAX_AXES: usize = 6;

    pub fn new(axes: Vec<MotorController>) -> Result<Self, Error> {
        if axes.is_empty() || axes.len() > Self::MAX_AXES {
            return Err(Error::InvalidParameter(format!(
                "arm supports 1 to {} axes, got {}",
                Self::MAX_AXES,
                axes.len()
            )));
        }
        Ok(Self { axes })
    }

    pub fn axis(&self, index: usize) -> Option<&MotorController> {
        self.axes.get(index)
    }

    pub fn axis_mut(&mut self, index: usize) -> Option<&mut MotorController> {
        self.axes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Two-phase broadcast sync (Testable Property #7): every entry in
    /// `moves` is pre-loaded with `multi_sync=1` before the broadcast
    /// trigger is sent. No motion command is issued after the trigger.
    pub fn sync_move(&mut self, moves: &[(usize, MotionCommand)]) -> Result<(), Error> {
        for (index, command) in moves {
            let axis = self
                .axes
                .get_mut(*index)
                .ok_or_else(|| Error::InvalidParameter(format!("no axis at index {index}")))?;
            command.issue(axis, true)?;
        }
        debug!(axis_count = moves.len(), "pre-load complete, sending broadcast sync trigger");
        self.axes[0].send_broadcast(CommandBuilder::sync_trigger())
    }

    /// Assembles and sends a Y-board aggregate frame (§4.6) from
    /// `sub_commands`, waiting for an ack from `expected_ack` when
    /// `wait_ack` is set. `mode`, if given, asserts the batch is entirely
    /// control or entirely read sub-commands rather than inferring it from
    /// the first one. Delegates the actual framing and ack wait to
    /// [`MotorController::multi_motor_command`] on axis 0 — any axis's
    /// session shares the same bus handle, so it can listen on another
    /// axis's frame-id without that axis's own session involved.
    pub fn y_board_batch(
        &mut self,
        sub_commands: &[(u8, Vec<u8>)],
        expected_ack: Option<u8>,
        wait_ack: bool,
        mode: Option<BatchMode>,
    ) -> Result<Option<Vec<u8>>, Error> {
        debug!(sub_count = sub_commands.len(), wait_ack, ?mode, "dispatching Y-board batch");
        self.axes[0].multi_motor_command(sub_commands, expected_ack, wait_ack, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use zdt_bus::BusKey;

    #[test]
    fn rejects_too_many_axes() {
        let axes: Vec<MotorController> = (1..=7)
            .map(|id| MotorController::new(id, BusKey::new("mock://arm-overflow", 500_000), Duration::from_millis(10)).unwrap())
            .collect();
        assert!(SixAxisArm::new(axes).is_err());
    }

    #[test]
    fn rejects_empty_arm() {
        assert!(SixAxisArm::new(Vec::new()).is_err());
    }

    #[test]
    fn rejects_out_of_range_axis_index() {
        let axes = vec![MotorController::new(1, BusKey::new("mock://arm-index", 500_000), Duration::from_millis(10)).unwrap()];
        let mut arm = SixAxisArm::new(axes).unwrap();
        let moves = [(5, MotionCommand::Speed { rpm: 10.0, accel_rpm_per_s: 100 })];
        assert!(arm.sync_move(&moves).is_err());
    }
}
