//! Builds the `0xAA` Y-board aggregate frame: one outer envelope carrying
//! several per-motor sub-commands, validated to a single batch kind.

use tracing::{debug, warn};
use zdt_types::Error;

use crate::codes::fc;

/// One sub-command inside a Y-board aggregate frame: `[motor_id,
/// function_code, params…, tail]`. `command` is a command already built by
/// [`crate::CommandBuilder`] (so it already ends in the tail byte).
#[derive(Debug, Clone)]
pub struct SubCommand {
    pub motor_id: u8,
    pub command: Vec<u8>,
}

impl SubCommand {
    pub fn new(motor_id: u8, command: Vec<u8>) -> Self {
        Self { motor_id, command }
    }

    fn function_code(&self) -> Option<u8> {
        self.command.first().copied()
    }

    fn encoded_len(&self) -> usize {
        1 + self.command.len()
    }
}

/// Which family a Y-board batch belongs to. A batch may not mix the two;
/// callers may also pass one explicitly to `build_y_board_frame` to assert
/// the batch's intent rather than let it be inferred from the first
/// sub-command observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// {torque, speed, position-direct, position-trapezoid}.
    Control,
    /// {realtime-position}.
    Read,
}

fn classify(fc: u8) -> Option<BatchMode> {
    if self::fc::CONTROL_SET.contains(&fc) {
        Some(BatchMode::Control)
    } else if self::fc::READ_SET.contains(&fc) {
        Some(BatchMode::Read)
    } else {
        None
    }
}

/// Builds and validates one Y-board aggregate frame (`0xAA …`). All
/// sub-commands must belong to the same kind, either the control set
/// {torque, speed, position-direct, position-trapezoid} or the read set
/// {realtime-position}; mixing raises [`Error::InvalidBatch`].
///
/// `explicit_mode`, if given, is checked against every sub-command's
/// inferred kind rather than only against each other — this lets a caller
/// that intends a control batch reject a stray read sub-command (or vice
/// versa) even when, pathologically, only one sub-command is present.
pub fn build_y_board_frame(subs: &[SubCommand], explicit_mode: Option<BatchMode>) -> Result<Vec<u8>, Error> {
    if subs.is_empty() {
        warn!("rejected Y-board batch: no sub-commands");
        return Err(Error::InvalidBatch("no sub-commands".into()));
    }

    let mut kind = explicit_mode;
    for sub in subs {
        let fc = sub.function_code().ok_or_else(|| {
            warn!(motor_id = sub.motor_id, "rejected Y-board batch: empty sub-command");
            Error::InvalidBatch("empty sub-command".into())
        })?;
        let this_kind = classify(fc).ok_or_else(|| {
            warn!(motor_id = sub.motor_id, fc, "rejected Y-board batch: function code is not batchable");
            Error::InvalidBatch(format!("function code {fc:#04x} is not batchable"))
        })?;
        match kind {
            None => kind = Some(this_kind),
            Some(k) if k == this_kind => {}
            Some(BatchMode::Control) => {
                warn!(motor_id = sub.motor_id, fc, "rejected Y-board batch: read sub-command in a control batch");
                return Err(Error::InvalidBatch(
                    "batch is limited to control function codes but contains a read (0x36) sub-command".into(),
                ));
            }
            Some(BatchMode::Read) => {
                warn!(motor_id = sub.motor_id, fc, "rejected Y-board batch: control sub-command in a read batch");
                return Err(Error::InvalidBatch(
                    "batch is limited to read function codes but contains a control sub-command".into(),
                ));
            }
        }
    }

    let body_len: usize = subs.iter().map(SubCommand::encoded_len).sum();
    let total_len = body_len + 1; // + outer trailing tail byte

    let mut frame = Vec::with_capacity(3 + body_len + 1);
    frame.push(fc::Y_BOARD_AGGREGATE);
    frame.push((total_len >> 8) as u8);
    frame.push((total_len & 0xFF) as u8);
    for sub in subs {
        frame.push(sub.motor_id);
        frame.extend_from_slice(&sub.command);
    }
    frame.push(zdt_types::FRAME_TAIL);
    debug!(sub_count = subs.len(), total_len, ?kind, "built Y-board aggregate frame");
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandBuilder;

    #[test]
    fn builds_control_batch() {
        let subs = vec![
            SubCommand::new(1, CommandBuilder::speed_mode(100.0, 500, true).unwrap()),
            SubCommand::new(2, CommandBuilder::speed_mode(-100.0, 500, true).unwrap()),
        ];
        let frame = build_y_board_frame(&subs, None).unwrap();
        assert_eq!(frame[0], 0xAA);
        assert_eq!(*frame.last().unwrap(), zdt_types::FRAME_TAIL);
    }

    #[test]
    fn rejects_mixed_batch() {
        let subs = vec![
            SubCommand::new(1, CommandBuilder::speed_mode(100.0, 500, true).unwrap()),
            SubCommand::new(2, CommandBuilder::read_realtime_target_position()),
        ];
        assert!(matches!(build_y_board_frame(&subs, None), Err(Error::InvalidBatch(_))));
    }

    #[test]
    fn rejects_empty_batch() {
        assert!(build_y_board_frame(&[], None).is_err());
    }

    #[test]
    fn explicit_mode_rejects_a_lone_mismatched_sub_command() {
        let subs = vec![SubCommand::new(1, CommandBuilder::read_realtime_target_position())];
        let err = build_y_board_frame(&subs, Some(BatchMode::Control)).unwrap_err();
        assert!(matches!(err, Error::InvalidBatch(_)));
    }
}
