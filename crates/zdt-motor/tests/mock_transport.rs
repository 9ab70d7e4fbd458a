use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

use zdt_bus::BusKey;
use zdt_motor::{MotionState, MotorController};
use zdt_transport::{Bus, SlcanFrame};

/// Feeds scripted SLCAN response lines back one exchange at a time: each
/// `write()` (a command going out) releases the next pending line into
/// `available` if nothing is currently queued up for `read()`. This keeps
/// the mock compatible with `Bus::send_frame`'s pre-write input drain,
/// which would otherwise swallow a response queued before it was ever
/// asked for.
struct ScriptedSerial {
    pending: VecDeque<Vec<u8>>,
    available: VecDeque<u8>,
}

impl ScriptedSerial {
    fn new(lines: &[String]) -> Self {
        Self {
            pending: lines.iter().map(|l| l.as_bytes().to_vec()).collect(),
            available: VecDeque::new(),
        }
    }
}

impl Read for ScriptedSerial {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.available.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no more scripted data"));
        }
        let mut n = 0;
        while n < buf.len() {
            match self.available.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl Write for ScriptedSerial {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.available.is_empty() {
            if let Some(next) = self.pending.pop_front() {
                self.available.extend(next);
            }
        }
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn unique_key(label: &str) -> BusKey {
    BusKey::new(format!("mock://{label}"), 500_000)
}

#[test]
fn enable_then_read_status_advances_motion_state() {
    let enable_response = SlcanFrame::new(0x0100, vec![0xF3, 0x02, 0x6B]).encode();
    let status_response = SlcanFrame::new(0x0100, vec![0x27, 0x0B, 0x6B]).encode();
    let lines = [enable_response, status_response];

    let mut controller = MotorController::new(1, unique_key("enable-then-status"), Duration::from_millis(200)).unwrap();
    controller
        .connect_with(|| Ok(Bus::from_io(Box::new(ScriptedSerial::new(&lines)))))
        .unwrap();

    assert_eq!(controller.motion_state(), MotionState::Idle);
    controller.enable(false).unwrap();
    assert_eq!(controller.motion_state(), MotionState::Enabled);

    let status = controller.read_motor_status().unwrap();
    assert!(status.enabled);
    assert!(status.in_position);
    assert!(status.stall_protection);

    controller.disconnect();
}

#[test]
fn condition_not_met_is_refined_by_status_requery() {
    let error_response = SlcanFrame::new(0x0200, vec![0x00, 0xE2, 0x6B]).encode();
    let status_response = SlcanFrame::new(0x0200, vec![0x27, 0x00, 0x6B]).encode();
    let lines = [error_response, status_response];

    let mut controller = MotorController::new(2, unique_key("condition-not-met"), Duration::from_millis(200)).unwrap();
    controller
        .connect_with(|| Ok(Bus::from_io(Box::new(ScriptedSerial::new(&lines)))))
        .unwrap();

    let err = controller.set_speed(100.0, 500, false).unwrap_err();
    assert!(matches!(
        err,
        zdt_types::Error::ConditionNotMet(zdt_types::ConditionNotMet::MotorNotEnabled)
    ));

    controller.disconnect();
}

#[test]
fn multi_motor_command_rejects_mixed_batch_before_touching_the_bus() {
    use zdt_protocol::CommandBuilder;

    let controller = MotorController::new(1, unique_key("multi-motor-invalid-batch"), Duration::from_millis(200)).unwrap();
    let subs = vec![
        (1u8, CommandBuilder::speed_mode(100.0, 500, true).unwrap()),
        (2u8, CommandBuilder::read_realtime_target_position()),
    ];

    // Not connected: if this reached send_broadcast it would fail with
    // TransportIO instead, so InvalidBatch here proves validation runs first.
    let err = controller
        .multi_motor_command(&subs, None, false, None)
        .unwrap_err();
    assert!(matches!(err, zdt_types::Error::InvalidBatch(_)));
}

#[test]
fn multi_motor_command_degrades_to_fire_and_forget_on_ack_timeout() {
    use zdt_protocol::CommandBuilder;

    let mut controller = MotorController::new(1, unique_key("multi-motor-no-response"), Duration::from_millis(50)).unwrap();
    controller
        .connect_with(|| Ok(Bus::from_io(Box::new(ScriptedSerial::new(&[])))))
        .unwrap();

    let subs = vec![(1u8, CommandBuilder::speed_mode(100.0, 500, true).unwrap())];
    let ack = controller
        .multi_motor_command(&subs, Some(2), true, None)
        .unwrap();
    assert!(ack.is_none());

    controller.disconnect();
}

#[test]
fn multi_motor_command_returns_ack_payload_when_present() {
    use zdt_protocol::{BatchMode, CommandBuilder};

    let ack_response = SlcanFrame::new(0x0200, vec![0x27, 0x0B, 0x6B]).encode();
    let mut controller = MotorController::new(1, unique_key("multi-motor-with-ack"), Duration::from_millis(200)).unwrap();
    controller
        .connect_with(|| Ok(Bus::from_io(Box::new(ScriptedSerial::new(&[ack_response])))))
        .unwrap();

    let subs = vec![(1u8, CommandBuilder::speed_mode(100.0, 500, true).unwrap())];
    let ack = controller
        .multi_motor_command(&subs, Some(2), true, Some(BatchMode::Control))
        .unwrap();
    assert_eq!(ack, Some(vec![0x27, 0x0B, 0x6B]));

    controller.disconnect();
}
