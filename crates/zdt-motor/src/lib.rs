//! Per-axis ZDT motor controller session: command issuance, response
//! parsing, and a caller-observed motion state machine layered on top.

mod controller;
mod state;

pub use controller::MotorController;
pub use state::{transition, MotionEvent, MotionState};
