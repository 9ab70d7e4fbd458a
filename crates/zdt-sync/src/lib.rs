//! Multi-axis synchronization on top of the per-axis Motor Controller: the
//! two-phase broadcast sync used by X-variant boards, and the Y-board
//! aggregate batch path. No protocol-level byte encoding lives here — that
//! is `zdt-protocol`'s job; this crate only sequences calls against it.

mod orchestrator;

pub use orchestrator::{MotionCommand, SixAxisArm};
pub use zdt_protocol::{build_y_board_frame, BatchMode, SubCommand};
