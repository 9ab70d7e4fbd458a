//! SLCAN serial transport and packet fragmentation.
//!
//! Owns the serial byte stream; knows nothing about command semantics,
//! motor identity beyond frame-id bits, or bus sharing — that is the
//! concern of `zdt-bus` and `zdt-motor`.

mod bus;
mod fragment;
mod frame;

pub use bus::{Bus, SerialIo};
pub use fragment::{fragment_command, response_frame_id};
pub use frame::SlcanFrame;
