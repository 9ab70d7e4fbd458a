//! Command encoding and response decoding for the ZDT closed-loop stepper
//! command set. No transport or concurrency concerns live here: this crate
//! only knows how to turn logical operations into bytes and back.

pub mod codes;
mod aggregate;
mod builder;
mod parser;

pub use aggregate::{build_y_board_frame, BatchMode, SubCommand};
pub use builder::CommandBuilder;
pub use parser::ResponseParser;
