use thiserror::Error;

/// Refinement of a `0xE2` ("condition not met") response, obtained by a
/// single follow-up read of motor status. Never produced recursively.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionNotMet {
    #[error("motor is not enabled")]
    MotorNotEnabled,
    #[error("motor is in stall protection")]
    StallProtection,
    #[error("homing is already in progress")]
    HomingInProgress,
    #[error("condition not met (unrefined)")]
    Generic,
}

/// Unified error taxonomy for every crate in the stack.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open transport: {0}")]
    TransportOpen(String),

    #[error("transport I/O error: {0}")]
    TransportIO(String),

    #[error("timed out waiting for response")]
    Timeout,

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("function code mismatch: expected {expected:#04x}, got {actual:#04x}")]
    FunctionCodeMismatch { expected: u8, actual: u8 },

    #[error("device returned an error response")]
    CommandError,

    #[error("condition not met: {0}")]
    ConditionNotMet(ConditionNotMet),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid response length: expected {expected}, got {actual}")]
    InvalidResponseLength { expected: usize, actual: usize },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid batch: {0}")]
    InvalidBatch(String),
}
