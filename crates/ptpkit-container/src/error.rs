use crate::codec::ContainerKind;

/// Errors that can occur while encoding or decoding PTP containers.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// More positional parameters than a container can carry.
    #[error("too many parameters ({count}, max {max})")]
    InvalidArgument { count: usize, max: usize },

    /// Fewer bytes than the structure being decoded needs.
    #[error("truncated container ({available} bytes, need {needed})")]
    Truncated { needed: usize, available: usize },

    /// The declared container length disagrees with the bytes transferred.
    #[error("container length mismatch (declared {declared}, actual {actual})")]
    LengthMismatch { declared: u64, actual: u64 },

    /// The container type field is not one this decoder knows.
    #[error("unknown container kind {0}")]
    UnknownContainerKind(u16),

    /// A valid container arrived in the wrong phase.
    #[error("unexpected {actual:?} container (expected {expected:?})")]
    UnexpectedKind {
        expected: ContainerKind,
        actual: ContainerKind,
    },

    /// The container's code does not match the initiating command.
    #[error("code mismatch (expected 0x{expected:04x}, got 0x{actual:04x})")]
    CodeMismatch { expected: u16, actual: u16 },

    /// The container's transaction id does not match the initiating command.
    #[error("transaction id mismatch (expected {expected}, got {actual})")]
    TransactionMismatch { expected: u32, actual: u32 },

    /// A data stream ended before the declared length was transferred.
    #[error("premature end of data ({transferred} of {expected} bytes)")]
    PrematureEof { expected: u64, transferred: u64 },

    /// A parameter block whose size is not a whole number of `u32`s.
    #[error("malformed parameter block ({len} bytes)")]
    MalformedParams { len: usize },

    /// A dataset field could not be decoded.
    #[error("malformed dataset field '{field}': {reason}")]
    Dataset {
        field: &'static str,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ContainerError>;
