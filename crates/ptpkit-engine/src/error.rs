use ptpkit_container::ContainerError;
use ptpkit_transport::TransportError;

/// Errors that can occur while driving a PTP device.
#[derive(Debug, thiserror::Error)]
pub enum PtpError {
    /// The caller violated a session or phase precondition. No I/O was done.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// The device's cached DeviceInfo does not list this operation.
    #[error("operation {name} (0x{code:04x}) not supported by device")]
    UnsupportedOperation { code: u16, name: String },

    /// A caller-supplied argument was rejected before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The device sent something that does not fit the transaction.
    #[error("protocol error: {0}")]
    Protocol(#[from] ContainerError),

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Clearing a stall ran its polling budget without the device reporting OK.
    #[error("device not ready after {polls} status polls (last status 0x{last_status:04x})")]
    RecoveryExhausted { polls: u32, last_status: u16 },

    /// A GetDeviceStatus reply whose declared length disagrees with the bytes received.
    #[error("malformed device status (declared {declared} bytes, received {received})")]
    Status { declared: usize, received: usize },

    /// The device answered with a non-OK response code.
    #[error("device returned {name} (0x{code:04x})")]
    Response { code: u16, name: String },

    /// A local sink or source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device did not report ready while attaching.
    #[error("device not ready (status 0x{status:04x})")]
    DeviceNotReady { status: u16 },
}

impl PtpError {
    /// True for a halted bulk endpoint, which the engine tries to recover from.
    pub fn is_stall(&self) -> bool {
        matches!(self, PtpError::Transport(err) if err.is_stall())
    }

    /// True when this error, raised inside a transaction, leaves the device
    /// in an unknown state and forces a device reset.
    pub fn triggers_reset(&self) -> bool {
        matches!(
            self,
            PtpError::Protocol(_)
                | PtpError::Transport(_)
                | PtpError::Io(_)
                | PtpError::Status { .. }
        )
    }

    /// The response code carried by a [`PtpError::Response`].
    pub fn response_code(&self) -> Option<u16> {
        match self {
            PtpError::Response { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PtpError>;
