/// Errors reported by a PTP transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device halted a bulk endpoint (USB STALL handshake).
    ///
    /// PTP responders stall both bulk endpoints when they reject or abort
    /// the current exchange; the engine recovers through the status query.
    #[error("endpoint stalled{}", endpoint.map(|ep| format!(" (0x{ep:02x})")).unwrap_or_default())]
    Stalled { endpoint: Option<u8> },

    /// A read or write deadline elapsed.
    #[error("transfer timed out")]
    Timeout,

    /// The device went away.
    #[error("device disconnected")]
    Disconnected,

    /// Any other I/O failure on the underlying channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True when this error is a halted-endpoint indication.
    pub fn is_stall(&self) -> bool {
        matches!(self, TransportError::Stalled { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
