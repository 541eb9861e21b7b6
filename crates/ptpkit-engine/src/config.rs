use std::time::Duration;

/// How long the engine waits for a device to settle after a stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RecoveryPolicy {
    /// GetDeviceStatus polls after clearing halted endpoints.
    pub max_polls: u32,
    /// Sleep between polls.
    pub poll_interval: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_polls: 10,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Configuration for the transaction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub recovery: RecoveryPolicy,
    /// Reject a response whose transaction id differs from the command's.
    ///
    /// Some non-conforming devices echo a stale id; clear this to accept them.
    pub strict_response_transaction_id: bool,
    /// Read size for inbound data after the first packet.
    pub inbound_chunk_size: usize,
    /// Outbound staging buffer, rounded down to a multiple of the bulk-out
    /// packet size.
    pub outbound_buffer_size: usize,
    /// Read size for the response container.
    pub max_response_len: usize,
    /// Largest object the in-memory helpers will buffer.
    pub max_buffered_object: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recovery: RecoveryPolicy::default(),
            strict_response_transaction_id: true,
            inbound_chunk_size: 128 * 1024,
            outbound_buffer_size: 128 * 1024,
            max_response_len: ptpkit_container::MAX_PARAM_CONTAINER,
            max_buffered_object: 64 * 1024 * 1024,
        }
    }
}
