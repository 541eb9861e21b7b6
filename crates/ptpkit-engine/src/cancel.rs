//! Cancelling a transaction from another thread.
//!
//! A transaction holds the engine for its whole duration, so the class
//! Cancel request (0x64) cannot go through the engine. [`Canceller`] sends it
//! on the transport's shared control channel instead. The device answers by
//! stalling the endpoints of the cancelled transfer, and the running
//! transaction resolves that stall through its normal fault path.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ptpkit_transport::{ClassRequest, ControlChannel, ControlRequest};
use tracing::{debug, warn};

use crate::error::Result;

/// Event code carried in the Cancel request payload.
const CANCEL_TRANSACTION: u16 = 0x4001;

const IDLE: u64 = u64::MAX;

/// Payload of the class Cancel request: event code then transaction id.
pub(crate) fn cancel_payload(transaction_id: u32) -> [u8; 6] {
    let mut payload = [0u8; 6];
    payload[..2].copy_from_slice(&CANCEL_TRANSACTION.to_le_bytes());
    payload[2..].copy_from_slice(&transaction_id.to_le_bytes());
    payload
}

/// Transaction id of the exchange currently on the bulk endpoints.
#[derive(Debug)]
pub(crate) struct InFlight(AtomicU64);

impl InFlight {
    pub(crate) fn start(&self, transaction_id: u32) {
        self.0.store(u64::from(transaction_id), Ordering::Release);
    }

    pub(crate) fn finish(&self) {
        self.0.store(IDLE, Ordering::Release);
    }

    pub(crate) fn get(&self) -> Option<u32> {
        u32::try_from(self.0.load(Ordering::Acquire)).ok()
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self(AtomicU64::new(IDLE))
    }
}

/// Handle that aborts transfers without waiting for the transaction lock.
///
/// Obtained from [`Initiator::canceller`](crate::Initiator::canceller) or
/// [`Engine::canceller`](crate::Engine::canceller) when the transport
/// exposes a shared control channel. Clones refer to the same device.
#[derive(Clone)]
pub struct Canceller {
    channel: Arc<dyn ControlChannel>,
    interface: u16,
    in_flight: Arc<InFlight>,
}

impl Canceller {
    pub(crate) fn new(
        channel: Arc<dyn ControlChannel>,
        interface: u16,
        in_flight: Arc<InFlight>,
    ) -> Self {
        Self {
            channel,
            interface,
            in_flight,
        }
    }

    /// Transaction id of the exchange in progress, if any.
    pub fn in_flight(&self) -> Option<u32> {
        self.in_flight.get()
    }

    /// Send the class Cancel request for `transaction_id`.
    pub fn cancel(&self, transaction_id: u32) -> Result<()> {
        let request = ControlRequest::class(ClassRequest::Cancel, self.interface);
        let mut payload = cancel_payload(transaction_id);
        warn!(transaction_id, "cancel requested");
        self.channel.control_request(&request, &mut payload)?;
        Ok(())
    }

    /// Cancel the transaction in progress and return its id. Does nothing
    /// when the bulk endpoints are idle.
    pub fn cancel_in_flight(&self) -> Result<Option<u32>> {
        let Some(transaction_id) = self.in_flight() else {
            debug!("cancel requested with no transaction in flight");
            return Ok(None);
        };
        self.cancel(transaction_id)?;
        Ok(Some(transaction_id))
    }
}

impl fmt::Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller")
            .field("interface", &self.interface)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
