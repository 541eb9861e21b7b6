use std::sync::Arc;
use std::time::Duration;

use crate::control::ControlRequest;
use crate::error::Result;

/// Endpoint addresses of a PTP interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoints {
    /// Bulk-in endpoint (data and responses from the device).
    pub bulk_in: u8,
    /// Bulk-out endpoint (commands and data to the device).
    pub bulk_out: u8,
    /// Interrupt-in endpoint (asynchronous events).
    pub interrupt: u8,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            bulk_in: 0x81,
            bulk_out: 0x02,
            interrupt: 0x83,
        }
    }
}

/// Control requests that may be issued while a bulk transfer is in flight.
///
/// The default control pipe is independent of the bulk endpoints, so a
/// handle to it can be shared with threads that do not own the
/// [`Transport`]. The class Cancel request travels this way.
pub trait ControlChannel: Send + Sync {
    /// Issue a control request; same contract as
    /// [`Transport::control_request`].
    fn control_request(&self, request: &ControlRequest, data: &mut [u8]) -> Result<usize>;
}

/// The channel a PTP engine drives.
///
/// All calls block the calling thread. Deadlines, when wanted, belong to
/// the implementation and surface as [`TransportError::Timeout`].
///
/// The engine owns its transport exclusively for the lifetime of the
/// attached device; nothing else may touch the bulk endpoints while a
/// transaction is in flight.
///
/// [`TransportError::Timeout`]: crate::TransportError::Timeout
pub trait Transport {
    /// Write `bytes` to the bulk-out endpoint as part of the current transfer.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Terminate the current bulk-out transfer with a zero-length packet.
    fn send_zero_length_terminator(&mut self) -> Result<()>;

    /// Read at most `buf.len()` bytes from the bulk-in endpoint.
    ///
    /// Returns the number of bytes read; a read shorter than requested ends
    /// the device's transfer, and `0` is a zero-length packet.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read one interrupt transfer, waiting at most `timeout`.
    fn recv_interrupt(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Issue a control request. For `In` requests `data` receives the
    /// device's reply and the returned count is the bytes received; for
    /// `Out` requests `data` is sent.
    fn control_request(&mut self, request: &ControlRequest, data: &mut [u8]) -> Result<usize>;

    /// Clear a halt condition on `endpoint`.
    fn clear_halt(&mut self, endpoint: u8) -> Result<()>;

    /// Maximum packet size of the bulk-out endpoint.
    fn max_out_packet_size(&self) -> usize;

    /// Maximum packet size of the bulk-in endpoint.
    fn max_in_packet_size(&self) -> usize;

    /// Endpoint addresses, used to match halted endpoints in status replies.
    fn endpoints(&self) -> Endpoints;

    /// Interface number used as `wIndex` for class requests.
    fn interface_number(&self) -> u16 {
        0
    }

    /// A control handle usable without `&mut self`, if the backend can share
    /// its device handle. Without one, cancellation waits for the bulk side
    /// to go idle.
    fn control_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        None
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }

    fn send_zero_length_terminator(&mut self) -> Result<()> {
        (**self).send_zero_length_terminator()
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).recv(buf)
    }

    fn recv_interrupt(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        (**self).recv_interrupt(buf, timeout)
    }

    fn control_request(&mut self, request: &ControlRequest, data: &mut [u8]) -> Result<usize> {
        (**self).control_request(request, data)
    }

    fn clear_halt(&mut self, endpoint: u8) -> Result<()> {
        (**self).clear_halt(endpoint)
    }

    fn max_out_packet_size(&self) -> usize {
        (**self).max_out_packet_size()
    }

    fn max_in_packet_size(&self) -> usize {
        (**self).max_in_packet_size()
    }

    fn endpoints(&self) -> Endpoints {
        (**self).endpoints()
    }

    fn interface_number(&self) -> u16 {
        (**self).interface_number()
    }

    fn control_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        (**self).control_channel()
    }
}
