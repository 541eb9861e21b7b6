//! Out-of-band device status and stall recovery (USB class request 0x67).
//!
//! Status block layout:
//! ```text
//! offset 0: u16 length   (total bytes, this field included)
//! offset 2: u16 code     (a response code)
//! offset 4: u32[]        halted endpoint addresses
//! ```

use std::thread;

use bytes::Buf;
use ptpkit_container::codes::response;
use ptpkit_transport::{ClassRequest, ControlRequest, Transport};
use tracing::{debug, trace, warn};

use crate::config::RecoveryPolicy;
use crate::error::{PtpError, Result};

/// Buffer size for a status read; large enough for seven halted endpoints.
pub const STATUS_BUFFER_LEN: usize = 33;

/// A decoded GetDeviceStatus reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub code: u16,
    pub halted_endpoints: Vec<u32>,
}

impl DeviceStatus {
    /// Decode the `received` bytes of a status read.
    pub fn decode(received: &[u8]) -> Result<Self> {
        if received.len() < 4 {
            return Err(PtpError::Status {
                declared: 4,
                received: received.len(),
            });
        }
        let mut cursor = received;
        let declared = usize::from(cursor.get_u16_le());
        if declared != received.len() || declared % 4 != 0 {
            return Err(PtpError::Status {
                declared,
                received: received.len(),
            });
        }
        let code = cursor.get_u16_le();
        let mut halted_endpoints = Vec::with_capacity(cursor.remaining() / 4);
        while cursor.has_remaining() {
            halted_endpoints.push(cursor.get_u32_le());
        }
        Ok(Self {
            code,
            halted_endpoints,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.code == response::OK
    }
}

/// Outcome of [`clear_and_wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The status code reported before any halt was cleared.
    Status(u16),
    /// Halts were cleared but the device never reported OK.
    Exhausted { last_status: u16 },
}

/// Issue GetDeviceStatus and decode the reply.
pub fn get_device_status<T: Transport + ?Sized>(transport: &mut T) -> Result<DeviceStatus> {
    let request = ControlRequest::class(ClassRequest::GetDeviceStatus, transport.interface_number());
    let mut buf = [0u8; STATUS_BUFFER_LEN];
    let n = transport.control_request(&request, &mut buf)?;
    let status = DeviceStatus::decode(&buf[..n])?;
    trace!(
        code = status.code,
        halted = status.halted_endpoints.len(),
        "device status"
    );
    Ok(status)
}

/// Read the device status, clear any halted bulk endpoints it lists, then
/// poll until the device reports OK.
///
/// Returns the status code read before clearing, which after a stall is the
/// device's verdict on the failed transaction. When no endpoint was halted
/// the code is returned without polling.
pub fn clear_and_wait<T: Transport + ?Sized>(
    transport: &mut T,
    policy: &RecoveryPolicy,
) -> Result<ClearOutcome> {
    let initial = get_device_status(transport)?;
    if initial.halted_endpoints.is_empty() {
        debug!(code = initial.code, "no endpoints halted");
        return Ok(ClearOutcome::Status(initial.code));
    }

    let endpoints = transport.endpoints();
    for &ep in &initial.halted_endpoints {
        if ep == u32::from(endpoints.bulk_in) || ep == u32::from(endpoints.bulk_out) {
            warn!(endpoint = ep, "clearing halted endpoint");
            // The match above guarantees the value fits a u8.
            transport.clear_halt(ep as u8)?;
        } else {
            warn!(endpoint = ep, "device reports unknown halted endpoint");
        }
    }

    let mut last_status = response::UNDEFINED;
    for attempt in 0..policy.max_polls {
        match get_device_status(transport) {
            Ok(status) => last_status = status.code,
            Err(err) => debug!(attempt, error = %err, "status poll failed"),
        }
        if last_status == response::OK {
            return Ok(ClearOutcome::Status(initial.code));
        }
        if attempt + 1 < policy.max_polls {
            trace!(attempt, status = last_status, "device not ready, sleeping");
            thread::sleep(policy.poll_interval);
        }
    }

    warn!(
        polls = policy.max_polls,
        status = last_status,
        "device did not report ready"
    );
    Ok(ClearOutcome::Exhausted { last_status })
}
