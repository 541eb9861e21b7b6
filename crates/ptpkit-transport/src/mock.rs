//! A scripted in-memory transport.
//!
//! [`MockTransport`] plays the device side from a queue of bulk-in
//! transfers, status replies and faults, and records every call the engine
//! makes. Clones share state, so a test keeps one handle for assertions
//! after moving the other into the engine.
//!
//! Bulk-in reads follow USB short-packet rules: a transfer that is a whole
//! number of packets is terminated by a zero-length packet, and a read with
//! room to spare takes that terminator along with the data.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

use crate::control::{ClassRequest, ControlRequest};
use crate::error::{Result, TransportError};
use crate::traits::{ControlChannel, Endpoints, Transport};

/// How long a read scripted with [`MockTransport::push_stall_on_cancel`]
/// waits for the Cancel request before timing out.
const CANCEL_WAIT: Duration = Duration::from_secs(5);

/// One observed call on a [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Send(Vec<u8>),
    ZeroLengthPacket,
    Recv { requested: usize, returned: usize },
    RecvInterrupt,
    Control { request: ControlRequest, data: Vec<u8> },
    ClearHalt(u8),
}

enum Inbound {
    /// Device data; `terminated` transfers end with a zero-length packet.
    Transfer { bytes: BytesMut, terminated: bool },
    Fault(TransportError),
    /// Block until a Cancel arrives, then report `endpoint` stalled.
    StallOnCancel { endpoint: u8 },
}

impl Inbound {
    fn zero_length_packet() -> Self {
        Inbound::Transfer {
            bytes: BytesMut::new(),
            terminated: false,
        }
    }
}

enum StatusReply {
    Raw(Vec<u8>),
    Fault(TransportError),
}

#[derive(Default)]
struct MockState {
    bulk_in: VecDeque<Inbound>,
    /// One entry per upcoming send; `None` lets that send through.
    send_faults: VecDeque<Option<TransportError>>,
    control_faults: VecDeque<TransportError>,
    status: VecDeque<StatusReply>,
    extended_event_data: VecDeque<Vec<u8>>,
    interrupts: VecDeque<Vec<u8>>,
    pending_cancels: usize,
    calls: Vec<TransportCall>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<MockState>,
    cancelled: Condvar,
}

/// Scripted [`Transport`] for tests and examples.
#[derive(Clone)]
pub struct MockTransport {
    shared: Arc<Shared>,
    max_in_packet_size: usize,
    max_out_packet_size: usize,
    endpoints: Endpoints,
}

impl MockTransport {
    /// Status reply used when no status has been scripted: length 4, OK.
    pub const OK_STATUS: [u8; 4] = [0x04, 0x00, 0x01, 0x20];

    /// Create a transport whose bulk endpoints share one max packet size.
    pub fn new(max_packet_size: usize) -> Self {
        Self::with_packet_sizes(max_packet_size, max_packet_size)
    }

    /// Create a transport with distinct bulk-in and bulk-out packet sizes.
    pub fn with_packet_sizes(max_in_packet_size: usize, max_out_packet_size: usize) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            max_in_packet_size,
            max_out_packet_size,
            endpoints: Endpoints::default(),
        }
    }

    /// Override the reported endpoint addresses.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Queue one device-to-host bulk transfer.
    ///
    /// Like a real device, a non-empty transfer that is an exact multiple of
    /// the bulk-in packet size is followed by a zero-length packet. The
    /// packet is only left queued when the read that drains the transfer
    /// fills its buffer exactly.
    pub fn push_transfer(&self, bytes: impl AsRef<[u8]>) {
        let bytes = bytes.as_ref();
        let terminated = !bytes.is_empty() && bytes.len() % self.max_in_packet_size == 0;
        self.lock().bulk_in.push_back(Inbound::Transfer {
            bytes: BytesMut::from(bytes),
            terminated,
        });
    }

    /// Queue bytes the device sends without ending its transfer, such as
    /// the first packets of a transfer that then faults.
    pub fn push_unterminated(&self, bytes: impl AsRef<[u8]>) {
        self.lock().bulk_in.push_back(Inbound::Transfer {
            bytes: BytesMut::from(bytes.as_ref()),
            terminated: false,
        });
    }

    /// Queue an explicit zero-length packet on bulk-in.
    pub fn push_zero_length_packet(&self) {
        self.lock().bulk_in.push_back(Inbound::zero_length_packet());
    }

    /// Make the next bulk-in read block until a class Cancel request is
    /// issued, then fail as a stall on `endpoint`.
    pub fn push_stall_on_cancel(&self, endpoint: u8) {
        self.lock()
            .bulk_in
            .push_back(Inbound::StallOnCancel { endpoint });
    }

    /// Make the next bulk-in read fail.
    pub fn push_in_fault(&self, err: TransportError) {
        self.lock().bulk_in.push_back(Inbound::Fault(err));
    }

    /// Make the next unscripted bulk-out write (or terminator) fail.
    pub fn fail_next_send(&self, err: TransportError) {
        self.lock().send_faults.push_back(Some(err));
    }

    /// Let `count` bulk-out writes succeed before any fault queued after
    /// this call.
    pub fn pass_next_sends(&self, count: usize) {
        let mut state = self.lock();
        state.send_faults.extend((0..count).map(|_| None));
    }

    /// Make the next non-status control request fail.
    pub fn fail_next_control(&self, err: TransportError) {
        self.lock().control_faults.push_back(err);
    }

    /// Queue a raw GetDeviceStatus reply.
    pub fn push_status_raw(&self, bytes: impl Into<Vec<u8>>) {
        self.lock().status.push_back(StatusReply::Raw(bytes.into()));
    }

    /// Queue a well-formed GetDeviceStatus reply.
    pub fn push_status(&self, code: u16, halted_endpoints: &[u32]) {
        let len = 4 + 4 * halted_endpoints.len();
        let mut buf = BytesMut::with_capacity(len);
        buf.put_u16_le(len as u16);
        buf.put_u16_le(code);
        for ep in halted_endpoints {
            buf.put_u32_le(*ep);
        }
        self.push_status_raw(buf.to_vec());
    }

    /// Make the next GetDeviceStatus request fail.
    pub fn push_status_fault(&self, err: TransportError) {
        self.lock().status.push_back(StatusReply::Fault(err));
    }

    /// Queue a GetExtendedEventData reply.
    pub fn push_extended_event_data(&self, bytes: impl Into<Vec<u8>>) {
        self.lock().extended_event_data.push_back(bytes.into());
    }

    /// Queue one interrupt transfer.
    pub fn push_interrupt(&self, bytes: impl Into<Vec<u8>>) {
        self.lock().interrupts.push_back(bytes.into());
    }

    /// Every call observed so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Concatenation of every payload written to bulk-out.
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Send(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Number of bulk-in reads issued so far.
    pub fn recv_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, TransportCall::Recv { .. }))
            .count()
    }

    /// Number of scripted bulk-in entries not consumed yet.
    pub fn pending_inbound(&self) -> usize {
        self.lock().bulk_in.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A test that panicked while holding the lock already failed.
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn next_send_fault(state: &mut MockState) -> Result<()> {
        match state.send_faults.pop_front().flatten() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Wait for a Cancel with the state lock released.
    fn wait_for_cancel<'a>(
        &'a self,
        mut state: MutexGuard<'a, MockState>,
        endpoint: u8,
    ) -> (MutexGuard<'a, MockState>, Result<usize>) {
        let deadline = Instant::now() + CANCEL_WAIT;
        while state.pending_cancels == 0 {
            let now = Instant::now();
            if now >= deadline {
                return (state, Err(TransportError::Timeout));
            }
            state = self
                .shared
                .cancelled
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        state.pending_cancels -= 1;
        trace!(endpoint, "mock transfer cancelled");
        (
            state,
            Err(TransportError::Stalled {
                endpoint: Some(endpoint),
            }),
        )
    }

    fn control(&self, request: &ControlRequest, data: &mut [u8]) -> Result<usize> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Control {
            request: *request,
            data: data.to_vec(),
        });

        let reply = match request.class_request() {
            Some(ClassRequest::GetDeviceStatus) => match state.status.pop_front() {
                Some(StatusReply::Fault(err)) => return Err(err),
                Some(StatusReply::Raw(bytes)) => bytes,
                None => Self::OK_STATUS.to_vec(),
            },
            Some(ClassRequest::GetExtendedEventData) => {
                state.extended_event_data.pop_front().unwrap_or_default()
            }
            other => {
                if let Some(err) = state.control_faults.pop_front() {
                    return Err(err);
                }
                if other == Some(ClassRequest::Cancel) {
                    state.pending_cancels += 1;
                    self.shared.cancelled.notify_all();
                }
                return Ok(data.len());
            }
        };

        let n = reply.len().min(data.len());
        data[..n].copy_from_slice(&reply[..n]);
        Ok(n)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("max_in_packet_size", &self.max_in_packet_size)
            .field("max_out_packet_size", &self.max_out_packet_size)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(TransportCall::Send(bytes.to_vec()));
        trace!(len = bytes.len(), "mock bulk-out");
        Self::next_send_fault(&mut state)
    }

    fn send_zero_length_terminator(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(TransportCall::ZeroLengthPacket);
        Self::next_send_fault(&mut state)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.lock();
        let requested = buf.len();
        let next = state.bulk_in.pop_front();
        let outcome = match next {
            None => Err(TransportError::Timeout),
            Some(Inbound::Fault(err)) => Err(err),
            Some(Inbound::StallOnCancel { endpoint }) => {
                let (relocked, outcome) = self.wait_for_cancel(state, endpoint);
                state = relocked;
                outcome
            }
            Some(Inbound::Transfer {
                mut bytes,
                terminated,
            }) => {
                let n = bytes.len().min(requested);
                bytes.copy_to_slice(&mut buf[..n]);
                if bytes.has_remaining() {
                    state
                        .bulk_in
                        .push_front(Inbound::Transfer { bytes, terminated });
                } else if terminated && n == requested {
                    // No room left in this read for the terminator.
                    state.bulk_in.push_front(Inbound::zero_length_packet());
                }
                Ok(n)
            }
        };
        let returned = *outcome.as_ref().unwrap_or(&0);
        state.calls.push(TransportCall::Recv {
            requested,
            returned,
        });
        trace!(requested, returned, "mock bulk-in");
        outcome
    }

    fn recv_interrupt(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = self.lock();
        state.calls.push(TransportCall::RecvInterrupt);
        match state.interrupts.pop_front() {
            Some(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            None => Err(TransportError::Timeout),
        }
    }

    fn control_request(&mut self, request: &ControlRequest, data: &mut [u8]) -> Result<usize> {
        self.control(request, data)
    }

    fn clear_halt(&mut self, endpoint: u8) -> Result<()> {
        self.lock().calls.push(TransportCall::ClearHalt(endpoint));
        Ok(())
    }

    fn max_out_packet_size(&self) -> usize {
        self.max_out_packet_size
    }

    fn max_in_packet_size(&self) -> usize {
        self.max_in_packet_size
    }

    fn endpoints(&self) -> Endpoints {
        self.endpoints
    }

    fn control_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        Some(Arc::new(self.clone()))
    }
}

impl ControlChannel for MockTransport {
    fn control_request(&self, request: &ControlRequest, data: &mut [u8]) -> Result<usize> {
        self.control(request, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_is_split_across_reads() {
        let mut t = MockTransport::new(8);
        t.push_transfer([1u8, 2, 3, 4, 5]);

        let mut buf = [0u8; 3];
        assert_eq!(t.recv(&mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(t.recv(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert!(matches!(t.recv(&mut buf), Err(TransportError::Timeout)));
    }

    #[test]
    fn exactly_filled_read_leaves_terminator() {
        let mut t = MockTransport::new(4);
        t.push_transfer([9u8; 8]);

        let mut buf = [0u8; 8];
        assert_eq!(t.recv(&mut buf).unwrap(), 8);
        assert_eq!(t.recv(&mut buf).unwrap(), 0);
        assert_eq!(t.pending_inbound(), 0);
    }

    #[test]
    fn larger_read_absorbs_terminator() {
        let mut t = MockTransport::new(16);
        t.push_transfer([7u8; 16]);
        t.push_transfer([1u8; 4]);

        let mut buf = [0u8; 32];
        assert_eq!(t.recv(&mut buf).unwrap(), 16);
        assert_eq!(t.recv(&mut buf).unwrap(), 4);
        assert_eq!(t.pending_inbound(), 0);
    }

    #[test]
    fn unterminated_prefix_has_no_terminator() {
        let mut t = MockTransport::new(4);
        t.push_unterminated([3u8; 8]);

        let mut buf = [0u8; 8];
        assert_eq!(t.recv(&mut buf).unwrap(), 8);
        assert_eq!(t.pending_inbound(), 0);
    }

    #[test]
    fn faults_are_consumed_once() {
        let mut t = MockTransport::new(64);
        t.fail_next_send(TransportError::Stalled { endpoint: Some(0x02) });

        assert!(t.send(b"abc").unwrap_err().is_stall());
        t.send(b"def").unwrap();
        assert_eq!(t.sent_bytes(), b"abcdef");
    }

    #[test]
    fn passed_sends_precede_fault() {
        let mut t = MockTransport::new(64);
        t.pass_next_sends(2);
        t.fail_next_send(TransportError::Disconnected);

        t.send(b"a").unwrap();
        t.send(b"b").unwrap();
        assert!(matches!(t.send(b"c"), Err(TransportError::Disconnected)));
        t.send(b"d").unwrap();
    }

    #[test]
    fn cancel_from_control_channel_releases_blocked_read() {
        let mut t = MockTransport::new(64);
        t.push_stall_on_cancel(0x81);
        let channel = t.control_channel().unwrap();

        let canceller = std::thread::spawn(move || {
            let req = ControlRequest::class(ClassRequest::Cancel, 0);
            channel.control_request(&req, &mut [0u8; 6]).unwrap();
        });

        let mut buf = [0u8; 64];
        let err = t.recv(&mut buf).unwrap_err();
        canceller.join().unwrap();
        assert!(matches!(
            err,
            TransportError::Stalled {
                endpoint: Some(0x81)
            }
        ));
    }

    #[test]
    fn unscripted_status_is_ok() {
        let mut t = MockTransport::new(64);
        let mut buf = [0u8; 33];
        let req = ControlRequest::class(ClassRequest::GetDeviceStatus, 0);
        let n = t.control_request(&req, &mut buf).unwrap();
        assert_eq!(&buf[..n], &MockTransport::OK_STATUS);
    }

    #[test]
    fn scripted_status_carries_halted_endpoints() {
        let mut t = MockTransport::new(64);
        t.push_status(0x2019, &[0x81, 0x02]);

        let mut buf = [0u8; 33];
        let req = ControlRequest::class(ClassRequest::GetDeviceStatus, 0);
        let n = t.control_request(&req, &mut buf).unwrap();
        assert_eq!(n, 12);
        assert_eq!(&buf[..4], &[12, 0, 0x19, 0x20]);
        assert_eq!(&buf[4..8], &[0x81, 0, 0, 0]);
    }

    #[test]
    fn clones_share_recorded_calls() {
        let observer = MockTransport::new(64);
        let mut driver = observer.clone();
        driver.clear_halt(0x81).unwrap();
        driver.send_zero_length_terminator().unwrap();

        assert_eq!(
            observer.calls(),
            vec![
                TransportCall::ClearHalt(0x81),
                TransportCall::ZeroLengthPacket
            ]
        );
    }
}
