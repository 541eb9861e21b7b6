//! The per-transaction state machine.
//!
//! One call to [`Engine::transact`] runs command, optional data and response
//! phases in order. Any failure in those phases goes through a single fault
//! path: a stall is first resolved through the device status, and anything
//! that cannot be turned into a response resets the device and closes the
//! session. On return the device is always ready for the next command.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use ptpkit_container::codes::{operation, response};
use ptpkit_container::{
    decode_response, encode_command, encode_data_header, peek_header, ContainerError,
    ContainerKind, DeviceInfo, Event, Response, HEADER_SIZE, MAX_PARAMS,
    MAX_PARAM_CONTAINER,
};
use ptpkit_transport::{ClassRequest, ControlRequest, Transport, TransportError};
use tracing::{debug, info, trace, warn};

use crate::cancel::{cancel_payload, Canceller, InFlight};
use crate::config::EngineConfig;
use crate::data::{ChunkSink, ChunkSource, DataPhase};
use crate::error::{PtpError, Result};
use crate::names::{CodeNames, VendorCodeTables};
use crate::session::Session;
use crate::status::{self, ClearOutcome, DeviceStatus};

/// Interrupt read size; larger than any event so padded transfers fit.
const INTERRUPT_BUFFER_LEN: usize = 64;

/// Drives transactions over an owned transport.
///
/// The engine is single-threaded; share it through
/// [`Initiator`](crate::Initiator), which serializes callers.
#[derive(Debug)]
pub struct Engine<T> {
    transport: T,
    session: Session,
    device_info: Option<DeviceInfo>,
    names: VendorCodeTables,
    config: EngineConfig,
    in_flight: Arc<InFlight>,
}

impl<T: Transport> Engine<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    pub fn with_config(transport: T, config: EngineConfig) -> Self {
        Self {
            transport,
            session: Session::new(),
            device_info: None,
            names: VendorCodeTables::standard(),
            config,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The cached DeviceInfo, used to reject unsupported operations.
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.as_ref()
    }

    /// Cache `info` and resolve the code tables for its vendor extension.
    pub fn set_device_info(&mut self, info: DeviceInfo) {
        self.names = VendorCodeTables::for_device(&info);
        if info.has_vendor_extension() {
            info!(
                vendor = self.names.extension().name(),
                id = info.vendor_extension_id,
                version = info.vendor_extension_version,
                "vendor extension resolved"
            );
        }
        self.device_info = Some(info);
    }

    pub fn names(&self) -> &VendorCodeTables {
        &self.names
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// A handle that cancels this engine's transfers from another thread,
    /// when the transport has a shared control channel.
    pub fn canceller(&self) -> Option<Canceller> {
        let channel = self.transport.control_channel()?;
        Some(Canceller::new(
            channel,
            self.transport.interface_number(),
            self.in_flight.clone(),
        ))
    }

    /// Run one transaction.
    ///
    /// Preconditions are checked before any I/O. The returned response may
    /// carry a non-OK code, including one synthesized from the device status
    /// after a stall; callers must check it before using its parameters.
    pub fn transact(&mut self, code: u16, params: &[u32], data: DataPhase<'_>) -> Result<Response> {
        self.check_preconditions(code, params)?;

        let transaction_id = self.session.next_transaction_id();
        debug!(
            operation = %self.names.operation_name(code),
            code,
            transaction_id,
            data = data.name(),
            "transaction"
        );

        self.in_flight.start(transaction_id);
        let result = match self.exchange(code, transaction_id, params, data) {
            Ok(response) => {
                debug!(
                    response = %self.names.response_name(response.code),
                    transaction_id,
                    "transaction complete"
                );
                Ok(response)
            }
            Err(err) => self.recover(transaction_id, err),
        };
        self.in_flight.finish();
        result
    }

    /// Turn a non-OK response into [`PtpError::Response`].
    pub fn check_ok(&self, response: &Response) -> Result<()> {
        if response.is_ok() {
            return Ok(());
        }
        Err(PtpError::Response {
            code: response.code,
            name: self.names.response_name(response.code),
        })
    }

    fn check_preconditions(&self, code: u16, params: &[u32]) -> Result<()> {
        if params.len() > MAX_PARAMS {
            return Err(PtpError::InvalidArgument(format!(
                "{} parameters given, at most {MAX_PARAMS} allowed",
                params.len()
            )));
        }

        if self.session.is_active() {
            if code == operation::OPEN_SESSION {
                return Err(PtpError::IllegalState("session already open"));
            }
        } else if code != operation::GET_DEVICE_INFO && code != operation::OPEN_SESSION {
            return Err(PtpError::IllegalState("no session open"));
        }

        if let Some(info) = &self.device_info {
            if !info.supports_operation(code) {
                return Err(PtpError::UnsupportedOperation {
                    code,
                    name: self.names.operation_name(code),
                });
            }
        }
        Ok(())
    }

    fn exchange(
        &mut self,
        code: u16,
        transaction_id: u32,
        params: &[u32],
        data: DataPhase<'_>,
    ) -> Result<Response> {
        self.send_command(code, transaction_id, params)?;
        match data {
            DataPhase::None => {}
            DataPhase::Inbound(sink) => self.receive_data(code, transaction_id, sink)?,
            DataPhase::Outbound(source) => self.send_data(code, transaction_id, source)?,
        }
        self.receive_response(transaction_id)
    }

    fn send_command(&mut self, code: u16, transaction_id: u32, params: &[u32]) -> Result<()> {
        let mut buf = BytesMut::with_capacity(MAX_PARAM_CONTAINER);
        encode_command(code, transaction_id, params, &mut buf)?;
        self.transport.send(&buf)?;
        self.terminate_if_full(buf.len() as u64)?;
        trace!(len = buf.len(), "command sent");
        Ok(())
    }

    /// A bulk-out transfer that ends on a packet boundary needs a
    /// zero-length packet to mark its end.
    fn terminate_if_full(&mut self, wire_len: u64) -> Result<()> {
        let packet = self.transport.max_out_packet_size().max(1) as u64;
        if wire_len % packet == 0 {
            trace!(wire_len, "sending zero-length terminator");
            self.transport.send_zero_length_terminator()?;
        }
        Ok(())
    }

    fn send_data(
        &mut self,
        code: u16,
        transaction_id: u32,
        source: &mut dyn ChunkSource,
    ) -> Result<()> {
        let total = source.total_len();
        let packet = self.transport.max_out_packet_size().max(HEADER_SIZE);
        let capacity = (self.config.outbound_buffer_size / packet).max(1) * packet;

        let mut buf = BytesMut::with_capacity(capacity);
        encode_data_header(total, code, transaction_id, &mut buf);
        let mut filled = buf.len();
        buf.resize(capacity, 0);
        debug!(len = total, "outbound data phase");

        let mut pulled = 0u64;
        let mut wire = 0u64;
        loop {
            while filled < capacity && pulled < total {
                let left = (total - pulled).min(usize::MAX as u64) as usize;
                let want = (capacity - filled).min(left);
                let n = source.read_chunk(&mut buf[filled..filled + want])?;
                if n == 0 {
                    return Err(ContainerError::PrematureEof {
                        expected: total,
                        transferred: pulled,
                    }
                    .into());
                }
                filled += n;
                pulled += n as u64;
            }

            self.transport.send(&buf[..filled])?;
            wire += filled as u64;
            trace!(len = filled, sent = pulled, "data chunk sent");
            if pulled >= total {
                break;
            }
            filled = 0;
        }

        self.terminate_if_full(wire)
    }

    fn receive_data(
        &mut self,
        code: u16,
        transaction_id: u32,
        sink: &mut dyn ChunkSink,
    ) -> Result<()> {
        let packet = self.transport.max_in_packet_size().max(HEADER_SIZE);
        let mut first = vec![0u8; packet];
        let n = self.transport.recv(&mut first)?;

        let header = peek_header(&first[..n])?;
        if header.kind != ContainerKind::Data {
            return Err(ContainerError::UnexpectedKind {
                expected: ContainerKind::Data,
                actual: header.kind,
            }
            .into());
        }
        if header.code != code {
            return Err(ContainerError::CodeMismatch {
                expected: code,
                actual: header.code,
            }
            .into());
        }
        if header.transaction_id != transaction_id {
            return Err(ContainerError::TransactionMismatch {
                expected: transaction_id,
                actual: header.transaction_id,
            }
            .into());
        }

        let declared = header.payload_len();
        debug!(len = ?declared, "inbound data phase");
        sink.begin(declared)?;

        let mut received = 0u64;
        self.deliver(&first[HEADER_SIZE..n], declared, &mut received, sink)?;

        // Only a full first packet can be followed by more; a short read
        // ends the transfer.
        if n == packet && !is_complete(declared, received) {
            let mut chunk = vec![0u8; self.config.inbound_chunk_size.max(packet)];
            loop {
                let n = self.transport.recv(&mut chunk)?;
                trace!(len = n, received, "data chunk received");
                self.deliver(&chunk[..n], declared, &mut received, sink)?;
                if n < chunk.len() || is_complete(declared, received) {
                    break;
                }
            }
        }

        if let Some(total) = declared {
            if received != total {
                return Err(ContainerError::LengthMismatch {
                    declared: total + HEADER_SIZE as u64,
                    actual: received + HEADER_SIZE as u64,
                }
                .into());
            }
        }
        sink.finish()?;
        Ok(())
    }

    fn deliver(
        &self,
        bytes: &[u8],
        declared: Option<u64>,
        received: &mut u64,
        sink: &mut dyn ChunkSink,
    ) -> Result<()> {
        let after = *received + bytes.len() as u64;
        if let Some(total) = declared {
            if after > total {
                return Err(ContainerError::LengthMismatch {
                    declared: total + HEADER_SIZE as u64,
                    actual: after + HEADER_SIZE as u64,
                }
                .into());
            }
        }
        if !bytes.is_empty() {
            sink.write_chunk(bytes)?;
        }
        *received = after;
        Ok(())
    }

    fn receive_response(&mut self, transaction_id: u32) -> Result<Response> {
        let mut buf = vec![0u8; self.config.max_response_len.max(HEADER_SIZE)];
        let mut n = self.transport.recv(&mut buf)?;
        if n == 0 {
            // Terminator left over from the data phase.
            trace!("skipping zero-length packet before response");
            n = self.transport.recv(&mut buf)?;
        }

        let response = decode_response(&buf[..n])?;
        if response.transaction_id != transaction_id {
            if self.config.strict_response_transaction_id {
                return Err(ContainerError::TransactionMismatch {
                    expected: transaction_id,
                    actual: response.transaction_id,
                }
                .into());
            }
            warn!(
                expected = transaction_id,
                actual = response.transaction_id,
                "response transaction id mismatch ignored"
            );
        }
        Ok(response)
    }

    fn recover(&mut self, transaction_id: u32, err: PtpError) -> Result<Response> {
        if err.is_stall() {
            warn!(transaction_id, error = %err, "endpoint stalled, reading device status");
            match status::clear_and_wait(&mut self.transport, &self.config.recovery) {
                Ok(ClearOutcome::Status(code)) if code != response::OK => {
                    warn!(
                        response = %self.names.response_name(code),
                        transaction_id,
                        "stall resolved as device response"
                    );
                    return Ok(Response::new(code, transaction_id));
                }
                Ok(outcome) => warn!(?outcome, "stall not recoverable"),
                Err(status_err) => warn!(error = %status_err, "status recovery failed"),
            }
        }

        if err.triggers_reset() {
            warn!(transaction_id, error = %err, "transaction failed, resetting device");
            if let Err(reset_err) = self.reset() {
                warn!(error = %reset_err, "device reset failed");
            }
        }
        Err(err)
    }

    /// Issue the class DeviceReset request and close the local session.
    ///
    /// The session is closed even when the request fails.
    pub fn reset(&mut self) -> Result<()> {
        let request = ControlRequest::class(
            ClassRequest::DeviceReset,
            self.transport.interface_number(),
        );
        let result = self.transport.control_request(&request, &mut []);
        self.session.close();
        result?;
        info!("device reset");
        Ok(())
    }

    pub fn device_status(&mut self) -> Result<DeviceStatus> {
        status::get_device_status(&mut self.transport)
    }

    /// Clear halted endpoints and wait for the device to report ready.
    pub fn clear_status(&mut self) -> Result<ClearOutcome> {
        status::clear_and_wait(&mut self.transport, &self.config.recovery)
    }

    /// Ask the device to abort the transfer of `transaction_id`.
    ///
    /// Needs the engine, so it cannot reach a transfer that is running;
    /// use [`canceller`](Self::canceller) for that.
    pub fn cancel(&mut self, transaction_id: u32) -> Result<()> {
        let request = ControlRequest::class(ClassRequest::Cancel, self.transport.interface_number());
        let mut payload = cancel_payload(transaction_id);
        warn!(transaction_id, "cancel requested");
        self.transport.control_request(&request, &mut payload)?;
        Ok(())
    }

    /// Read the extended data of the most recent event, up to `max_len` bytes.
    pub fn extended_event_data(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let request = ControlRequest::class(
            ClassRequest::GetExtendedEventData,
            self.transport.interface_number(),
        );
        let mut buf = vec![0u8; max_len];
        let n = self.transport.control_request(&request, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Read one event from the interrupt endpoint. A timeout is `None`.
    pub fn poll_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        let mut buf = [0u8; INTERRUPT_BUFFER_LEN];
        match self.transport.recv_interrupt(&mut buf, timeout) {
            Ok(n) => {
                let event = Event::decode(&buf[..n.min(buf.len())])?;
                debug!(
                    event = %self.names.event_name(event.code),
                    transaction_id = event.transaction_id,
                    "event"
                );
                Ok(Some(event))
            }
            Err(TransportError::Timeout) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn is_complete(declared: Option<u64>, received: u64) -> bool {
    declared.is_some_and(|total| received >= total)
}
