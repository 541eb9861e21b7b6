//! Thread-safe PTP initiator.
//!
//! [`Initiator`] owns an [`Engine`] behind one mutex. Every call holds the
//! lock for its whole transaction, recovery included, so concurrent callers
//! run strictly one after another. Event polling takes the same lock and
//! therefore only touches the interrupt endpoint while the bulk endpoints
//! are idle. Cancellation is the one exception: it goes out on the control
//! channel while a transaction holds the lock.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ptpkit_container::codes::{operation, response};
use ptpkit_container::{ContainerError, DatasetReader, DeviceInfo, Event, ObjectInfo, Response, StorageInfo};
use ptpkit_transport::Transport;
use tracing::{debug, info};

use crate::cancel::Canceller;
use crate::config::EngineConfig;
use crate::data::{ChunkSink, ChunkSource, DataPhase, SliceSource, VecSink};
use crate::engine::Engine;
use crate::error::{PtpError, Result};
use crate::names::VendorCodeTables;
use crate::status::{ClearOutcome, DeviceStatus};

/// Storage id meaning "all stores" in object queries.
pub const ALL_STORAGE: u32 = 0xFFFF_FFFF;

/// Format filter meaning "image formats only".
pub const ALL_IMAGE_FORMATS: u32 = 0xFFFF_FFFF;

/// Association filter meaning "root of the store".
pub const ROOT_ASSOCIATION: u32 = 0xFFFF_FFFF;

/// Where the device will put an object announced by SendObjectInfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectPlacement {
    pub storage_id: u32,
    pub parent: u32,
    pub handle: u32,
}

/// A PTP initiator bound to one device.
#[derive(Debug)]
pub struct Initiator<T> {
    engine: Mutex<Engine<T>>,
    canceller: Option<Canceller>,
}

impl<T: Transport> Initiator<T> {
    /// Wrap `transport` without talking to the device.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    pub fn with_config(transport: T, config: EngineConfig) -> Self {
        let engine = Engine::with_config(transport, config);
        Self {
            canceller: engine.canceller(),
            engine: Mutex::new(engine),
        }
    }

    /// Bring a freshly claimed device to a known state.
    ///
    /// Resets the device, clears any stalled endpoints, checks that the
    /// device reports ready, then caches its DeviceInfo and vendor tables.
    pub fn attach(transport: T, config: EngineConfig) -> Result<Self> {
        let initiator = Self::with_config(transport, config);
        {
            let mut engine = initiator.lock();
            engine.reset()?;
            let outcome = engine.clear_status()?;
            if outcome != ClearOutcome::Status(response::OK) {
                let status = engine.device_status()?;
                if !status.is_ok() {
                    return Err(PtpError::DeviceNotReady {
                        status: status.code,
                    });
                }
            }
        }

        let info = initiator.refresh_device_info()?;
        info!(
            manufacturer = %info.manufacturer,
            model = %info.model,
            version = %info.device_version,
            "device attached"
        );
        Ok(initiator)
    }

    fn lock(&self) -> MutexGuard<'_, Engine<T>> {
        // Engine state stays consistent across a panic in a caller's sink.
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut Engine<T>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn into_engine(self) -> Engine<T> {
        self.engine
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one transaction and return the device's response as-is.
    pub fn transact(&self, code: u16, params: &[u32], data: DataPhase<'_>) -> Result<Response> {
        self.lock().transact(code, params, data)
    }

    fn run(&self, code: u16, params: &[u32]) -> Result<Response> {
        let mut engine = self.lock();
        let response = engine.transact(code, params, DataPhase::None)?;
        engine.check_ok(&response)?;
        Ok(response)
    }

    fn read(&self, code: u16, params: &[u32]) -> Result<Vec<u8>> {
        let mut engine = self.lock();
        let mut sink = VecSink::with_limit(engine.config().max_buffered_object);
        let response = engine.transact(code, params, DataPhase::Inbound(&mut sink))?;
        engine.check_ok(&response)?;
        Ok(sink.into_inner())
    }

    fn write(&self, code: u16, params: &[u32], source: &mut dyn ChunkSource) -> Result<Response> {
        let mut engine = self.lock();
        let response = engine.transact(code, params, DataPhase::Outbound(source))?;
        engine.check_ok(&response)?;
        Ok(response)
    }

    pub fn is_session_active(&self) -> bool {
        self.lock().session().is_active()
    }

    pub fn session_id(&self) -> u32 {
        self.lock().session().session_id()
    }

    /// Code tables for the attached device's vendor extension.
    pub fn names(&self) -> VendorCodeTables {
        *self.lock().names()
    }

    /// The cached DeviceInfo, fetched on first use.
    pub fn device_info(&self) -> Result<DeviceInfo> {
        if let Some(info) = self.lock().device_info() {
            return Ok(info.clone());
        }
        self.refresh_device_info()
    }

    /// Fetch DeviceInfo from the device and replace the cached copy.
    pub fn refresh_device_info(&self) -> Result<DeviceInfo> {
        let mut engine = self.lock();
        let mut sink = VecSink::with_limit(engine.config().max_buffered_object);
        let response =
            engine.transact(operation::GET_DEVICE_INFO, &[], DataPhase::Inbound(&mut sink))?;
        engine.check_ok(&response)?;
        let info = DeviceInfo::decode(sink.as_slice())?;
        engine.set_device_info(info.clone());
        Ok(info)
    }

    /// Open a session with a host-chosen id and return that id.
    pub fn open_session(&self) -> Result<u32> {
        let mut engine = self.lock();
        if engine.session().is_active() {
            return Err(PtpError::IllegalState("session already open"));
        }
        let session_id = engine.session_mut().next_session_id();
        let response = engine.transact(operation::OPEN_SESSION, &[session_id], DataPhase::None)?;
        engine.check_ok(&response)?;
        engine.session_mut().open(session_id);
        Ok(session_id)
    }

    /// Close the session. Closing an inactive session does nothing, and a
    /// device that reports SessionNotOpen is treated as already closed.
    pub fn close_session(&self) -> Result<()> {
        let mut engine = self.lock();
        if !engine.session().is_active() {
            debug!("no session to close");
            return Ok(());
        }
        let response = engine.transact(operation::CLOSE_SESSION, &[], DataPhase::None)?;
        if response.code == response::SESSION_NOT_OPEN {
            debug!("device had no open session");
        } else {
            engine.check_ok(&response)?;
        }
        engine.session_mut().close();
        Ok(())
    }

    /// Class-level device reset; also closes the session.
    pub fn reset(&self) -> Result<()> {
        self.lock().reset()
    }

    pub fn device_status(&self) -> Result<DeviceStatus> {
        self.lock().device_status()
    }

    /// Clear stalled endpoints and wait for the device to report ready.
    ///
    /// Returns the status code read before clearing.
    pub fn clear_status(&self) -> Result<u16> {
        let mut engine = self.lock();
        let polls = engine.config().recovery.max_polls;
        match engine.clear_status()? {
            ClearOutcome::Status(code) => Ok(code),
            ClearOutcome::Exhausted { last_status } => {
                Err(PtpError::RecoveryExhausted { polls, last_status })
            }
        }
    }

    /// Send the class Cancel request for `transaction_id`.
    ///
    /// With a shared control channel this does not wait for the running
    /// transaction, which then completes with the device's cancel status.
    /// Otherwise the request is sent once the bulk endpoints are idle.
    pub fn cancel(&self, transaction_id: u32) -> Result<()> {
        match &self.canceller {
            Some(canceller) => canceller.cancel(transaction_id),
            None => self.lock().cancel(transaction_id),
        }
    }

    /// Handle for cancelling transfers from other threads.
    pub fn canceller(&self) -> Option<Canceller> {
        self.canceller.clone()
    }

    pub fn extended_event_data(&self, max_len: usize) -> Result<Vec<u8>> {
        self.lock().extended_event_data(max_len)
    }

    /// Wait up to `timeout` for one device event.
    pub fn poll_event(&self, timeout: Duration) -> Result<Option<Event>> {
        self.lock().poll_event(timeout)
    }

    pub fn get_storage_ids(&self) -> Result<Vec<u32>> {
        let payload = self.read(operation::GET_STORAGE_IDS, &[])?;
        Ok(DatasetReader::new(&payload).u32_array("storage_ids")?)
    }

    /// True when `storage_id` is present, false when the device reports it
    /// unavailable (e.g. a removed card).
    pub fn has_store(&self, storage_id: u32) -> Result<bool> {
        let mut engine = self.lock();
        let mut sink = VecSink::with_limit(engine.config().max_buffered_object);
        let response = engine.transact(
            operation::GET_STORAGE_INFO,
            &[storage_id],
            DataPhase::Inbound(&mut sink),
        )?;
        if response.code == response::STORE_NOT_AVAILABLE {
            return Ok(false);
        }
        engine.check_ok(&response)?;
        Ok(true)
    }

    pub fn get_storage_info(&self, storage_id: u32) -> Result<StorageInfo> {
        let payload = self.read(operation::GET_STORAGE_INFO, &[storage_id])?;
        Ok(StorageInfo::decode(&payload)?)
    }

    /// Count objects in `storage_id`, optionally filtered by format and
    /// parent association.
    pub fn get_num_objects(&self, storage_id: u32, format: u32, association: u32) -> Result<u32> {
        let response = self.run(operation::GET_NUM_OBJECTS, &[storage_id, format, association])?;
        first_param(&response)
    }

    pub fn get_object_handles(
        &self,
        storage_id: u32,
        format: u32,
        association: u32,
    ) -> Result<Vec<u32>> {
        let payload = self.read(
            operation::GET_OBJECT_HANDLES,
            &[storage_id, format, association],
        )?;
        Ok(DatasetReader::new(&payload).u32_array("object_handles")?)
    }

    pub fn get_object_info(&self, handle: u32) -> Result<ObjectInfo> {
        let payload = self.read(operation::GET_OBJECT_INFO, &[handle])?;
        Ok(ObjectInfo::decode(&payload)?)
    }

    /// Download an object into memory, bounded by
    /// [`EngineConfig::max_buffered_object`].
    pub fn get_object(&self, handle: u32) -> Result<Vec<u8>> {
        self.read(operation::GET_OBJECT, &[handle])
    }

    /// Stream an object into `sink`.
    pub fn fill_object(&self, handle: u32, sink: &mut dyn ChunkSink) -> Result<()> {
        let mut engine = self.lock();
        let response = engine.transact(operation::GET_OBJECT, &[handle], DataPhase::Inbound(sink))?;
        engine.check_ok(&response)
    }

    pub fn get_thumb(&self, handle: u32) -> Result<Vec<u8>> {
        self.read(operation::GET_THUMB, &[handle])
    }

    /// Read up to `max_bytes` of an object starting at `offset`.
    pub fn get_partial_object(&self, handle: u32, offset: u32, max_bytes: u32) -> Result<Vec<u8>> {
        self.read(operation::GET_PARTIAL_OBJECT, &[handle, offset, max_bytes])
    }

    /// Announce an object the next [`send_object`](Self::send_object) will
    /// transfer. `storage_id` and `parent` may be 0 to let the device choose.
    pub fn send_object_info(
        &self,
        info: &ObjectInfo,
        storage_id: u32,
        parent: u32,
    ) -> Result<ObjectPlacement> {
        let dataset = info.encode();
        let mut source = SliceSource::new(&dataset);
        let response = self.write(operation::SEND_OBJECT_INFO, &[storage_id, parent], &mut source)?;
        Ok(ObjectPlacement {
            storage_id: response.param(0).unwrap_or(storage_id),
            parent: response.param(1).unwrap_or(parent),
            handle: response.param(2).unwrap_or(0),
        })
    }

    /// Stream the object announced by the preceding SendObjectInfo.
    pub fn send_object(&self, source: &mut dyn ChunkSource) -> Result<()> {
        self.write(operation::SEND_OBJECT, &[], source).map(|_| ())
    }

    /// Delete `handle` (or every object with [`ALL_STORAGE`]), optionally
    /// limited to `format`.
    pub fn delete_object(&self, handle: u32, format: u32) -> Result<()> {
        self.run(operation::DELETE_OBJECT, &[handle, format]).map(|_| ())
    }

    pub fn format_store(&self, storage_id: u32, filesystem_format: u32) -> Result<()> {
        self.run(operation::FORMAT_STORE, &[storage_id, filesystem_format])
            .map(|_| ())
    }

    /// Start a capture; completion arrives as CaptureComplete and
    /// ObjectAdded events.
    pub fn initiate_capture(&self, storage_id: u32, format: u32) -> Result<()> {
        self.run(operation::INITIATE_CAPTURE, &[storage_id, format])
            .map(|_| ())
    }

    /// Start an open-ended capture and return its transaction id, which
    /// [`terminate_open_capture`](Self::terminate_open_capture) takes.
    pub fn initiate_open_capture(&self, storage_id: u32, format: u32) -> Result<u32> {
        let response = self.run(operation::INITIATE_OPEN_CAPTURE, &[storage_id, format])?;
        Ok(response.transaction_id)
    }

    pub fn terminate_open_capture(&self, transaction_id: u32) -> Result<()> {
        self.run(operation::TERMINATE_OPEN_CAPTURE, &[transaction_id])
            .map(|_| ())
    }

    /// Move an object to another store or association.
    pub fn move_object(&self, handle: u32, storage_id: u32, parent: u32) -> Result<()> {
        self.run(operation::MOVE_OBJECT, &[handle, storage_id, parent])
            .map(|_| ())
    }

    /// Copy an object and return the new object's handle.
    pub fn copy_object(&self, handle: u32, storage_id: u32, parent: u32) -> Result<u32> {
        let response = self.run(operation::COPY_OBJECT, &[handle, storage_id, parent])?;
        first_param(&response)
    }

    pub fn set_object_protection(&self, handle: u32, protection: u16) -> Result<()> {
        self.run(
            operation::SET_OBJECT_PROTECTION,
            &[handle, u32::from(protection)],
        )
        .map(|_| ())
    }

    /// Raw DevicePropDesc dataset for `property`.
    pub fn get_device_prop_desc(&self, property: u16) -> Result<Vec<u8>> {
        self.read(operation::GET_DEVICE_PROP_DESC, &[u32::from(property)])
    }

    /// Raw current value of `property`, encoded per its datatype.
    pub fn get_device_prop_value(&self, property: u16) -> Result<Vec<u8>> {
        self.read(operation::GET_DEVICE_PROP_VALUE, &[u32::from(property)])
    }

    pub fn set_device_prop_value(&self, property: u16, value: &[u8]) -> Result<()> {
        let mut source = SliceSource::new(value);
        self.write(
            operation::SET_DEVICE_PROP_VALUE,
            &[u32::from(property)],
            &mut source,
        )
        .map(|_| ())
    }

    pub fn reset_device_prop_value(&self, property: u16) -> Result<()> {
        self.run(operation::RESET_DEVICE_PROP_VALUE, &[u32::from(property)])
            .map(|_| ())
    }

    /// Power the device down. The device closes all sessions.
    pub fn power_down(&self) -> Result<()> {
        self.run_closing(operation::POWER_DOWN)
    }

    /// Bulk ResetDevice operation. The device closes all sessions.
    pub fn reset_device(&self) -> Result<()> {
        self.run_closing(operation::RESET_DEVICE)
    }

    pub fn self_test(&self, test_type: u16) -> Result<()> {
        self.run(operation::SELF_TEST, &[u32::from(test_type)])
            .map(|_| ())
    }

    fn run_closing(&self, code: u16) -> Result<()> {
        let mut engine = self.lock();
        let response = engine.transact(code, &[], DataPhase::None)?;
        engine.check_ok(&response)?;
        engine.session_mut().close();
        Ok(())
    }
}

fn first_param(response: &Response) -> Result<u32> {
    response
        .param(0)
        .ok_or(PtpError::Protocol(ContainerError::MalformedParams { len: 0 }))
}
