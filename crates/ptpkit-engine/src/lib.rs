//! PTP (ISO 15740) initiator transaction engine.
//!
//! The engine runs the command, data and response phases of one
//! transaction over a [`Transport`](ptpkit_transport::Transport), streams
//! data phases of any size through [`ChunkSink`] / [`ChunkSource`], and
//! recovers from stalled endpoints through the USB device status request.
//!
//! Most callers use [`Initiator`], which serializes transactions behind a
//! single lock and wraps the standard PTP operations.

pub mod cancel;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod initiator;
pub mod names;
pub mod session;
pub mod status;

pub use cancel::Canceller;
pub use config::{EngineConfig, RecoveryPolicy};
pub use data::{
    ChunkSink, ChunkSource, DataPhase, DiscardSink, FileSink, FileSource, ReadSource,
    SliceSource, VecSink, WriteSink,
};
pub use engine::Engine;
pub use error::{PtpError, Result};
pub use initiator::{
    Initiator, ObjectPlacement, ALL_IMAGE_FORMATS, ALL_STORAGE, ROOT_ASSOCIATION,
};
pub use names::{CodeNames, VendorCodeTables, VendorExtension};
pub use session::Session;
pub use status::{clear_and_wait, get_device_status, ClearOutcome, DeviceStatus};
