//! Transport capability for the ptpkit transaction engine.
//!
//! PTP over USB (ISO 15740 Annex D) moves containers over a bulk-out/bulk-in
//! endpoint pair, reports asynchronous events on an interrupt endpoint, and
//! uses class-specific control requests for status, reset and cancel.
//!
//! This crate only names that capability. It does not discover devices,
//! claim interfaces or talk to a USB stack; a backend implements
//! [`Transport`] and hands it to the engine.

pub mod control;
pub mod error;
pub mod mock;
pub mod traits;

pub use control::{ClassRequest, ControlRequest, Direction, Recipient, RequestType};
pub use error::{Result, TransportError};
pub use mock::{MockTransport, TransportCall};
pub use traits::{ControlChannel, Endpoints, Transport};
