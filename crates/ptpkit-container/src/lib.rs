//! PTP (ISO 15740) container codec.
//!
//! Every bulk transfer of a transaction is framed as a container with a
//! fixed 12-byte little-endian header:
//! - a 4-byte total length, header included
//! - a 2-byte container kind (command, data, response)
//! - a 2-byte operation or response code
//! - a 4-byte transaction id
//!
//! Command and response containers carry up to five `u32` parameters; data
//! containers carry raw bytes, which for the standard operations are
//! datasets such as [`DeviceInfo`] or [`ObjectInfo`].

pub mod codec;
pub mod codes;
pub mod dataset;
pub mod device_info;
pub mod error;
pub mod event;
pub mod object_info;
pub mod storage_info;

pub use codec::{
    decode_header, decode_response, encode_command, encode_data_header, peek_header, Container,
    ContainerKind, DataBlock, Header, Operation, Params, Response, HEADER_SIZE,
    MAX_PARAM_CONTAINER, MAX_PARAMS, UNKNOWN_LENGTH,
};
pub use dataset::{DatasetReader, DatasetWriter};
pub use device_info::DeviceInfo;
pub use error::{ContainerError, Result};
pub use event::{Event, MAX_EVENT_LEN};
pub use object_info::ObjectInfo;
pub use storage_info::StorageInfo;
