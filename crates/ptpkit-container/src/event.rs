//! Event containers from the interrupt endpoint.
//!
//! Events share the bulk header layout but use container kind 4 and carry
//! at most three parameters. They never appear on the bulk endpoints.

use bytes::{Buf, BufMut, BytesMut};

use crate::codec::{Params, HEADER_SIZE};
use crate::error::{ContainerError, Result};

/// Container kind value of an event.
pub const EVENT_KIND: u16 = 4;

/// Maximum parameters an event carries.
pub const MAX_EVENT_PARAMS: usize = 3;

/// Largest event container on the wire.
pub const MAX_EVENT_LEN: usize = HEADER_SIZE + 4 * MAX_EVENT_PARAMS;

/// An asynchronous device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub code: u16,
    /// Transaction the event relates to, or 0.
    pub transaction_id: u32,
    pub params: Params,
}

impl Event {
    /// Decode one interrupt transfer.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(ContainerError::Truncated {
                needed: HEADER_SIZE,
                available: src.len(),
            });
        }

        let mut cursor = src;
        let length = cursor.get_u32_le() as usize;
        let kind = cursor.get_u16_le();
        let code = cursor.get_u16_le();
        let transaction_id = cursor.get_u32_le();

        if kind != EVENT_KIND {
            return Err(ContainerError::UnknownContainerKind(kind));
        }
        // Some devices pad interrupt transfers; trust the declared length.
        if length < HEADER_SIZE || length > src.len() {
            return Err(ContainerError::LengthMismatch {
                declared: length as u64,
                actual: src.len() as u64,
            });
        }

        let body = &src[HEADER_SIZE..length];
        if body.len() % 4 != 0 || body.len() > 4 * MAX_EVENT_PARAMS {
            return Err(ContainerError::MalformedParams { len: body.len() });
        }
        let values: Vec<u32> = body
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            code,
            transaction_id,
            params: Params::new(&values)?,
        })
    }

    /// Encode this event as the device would send it.
    pub fn encode(&self, dst: &mut BytesMut) {
        let params = &self.params.as_slice()[..self.params.len().min(MAX_EVENT_PARAMS)];
        dst.put_u32_le((HEADER_SIZE + 4 * params.len()) as u32);
        dst.put_u16_le(EVENT_KIND);
        dst.put_u16_le(self.code);
        dst.put_u32_le(self.transaction_id);
        for value in params {
            dst.put_u32_le(*value);
        }
    }
}
