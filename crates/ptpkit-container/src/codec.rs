use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{ContainerError, Result};

/// Container header: length (4) + kind (2) + code (2) + transaction id (4).
pub const HEADER_SIZE: usize = 12;

/// Maximum positional parameters in a command or response container.
pub const MAX_PARAMS: usize = 5;

/// Largest command/response container on the wire.
pub const MAX_PARAM_CONTAINER: usize = HEADER_SIZE + 4 * MAX_PARAMS;

/// Length value for data containers too large for a `u32` length field.
///
/// Inbound data carrying this length is read until a short transfer.
pub const UNKNOWN_LENGTH: u32 = 0xFFFF_FFFF;

/// The three container types that travel on the bulk endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum ContainerKind {
    Command = 1,
    Data = 2,
    Response = 3,
}

impl ContainerKind {
    /// The wire value of this kind.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for ContainerKind {
    type Error = ContainerError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            1 => Ok(ContainerKind::Command),
            2 => Ok(ContainerKind::Data),
            3 => Ok(ContainerKind::Response),
            other => Err(ContainerError::UnknownContainerKind(other)),
        }
    }
}

/// A decoded container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Total container length including this header.
    pub length: u32,
    pub kind: ContainerKind,
    /// Operation code (command/data) or response code (response).
    pub code: u16,
    pub transaction_id: u32,
}

impl Header {
    /// Append this header to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_u32_le(self.length);
        dst.put_u16_le(self.kind.as_u16());
        dst.put_u16_le(self.code);
        dst.put_u32_le(self.transaction_id);
    }

    /// Payload bytes the header declares, or `None` for [`UNKNOWN_LENGTH`].
    pub fn payload_len(&self) -> Option<u64> {
        if self.length == UNKNOWN_LENGTH {
            return None;
        }
        Some(u64::from(self.length).saturating_sub(HEADER_SIZE as u64))
    }
}

/// Decode a header from the start of a streamed container.
///
/// Only the first [`HEADER_SIZE`] bytes are examined; the declared length is
/// not compared with `src.len()` because the rest of the container may still
/// be in flight.
pub fn peek_header(src: &[u8]) -> Result<Header> {
    if src.len() < HEADER_SIZE {
        return Err(ContainerError::Truncated {
            needed: HEADER_SIZE,
            available: src.len(),
        });
    }

    let mut cursor = &src[..HEADER_SIZE];
    let length = cursor.get_u32_le();
    let kind = ContainerKind::try_from(cursor.get_u16_le())?;
    let code = cursor.get_u16_le();
    let transaction_id = cursor.get_u32_le();

    if (length as usize) < HEADER_SIZE {
        return Err(ContainerError::LengthMismatch {
            declared: u64::from(length),
            actual: src.len() as u64,
        });
    }

    Ok(Header {
        length,
        kind,
        code,
        transaction_id,
    })
}

/// Decode the header of a complete, non-streamed container.
///
/// `src` must hold exactly the bytes the transport delivered for this
/// container; a declared length that disagrees is a [`LengthMismatch`].
///
/// [`LengthMismatch`]: ContainerError::LengthMismatch
pub fn decode_header(src: &[u8]) -> Result<Header> {
    let header = peek_header(src)?;
    if header.length as usize != src.len() {
        return Err(ContainerError::LengthMismatch {
            declared: u64::from(header.length),
            actual: src.len() as u64,
        });
    }
    Ok(header)
}

/// Up to [`MAX_PARAMS`] positional `u32` parameters.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Params {
    values: [u32; MAX_PARAMS],
    len: u8,
}

impl Params {
    /// Collect parameters, rejecting more than [`MAX_PARAMS`].
    pub fn new(values: &[u32]) -> Result<Self> {
        if values.len() > MAX_PARAMS {
            return Err(ContainerError::InvalidArgument {
                count: values.len(),
                max: MAX_PARAMS,
            });
        }
        let mut params = Self::default();
        params.values[..values.len()].copy_from_slice(values);
        params.len = values.len() as u8;
        Ok(params)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.values[..usize::from(self.len)]
    }

    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The parameter at `index`, if present.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.as_slice().get(index).copied()
    }

    fn decode(src: &[u8]) -> Result<Self> {
        if src.len() % 4 != 0 || src.len() > 4 * MAX_PARAMS {
            return Err(ContainerError::MalformedParams { len: src.len() });
        }
        let mut params = Self::default();
        for (slot, chunk) in params.values.iter_mut().zip(src.chunks_exact(4)) {
            *slot = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        params.len = (src.len() / 4) as u8;
        Ok(params)
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl TryFrom<&[u32]> for Params {
    type Error = ContainerError;

    fn try_from(values: &[u32]) -> Result<Self> {
        Self::new(values)
    }
}

/// A command container: the operation the host asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub code: u16,
    pub transaction_id: u32,
    pub params: Params,
}

/// A response container: the device's verdict on one transaction.
///
/// Callers must check [`Response::is_ok`] before trusting positional
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub transaction_id: u32,
    pub params: Params,
}

impl Response {
    /// A parameterless response carrying `code`.
    pub fn new(code: u16, transaction_id: u32) -> Self {
        Self {
            code,
            transaction_id,
            params: Params::default(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == crate::codes::response::OK
    }

    /// The positional parameter at `index`, if the device sent one.
    pub fn param(&self, index: usize) -> Option<u32> {
        self.params.get(index)
    }
}

/// A data container held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    pub code: u16,
    pub transaction_id: u32,
    pub payload: Bytes,
}

/// One container on the bulk endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    Command(Operation),
    Data(DataBlock),
    Response(Response),
}

impl Container {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Command(_) => ContainerKind::Command,
            Container::Data(_) => ContainerKind::Data,
            Container::Response(_) => ContainerKind::Response,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Container::Command(op) => op.code,
            Container::Data(data) => data.code,
            Container::Response(resp) => resp.code,
        }
    }

    pub fn transaction_id(&self) -> u32 {
        match self {
            Container::Command(op) => op.transaction_id,
            Container::Data(data) => data.transaction_id,
            Container::Response(resp) => resp.transaction_id,
        }
    }

    /// The total wire size of this container (header + payload).
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE
            + match self {
                Container::Command(op) => 4 * op.params.len(),
                Container::Data(data) => data.payload.len(),
                Container::Response(resp) => 4 * resp.params.len(),
            }
    }

    /// Encode this container into the wire format.
    ///
    /// Wire format:
    /// ```text
    /// ┌────────────┬──────────┬──────────┬──────────────┬──────────────────────┐
    /// │ Length     │ Kind     │ Code     │ Transaction  │ Payload              │
    /// │ (4B LE)    │ (2B LE)  │ (2B LE)  │ (4B LE)      │ u32 params or bytes  │
    /// └────────────┴──────────┴──────────┴──────────────┴──────────────────────┘
    /// ```
    pub fn encode(&self, dst: &mut BytesMut) {
        let length = u32::try_from(self.wire_len()).unwrap_or(UNKNOWN_LENGTH);
        Header {
            length,
            kind: self.kind(),
            code: self.code(),
            transaction_id: self.transaction_id(),
        }
        .encode(dst);
        match self {
            Container::Command(Operation { params, .. })
            | Container::Response(Response { params, .. }) => {
                for value in params.as_slice() {
                    dst.put_u32_le(*value);
                }
            }
            Container::Data(data) => dst.put_slice(&data.payload),
        }
    }

    /// Decode one complete container.
    pub fn decode(src: &[u8]) -> Result<Self> {
        let header = decode_header(src)?;
        let body = &src[HEADER_SIZE..];
        trace!(
            kind = ?header.kind,
            code = header.code,
            transaction_id = header.transaction_id,
            len = src.len(),
            "decoded container"
        );
        Ok(match header.kind {
            ContainerKind::Command => Container::Command(Operation {
                code: header.code,
                transaction_id: header.transaction_id,
                params: Params::decode(body)?,
            }),
            ContainerKind::Response => Container::Response(Response {
                code: header.code,
                transaction_id: header.transaction_id,
                params: Params::decode(body)?,
            }),
            ContainerKind::Data => Container::Data(DataBlock {
                code: header.code,
                transaction_id: header.transaction_id,
                payload: Bytes::copy_from_slice(body),
            }),
        })
    }
}

/// Encode a command container.
///
/// Fails with [`ContainerError::InvalidArgument`] for more than
/// [`MAX_PARAMS`] parameters, before anything is written to `dst`.
pub fn encode_command(
    code: u16,
    transaction_id: u32,
    params: &[u32],
    dst: &mut BytesMut,
) -> Result<()> {
    let params = Params::new(params)?;
    Container::Command(Operation {
        code,
        transaction_id,
        params,
    })
    .encode(dst);
    Ok(())
}

/// Encode the header of a data container whose payload follows separately.
pub fn encode_data_header(payload_len: u64, code: u16, transaction_id: u32, dst: &mut BytesMut) {
    let length = payload_len
        .checked_add(HEADER_SIZE as u64)
        .and_then(|total| u32::try_from(total).ok())
        .filter(|total| *total != UNKNOWN_LENGTH)
        .unwrap_or(UNKNOWN_LENGTH);
    Header {
        length,
        kind: ContainerKind::Data,
        code,
        transaction_id,
    }
    .encode(dst);
}

/// Decode a complete response container.
pub fn decode_response(src: &[u8]) -> Result<Response> {
    match Container::decode(src)? {
        Container::Response(resp) => Ok(resp),
        other => Err(ContainerError::UnexpectedKind {
            expected: ContainerKind::Response,
            actual: other.kind(),
        }),
    }
}
