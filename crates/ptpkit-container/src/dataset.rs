//! Primitive encodings used inside data-phase datasets.
//!
//! Integers are little-endian. Strings are a `u8` character count that
//! includes the terminating NUL, followed by UCS-2LE code units; a count of
//! zero is the empty string. Arrays are a `u32` element count followed by
//! the elements.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{ContainerError, Result};

/// Longest string a dataset can carry, NUL included.
pub const MAX_STRING_CHARS: usize = 255;

/// Sequential reader over a dataset payload.
pub struct DatasetReader<'a> {
    buf: &'a [u8],
}

impl<'a> DatasetReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn need(&self, field: &'static str, bytes: usize) -> Result<()> {
        if self.buf.len() < bytes {
            return Err(ContainerError::Dataset {
                field,
                reason: "truncated",
            });
        }
        Ok(())
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8> {
        self.need(field, 1)?;
        Ok(self.buf.get_u8())
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16> {
        self.need(field, 2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32> {
        self.need(field, 4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn u64(&mut self, field: &'static str) -> Result<u64> {
        self.need(field, 8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn string(&mut self, field: &'static str) -> Result<String> {
        let chars = usize::from(self.u8(field)?);
        if chars == 0 {
            return Ok(String::new());
        }
        self.need(field, 2 * chars)?;
        let mut units: Vec<u16> = (0..chars).map(|_| self.buf.get_u16_le()).collect();
        while units.last() == Some(&0) {
            units.pop();
        }
        Ok(String::from_utf16_lossy(&units))
    }

    pub fn u16_array(&mut self, field: &'static str) -> Result<Vec<u16>> {
        let count = self.array_len(field, 2)?;
        Ok((0..count).map(|_| self.buf.get_u16_le()).collect())
    }

    pub fn u32_array(&mut self, field: &'static str) -> Result<Vec<u32>> {
        let count = self.array_len(field, 4)?;
        Ok((0..count).map(|_| self.buf.get_u32_le()).collect())
    }

    fn array_len(&mut self, field: &'static str, elem_size: usize) -> Result<usize> {
        let count = self.u32(field)? as usize;
        // Check before allocating; a corrupt count must not reserve gigabytes.
        let bytes = count.checked_mul(elem_size).ok_or(ContainerError::Dataset {
            field,
            reason: "array length overflows",
        })?;
        self.need(field, bytes)?;
        Ok(count)
    }
}

/// Builder for dataset payloads.
#[derive(Debug, Default)]
pub struct DatasetWriter {
    buf: BytesMut,
}

impl DatasetWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16_le(value);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64_le(value);
        self
    }

    /// Append a string, truncating it to [`MAX_STRING_CHARS`] including NUL.
    pub fn string(&mut self, value: &str) -> &mut Self {
        if value.is_empty() {
            return self.u8(0);
        }
        let mut units: Vec<u16> = value.encode_utf16().take(MAX_STRING_CHARS - 1).collect();
        units.push(0);
        self.buf.put_u8(units.len() as u8);
        for unit in units {
            self.buf.put_u16_le(unit);
        }
        self
    }

    pub fn u16_array(&mut self, values: &[u16]) -> &mut Self {
        self.buf.put_u32_le(values.len() as u32);
        for value in values {
            self.buf.put_u16_le(*value);
        }
        self
    }

    pub fn u32_array(&mut self, values: &[u32]) -> &mut Self {
        self.buf.put_u32_le(values.len() as u32);
        for value in values {
            self.buf.put_u32_le(*value);
        }
        self
    }

    pub fn finish(self) -> BytesMut {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_wire_format() {
        let mut w = DatasetWriter::new();
        w.string("Hi");
        let buf = w.finish();
        assert_eq!(buf.as_ref(), &[3, b'H', 0, b'i', 0, 0, 0]);

        let mut r = DatasetReader::new(&buf);
        assert_eq!(r.string("name").unwrap(), "Hi");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn empty_string_is_single_zero() {
        let mut w = DatasetWriter::new();
        w.string("");
        assert_eq!(w.finish().as_ref(), &[0]);
    }

    #[test]
    fn long_strings_are_truncated() {
        let long = "x".repeat(400);
        let mut w = DatasetWriter::new();
        w.string(&long);
        let buf = w.finish();
        assert_eq!(buf[0] as usize, MAX_STRING_CHARS);

        let mut r = DatasetReader::new(&buf);
        assert_eq!(r.string("s").unwrap().len(), MAX_STRING_CHARS - 1);
    }

    #[test]
    fn arrays() {
        let mut w = DatasetWriter::new();
        w.u16_array(&[0x1001, 0x1002]).u32_array(&[0x0001_0001]);
        let buf = w.finish();

        let mut r = DatasetReader::new(&buf);
        assert_eq!(r.u16_array("ops").unwrap(), vec![0x1001, 0x1002]);
        assert_eq!(r.u32_array("ids").unwrap(), vec![0x0001_0001]);
    }

    #[test]
    fn corrupt_array_count_is_truncation() {
        let mut w = DatasetWriter::new();
        w.u32(0x4000_0000).u16(1);
        let buf = w.finish();
        let err = DatasetReader::new(&buf).u16_array("ops").unwrap_err();
        assert!(matches!(
            err,
            ContainerError::Dataset {
                field: "ops",
                reason: "truncated"
            }
        ));
    }

    #[test]
    fn truncated_scalar_names_field() {
        let err = DatasetReader::new(&[1, 2]).u32("storage_id").unwrap_err();
        assert!(matches!(
            err,
            ContainerError::Dataset {
                field: "storage_id",
                ..
            }
        ));
    }
}
