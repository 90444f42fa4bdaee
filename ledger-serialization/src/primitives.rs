//! Primitive codec set.
//!
//! Fixed-width values are big-endian. Unsigned varints are LEB128 and signed
//! `int`/`long` values are zig-zag mapped before varint encoding.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{SerializationError, SerializationResult};

/// Longest LEB128 encoding of a `u32`.
const MAX_VAR_U32_LEN: usize = 5;

/// Longest LEB128 encoding of a `u64`.
const MAX_VAR_U64_LEN: usize = 10;

/// Growable output buffer.
#[derive(Debug, Default, Clone)]
pub struct Output {
    buf: BytesMut,
}

impl Output {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the written bytes.
    pub fn into_vec(self) -> Vec<u8> {
        Vec::from(self.buf)
    }

    /// The underlying buffer, for codecs that frame their own content.
    pub fn buf_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Write raw bytes with no prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Write a boolean as one byte, 0 or 1.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Write a signed byte.
    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    /// Write a short as 2 bytes.
    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    /// Write a UTF-16 code unit as 2 bytes.
    pub fn write_char(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    /// Write a fixed 4-byte unsigned integer.
    pub fn write_u32_fixed(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Write a float as 4 bytes.
    pub fn write_f32(&mut self, value: f32) {
        self.buf.put_f32(value);
    }

    /// Write a double as 8 bytes.
    pub fn write_f64(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    /// Write an unsigned LEB128 varint.
    pub fn write_var_u32(&mut self, value: u32) {
        self.write_var_u64(u64::from(value));
    }

    /// Write an unsigned LEB128 varint.
    pub fn write_var_u64(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.put_u8(value as u8);
    }

    /// Write a zig-zag varint `int`.
    pub fn write_var_i32(&mut self, value: i32) {
        self.write_var_u32(((value << 1) ^ (value >> 31)) as u32);
    }

    /// Write a zig-zag varint `long`.
    pub fn write_var_i64(&mut self, value: i64) {
        self.write_var_u64(((value << 1) ^ (value >> 63)) as u64);
    }

    /// Write a length or count as a varint.
    pub fn write_len(&mut self, len: usize) -> SerializationResult<()> {
        let len = u32::try_from(len).map_err(|_| SerializationError::LimitExceeded {
            what: "length",
            len,
            max: u32::MAX as usize,
        })?;
        self.write_var_u32(len);
        Ok(())
    }

    /// Write a length-prefixed blob.
    pub fn write_blob(&mut self, bytes: &[u8]) -> SerializationResult<()> {
        self.write_len(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Write a string as a UTF-8 blob.
    pub fn write_str(&mut self, value: &str) -> SerializationResult<()> {
        self.write_blob(value.as_bytes())
    }
}

/// Cursor over an input slice.
#[derive(Debug, Clone)]
pub struct Input<'a> {
    buf: &'a [u8],
    total: usize,
}

impl<'a> Input<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buf: data,
            total: data.len(),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.total - self.buf.remaining()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, len: usize) -> SerializationResult<()> {
        let remaining = self.buf.remaining();
        if len > remaining {
            return Err(SerializationError::UnexpectedEof {
                needed: len - remaining,
            });
        }
        Ok(())
    }

    /// Read exactly `len` bytes.
    pub fn read_raw(&mut self, len: usize) -> SerializationResult<&'a [u8]> {
        self.ensure(len)?;
        let data: &'a [u8] = self.buf;
        self.buf.advance(len);
        Ok(&data[..len])
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> SerializationResult<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    /// Read a boolean; only 0 and 1 are accepted.
    pub fn read_bool(&mut self) -> SerializationResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SerializationError::malformed(format!(
                "invalid boolean byte {other:#04x}"
            ))),
        }
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> SerializationResult<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    /// Read a 2-byte short.
    pub fn read_i16(&mut self) -> SerializationResult<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    /// Read a 2-byte UTF-16 code unit.
    pub fn read_char(&mut self) -> SerializationResult<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    /// Read a fixed 4-byte unsigned integer.
    pub fn read_u32_fixed(&mut self) -> SerializationResult<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    /// Read a 4-byte float.
    pub fn read_f32(&mut self) -> SerializationResult<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32())
    }

    /// Read an 8-byte double.
    pub fn read_f64(&mut self) -> SerializationResult<f64> {
        self.ensure(8)?;
        Ok(self.buf.get_f64())
    }

    /// Read an unsigned LEB128 varint that must fit in 32 bits.
    pub fn read_var_u32(&mut self) -> SerializationResult<u32> {
        let value = self.read_var(MAX_VAR_U32_LEN)?;
        u32::try_from(value).map_err(|_| SerializationError::malformed("varint overflows 32 bits"))
    }

    /// Read an unsigned LEB128 varint.
    pub fn read_var_u64(&mut self) -> SerializationResult<u64> {
        self.read_var(MAX_VAR_U64_LEN)
    }

    fn read_var(&mut self, max_len: usize) -> SerializationResult<u64> {
        let mut value: u64 = 0;
        for i in 0..max_len {
            let byte = self.read_u8()?;
            let shift = 7 * i as u32;
            let bits = u64::from(byte & 0x7f);
            if shift == 63 && bits > 1 {
                return Err(SerializationError::malformed("varint overflows 64 bits"));
            }
            value |= bits << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(SerializationError::malformed(format!(
            "varint longer than {max_len} bytes"
        )))
    }

    /// Read a zig-zag varint `int`.
    pub fn read_var_i32(&mut self) -> SerializationResult<i32> {
        let raw = self.read_var_u32()?;
        Ok((raw >> 1) as i32 ^ -((raw & 1) as i32))
    }

    /// Read a zig-zag varint `long`.
    pub fn read_var_i64(&mut self) -> SerializationResult<i64> {
        let raw = self.read_var_u64()?;
        Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
    }

    /// Read a varint length and check it against `max`.
    pub fn read_len(&mut self, what: &'static str, max: usize) -> SerializationResult<usize> {
        let len = self.read_var_u32()? as usize;
        if len > max {
            return Err(SerializationError::LimitExceeded { what, len, max });
        }
        Ok(len)
    }

    /// Read a length-prefixed blob of at most `max` bytes.
    pub fn read_blob(&mut self, max: usize) -> SerializationResult<&'a [u8]> {
        let len = self.read_len("blob", max)?;
        self.read_raw(len)
    }

    /// Read a UTF-8 string blob of at most `max` bytes.
    pub fn read_str(&mut self, max: usize) -> SerializationResult<&'a str> {
        let bytes = self.read_blob(max)?;
        std::str::from_utf8(bytes).map_err(|e| SerializationError::malformed(format!("invalid UTF-8: {e}")))
    }
}
