//! Little-endian primitives shared by the header, VLR and point codecs.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// Combines the low and high 32-bit halves of a 64-bit field as
/// `high * 2^32 + low`. Exact for any value representable in 53 bits;
/// real LAS point counts stay far below that ceiling.
pub fn combine_u64(low: u32, high: u32) -> u64 {
    ((high as u64) << 32) | low as u64
}

/// Splits a 64-bit field into its (low, high) 32-bit halves.
pub fn split_u64(value: u64) -> (u32, u32) {
    (value as u32, (value >> 32) as u32)
}

/// Decodes a fixed-width, NUL-padded field into a trimmed string.
pub fn read_fixed_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_string()
}

/// Encodes a string into a fixed-width, NUL-padded field, truncating if the
/// string is longer than the field.
pub fn write_fixed_string(out: &mut Vec<u8>, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let n = bytes.len().min(width);
    out.extend_from_slice(&bytes[..n]);
    out.resize(out.len() + (width - n), 0);
}

/// Forward-only little-endian reader over a byte slice.
pub struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> SliceReader<'a> {
    pub fn new(buf: &'a [u8], context: &'static str) -> Self {
        SliceReader { buf, pos: 0, context }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.pos + n > self.buf.len() {
            return Err(FormatError::Truncated {
                context: self.context,
                needed: self.pos + n,
                available: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, FormatError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, FormatError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16, FormatError> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, FormatError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, FormatError> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, FormatError> {
        let low = self.read_u32()?;
        let high = self.read_u32()?;
        Ok(combine_u64(low, high))
    }

    pub fn read_f32(&mut self) -> Result<f32, FormatError> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, FormatError> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        self.take(n)
    }

    pub fn read_string(&mut self, width: usize) -> Result<String, FormatError> {
        Ok(read_fixed_string(self.take(width)?))
    }
}

/// Append-only little-endian writer. Writing into a `Vec` cannot fail, so
/// these helpers stay `Result`-free.
pub struct ByteWriter {
    out: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        ByteWriter { out: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            out: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    pub fn write_u8(&mut self, value: u8) {
        self.out.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.out.push(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.out.extend_from_slice(&buf);
    }

    pub fn write_i16(&mut self, value: i16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_i16(&mut buf, value);
        self.out.extend_from_slice(&buf);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.out.extend_from_slice(&buf);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.out.extend_from_slice(&buf);
    }

    pub fn write_u64(&mut self, value: u64) {
        let (low, high) = split_u64(value);
        self.write_u32(low);
        self.write_u32(high);
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, value);
        self.out.extend_from_slice(&buf);
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, value);
        self.out.extend_from_slice(&buf);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub fn write_string(&mut self, value: &str, width: usize) {
        write_fixed_string(&mut self.out, value, width);
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        ByteWriter::new()
    }
}
