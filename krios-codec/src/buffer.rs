//! Growable byte container with typed endian reads and writes.
//!
//! All crypto and codec output is materialized through plain byte buffers;
//! this type adds a read cursor and checked typed access on top of a `Vec`
//! so out-of-bounds reads surface as errors instead of panics.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("read of {wanted} bytes past the end of the buffer ({left} left)")]
    OutOfBoundsRead { wanted: usize, left: usize },

    #[error("error decoding hex value")]
    BadHex,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    bytes: Vec<u8>,
    pos: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Buffer {
            bytes: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        let bytes = hex::decode(hex).map_err(|_| Error::BadHex)?;
        Ok(Buffer::from(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Byte offset of the read cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    /// Bytes left between the read cursor and the end.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u16_be(&mut self, v: u16) {
        self.write(&v.to_be_bytes());
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32_be(&mut self, v: u32) {
        self.write(&v.to_be_bytes());
    }

    pub fn write_u64_le(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u64_be(&mut self, v: u64) {
        self.write(&v.to_be_bytes());
    }

    pub fn read_exact(&mut self, n: usize) -> Result<&[u8], Error> {
        if n > self.remaining() {
            return Err(Error::OutOfBoundsRead {
                wanted: n,
                left: self.remaining(),
            });
        }

        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, Error> {
        let raw = self.read_exact(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    pub fn read_u16_be(&mut self) -> Result<u16, Error> {
        let raw = self.read_exact(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, Error> {
        let raw = self.read_exact(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, Error> {
        let raw = self.read_exact(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, Error> {
        let raw = self.read_exact(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_u64_be(&mut self) -> Result<u64, Error> {
        let raw = self.read_exact(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Ok(u64::from_be_bytes(buf))
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Buffer { bytes, pos: 0 }
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Buffer {
            bytes: bytes.to_vec(),
            pos: 0,
        }
    }
}

impl From<Buffer> for Vec<u8> {
    fn from(buffer: Buffer) -> Self {
        buffer.bytes
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl crate::encode::Write for Buffer {
    type Error = std::convert::Infallible;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.write(buf);
        Ok(())
    }
}
