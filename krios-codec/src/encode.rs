//! Streaming CBOR writer.
//!
//! Heads always use the shortest encoding. The [`Encoder`] keeps a stack of
//! nesting frames mirroring the reader side: definite containers close
//! themselves once the declared count is written, indefinite ones on
//! [`Encoder::end`], and writing the wrong kind of item inside an open
//! string sequence is rejected.

use crate::data::{Int, Tag};

/// Sink for encoded bytes.
pub trait Write {
    type Error;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error>;
}

impl Write for Vec<u8> {
    type Error = std::convert::Infallible;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.extend_from_slice(buf);
        Ok(())
    }
}

impl<W: Write> Write for &mut W {
    type Error = W::Error;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        (*self).write_all(buf)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    #[error("error writing encoded bytes")]
    Write(E),

    #[error("container length mismatch")]
    ContainerMismatch,

    #[error("{0}")]
    Message(&'static str),
}

impl<E> Error<E> {
    pub fn write(e: E) -> Self {
        Error::Write(e)
    }

    pub fn message(msg: &'static str) -> Self {
        Error::Message(msg)
    }
}

/// Largest chunk the Cardano convention allows inside an indefinite-length
/// byte or text string.
pub const MAX_CHUNK_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Array,
    Map,
    Bytes,
    Text,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    /// Items still expected for definite containers, `None` for indefinite
    remaining: Option<u64>,
}

/// Streaming CBOR writer over any [`Write`] sink.
pub struct Encoder<W> {
    writer: W,
    stack: Vec<Frame>,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder {
            writer,
            stack: Vec::new(),
        }
    }

    /// Terminates a chain of writes.
    pub fn ok(&mut self) -> Result<(), Error<W::Error>> {
        Ok(())
    }

    /// True once every opened frame has been closed.
    pub fn finished(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn encode<T: crate::Encode>(
        &mut self,
        value: &T,
    ) -> Result<&mut Self, Error<W::Error>> {
        value.encode(self)?;
        Ok(self)
    }

    pub fn u8(&mut self, v: u8) -> Result<&mut Self, Error<W::Error>> {
        self.u64(v as u64)
    }

    pub fn u16(&mut self, v: u16) -> Result<&mut Self, Error<W::Error>> {
        self.u64(v as u64)
    }

    pub fn u32(&mut self, v: u32) -> Result<&mut Self, Error<W::Error>> {
        self.u64(v as u64)
    }

    pub fn u64(&mut self, v: u64) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.head(0, v)?;
        self.note_item();
        Ok(self)
    }

    pub fn i8(&mut self, v: i8) -> Result<&mut Self, Error<W::Error>> {
        self.i64(v as i64)
    }

    pub fn i32(&mut self, v: i32) -> Result<&mut Self, Error<W::Error>> {
        self.i64(v as i64)
    }

    pub fn i64(&mut self, v: i64) -> Result<&mut Self, Error<W::Error>> {
        self.int(Int::from(v))
    }

    /// Writes any integer in the CBOR range, major type 1 for negatives
    /// (encoded as `-1 - n`).
    pub fn int(&mut self, v: Int) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        let raw = i128::from(v);
        if raw >= 0 {
            self.head(0, raw as u64)?;
        } else {
            self.head(1, (-1 - raw) as u64)?;
        }
        self.note_item();
        Ok(self)
    }

    /// Writes a definite byte string, or one chunk when an indefinite byte
    /// string is open.
    pub fn bytes(&mut self, v: &[u8]) -> Result<&mut Self, Error<W::Error>> {
        if self.in_string_frame(FrameKind::Bytes) {
            self.head(2, v.len() as u64)?;
            self.put(v)?;
            return Ok(self);
        }

        self.guard_data()?;
        self.head(2, v.len() as u64)?;
        self.put(v)?;
        self.note_item();
        Ok(self)
    }

    /// Writes a byte string applying the Cardano chunking rule: definite up
    /// to 64 bytes, an indefinite train of 64-byte chunks above.
    pub fn bounded_bytes(&mut self, v: &[u8]) -> Result<&mut Self, Error<W::Error>> {
        if v.len() <= MAX_CHUNK_SIZE {
            return self.bytes(v);
        }

        self.begin_bytes()?;
        for chunk in v.chunks(MAX_CHUNK_SIZE) {
            self.bytes(chunk)?;
        }
        self.end()
    }

    /// Writes a definite text string, or one chunk when an indefinite text
    /// string is open.
    pub fn str(&mut self, v: &str) -> Result<&mut Self, Error<W::Error>> {
        if self.in_string_frame(FrameKind::Text) {
            self.head(3, v.len() as u64)?;
            self.put(v.as_bytes())?;
            return Ok(self);
        }

        self.guard_data()?;
        self.head(3, v.len() as u64)?;
        self.put(v.as_bytes())?;
        self.note_item();
        Ok(self)
    }

    /// Writes a text string applying the Cardano chunking rule, splitting on
    /// character boundaries so every chunk stays valid utf-8.
    pub fn bounded_str(&mut self, v: &str) -> Result<&mut Self, Error<W::Error>> {
        if v.len() <= MAX_CHUNK_SIZE {
            return self.str(v);
        }

        self.begin_str()?;
        let mut rest = v;
        while !rest.is_empty() {
            let mut cut = rest.len().min(MAX_CHUNK_SIZE);
            while !rest.is_char_boundary(cut) {
                cut -= 1;
            }
            self.str(&rest[..cut])?;
            rest = &rest[cut..];
        }
        self.end()
    }

    pub fn array(&mut self, len: u64) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.head(4, len)?;
        self.open_frame(FrameKind::Array, Some(len));
        Ok(self)
    }

    pub fn begin_array(&mut self) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(&[0x9f])?;
        self.open_frame(FrameKind::Array, None);
        Ok(self)
    }

    pub fn map(&mut self, len: u64) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.head(5, len)?;
        self.open_frame(FrameKind::Map, Some(len.saturating_mul(2)));
        Ok(self)
    }

    pub fn begin_map(&mut self) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(&[0xbf])?;
        self.open_frame(FrameKind::Map, None);
        Ok(self)
    }

    pub fn begin_bytes(&mut self) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(&[0x5f])?;
        self.open_frame(FrameKind::Bytes, None);
        Ok(self)
    }

    pub fn begin_str(&mut self) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(&[0x7f])?;
        self.open_frame(FrameKind::Text, None);
        Ok(self)
    }

    /// Closes the innermost indefinite container.
    pub fn end(&mut self) -> Result<&mut Self, Error<W::Error>> {
        match self.stack.pop() {
            Some(Frame {
                remaining: None, ..
            }) => {
                self.put(&[0xff])?;
                self.note_item();
                Ok(self)
            }
            _ => Err(Error::ContainerMismatch),
        }
    }

    pub fn tag(&mut self, tag: Tag) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.head(6, tag.as_u64())?;
        Ok(self)
    }

    pub fn bool(&mut self, v: bool) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(&[if v { 0xf5 } else { 0xf4 }])?;
        self.note_item();
        Ok(self)
    }

    pub fn null(&mut self) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(&[0xf6])?;
        self.note_item();
        Ok(self)
    }

    pub fn undefined(&mut self) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(&[0xf7])?;
        self.note_item();
        Ok(self)
    }

    pub fn f64(&mut self, v: f64) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(&[0xfb])?;
        self.put(&v.to_be_bytes())?;
        self.note_item();
        Ok(self)
    }

    /// Splices an already-encoded CBOR item verbatim. The slice must hold
    /// exactly one item for the frame accounting to stay correct.
    pub fn preencoded(&mut self, cbor: &[u8]) -> Result<&mut Self, Error<W::Error>> {
        self.guard_data()?;
        self.put(cbor)?;
        self.note_item();
        Ok(self)
    }

    /// Writes a positive (tag 2) or negative (tag 3) bignum from its
    /// magnitude bytes, stripped of leading zeros.
    pub fn bignum(&mut self, magnitude: &[u8], negative: bool) -> Result<&mut Self, Error<W::Error>> {
        let tag = if negative {
            Tag::NEG_BIGNUM
        } else {
            Tag::POS_BIGNUM
        };

        let start = magnitude
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(magnitude.len());

        self.tag(tag)?;
        self.bytes(&magnitude[start..])
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), Error<W::Error>> {
        self.writer.write_all(bytes).map_err(Error::Write)
    }

    fn head(&mut self, major: u8, value: u64) -> Result<(), Error<W::Error>> {
        let m = major << 5;

        if value < 24 {
            self.put(&[m | value as u8])
        } else if value <= 0xff {
            self.put(&[m | 24, value as u8])
        } else if value <= 0xffff {
            self.put(&[m | 25])?;
            self.put(&(value as u16).to_be_bytes())
        } else if value <= 0xffff_ffff {
            self.put(&[m | 26])?;
            self.put(&(value as u32).to_be_bytes())
        } else {
            self.put(&[m | 27])?;
            self.put(&value.to_be_bytes())
        }
    }

    fn open_frame(&mut self, kind: FrameKind, remaining: Option<u64>) {
        match remaining {
            Some(0) => self.note_item(),
            _ => self.stack.push(Frame { kind, remaining }),
        }
    }

    fn note_item(&mut self) {
        while let Some(top) = self.stack.last_mut() {
            match &mut top.remaining {
                Some(r) => {
                    *r -= 1;
                    if *r == 0 {
                        self.stack.pop();
                        continue;
                    }
                }
                None => {}
            }
            break;
        }
    }

    fn in_string_frame(&self, kind: FrameKind) -> bool {
        matches!(self.stack.last(), Some(f) if f.kind == kind && f.remaining.is_none())
    }

    /// Open string sequences only accept chunks of their own kind.
    fn guard_data(&self) -> Result<(), Error<W::Error>> {
        match self.stack.last() {
            Some(f) if matches!(f.kind, FrameKind::Bytes | FrameKind::Text) => {
                Err(Error::Message("expected string chunk"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex<F>(f: F) -> String
    where
        F: FnOnce(&mut Encoder<&mut Vec<u8>>),
    {
        let mut out = Vec::new();
        let mut e = Encoder::new(&mut out);
        f(&mut e);
        hex::encode(out)
    }

    #[test]
    fn unsigned_heads_are_shortest_form() {
        assert_eq!(to_hex(|e| void(e.u64(0))), "00");
        assert_eq!(to_hex(|e| void(e.u64(23))), "17");
        assert_eq!(to_hex(|e| void(e.u64(24))), "1818");
        assert_eq!(to_hex(|e| void(e.u64(0x1ff))), "1901ff");
        assert_eq!(to_hex(|e| void(e.u64(u64::MAX))), "1bffffffffffffffff");
    }

    #[test]
    fn negative_heads_are_shortest_form() {
        assert_eq!(to_hex(|e| void(e.i64(-1))), "20");
        assert_eq!(to_hex(|e| void(e.i64(-25))), "3818");
        assert_eq!(
            to_hex(|e| void(e.int(Int::try_from(-(1i128 << 64)).unwrap()))),
            "3bffffffffffffffff"
        );
    }

    #[test]
    fn bounded_bytes_chunks_above_64() {
        let payload = vec![0xaa; 100];
        let encoded = to_hex(|e| void(e.bounded_bytes(&payload)));

        let expected = format!(
            "5f5840{}5824{}ff",
            "aa".repeat(64),
            "aa".repeat(36)
        );
        assert_eq!(encoded, expected);

        let short = vec![0xaa; 64];
        assert_eq!(
            to_hex(|e| void(e.bounded_bytes(&short))),
            format!("5840{}", "aa".repeat(64))
        );
    }

    #[test]
    fn end_requires_an_open_indefinite_frame() {
        let mut out = Vec::new();
        let mut e = Encoder::new(&mut out);
        assert!(matches!(e.end(), Err(Error::ContainerMismatch)));

        e.array(1).unwrap();
        assert!(matches!(e.end(), Err(Error::ContainerMismatch)));
    }

    #[test]
    fn string_frames_reject_other_items() {
        let mut out = Vec::new();
        let mut e = Encoder::new(&mut out);
        e.begin_bytes().unwrap();
        assert!(matches!(e.u64(1), Err(Error::Message(_))));
        e.bytes(&[0x00]).unwrap();
        e.end().unwrap();
        assert!(e.finished());
    }

    #[test]
    fn definite_frames_close_on_declared_count() {
        let mut out = Vec::new();
        let mut e = Encoder::new(&mut out);
        e.map(1).unwrap();
        e.u64(0).unwrap();
        e.array(2).unwrap();
        e.u64(1).unwrap();
        assert!(!e.finished());
        e.u64(2).unwrap();
        assert!(e.finished());
        assert_eq!(hex::encode(out), "a100820102");
    }

    fn void<T, E>(r: Result<T, E>) {
        assert!(matches!(r, Ok(_)), "unexpected encode error");
    }
}
