//! Pull-based CBOR reader.
//!
//! The [`Decoder`] keeps an explicit stack of nesting frames: every open
//! container records how many items are still expected (definite) or that it
//! is waiting for a break (indefinite). Terminal reads update the stack, so
//! the decoder always knows whether the document is structurally
//! [finished](Decoder::finished).

use std::marker::PhantomData;

use crate::data::{Int, Tag, Type};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unexpected cbor type {found} at position {position}, expected {expected}")]
    UnexpectedType {
        expected: &'static str,
        found: Type,
        position: usize,
    },

    #[error("invalid cbor: {0}")]
    InvalidCbor(String),

    #[error("unexpected end of input")]
    TruncatedInput,

    #[error("integer out of range for the requested width")]
    IntegerOutOfRange,

    #[error("container length mismatch")]
    ContainerMismatch,

    #[error("float narrowing would lose precision")]
    LossOfPrecision,

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Message(msg.into())
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Items still expected for definite containers, `None` for indefinite
    remaining: Option<u64>,
}

/// Streaming CBOR reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Decoder<'b> {
    input: &'b [u8],
    pos: usize,
    stack: Vec<Frame>,
}

impl<'b> Decoder<'b> {
    pub fn new(input: &'b [u8]) -> Self {
        Decoder {
            input,
            pos: 0,
            stack: Vec::new(),
        }
    }

    /// The full input slice this decoder reads from.
    pub fn input(&self) -> &'b [u8] {
        self.input
    }

    /// Byte offset of the next unread item.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// True once every opened frame is closed and the cursor is at the end.
    pub fn finished(&self) -> bool {
        self.pos >= self.input.len() && self.stack.is_empty()
    }

    /// An independent decoder at the current position, for peeking ahead.
    pub fn probe(&self) -> Decoder<'b> {
        self.clone()
    }

    /// Reports the state of the next item without consuming it.
    pub fn datatype(&self) -> Result<Type, Error> {
        let b = self.current()?;
        let major = b >> 5;
        let info = b & 0x1f;

        let ty = match major {
            0 => match info {
                0..=24 => Type::U8,
                25 => Type::U16,
                26 => Type::U32,
                27 => Type::U64,
                _ => Type::Unknown(b),
            },
            1 => match info {
                0..=24 => Type::I8,
                25 => Type::I16,
                26 => Type::I32,
                27 => {
                    // a 64-bit negative may exceed the i64 range
                    let n = self.peek_u64_arg()?;
                    if n > i64::MAX as u64 {
                        Type::Int
                    } else {
                        Type::I64
                    }
                }
                _ => Type::Unknown(b),
            },
            2 => {
                if info == 31 {
                    Type::BytesIndef
                } else {
                    Type::Bytes
                }
            }
            3 => {
                if info == 31 {
                    Type::StringIndef
                } else {
                    Type::String
                }
            }
            4 => {
                if info == 31 {
                    Type::ArrayIndef
                } else {
                    Type::Array
                }
            }
            5 => {
                if info == 31 {
                    Type::MapIndef
                } else {
                    Type::Map
                }
            }
            6 => Type::Tag,
            7 => match info {
                20 | 21 => Type::Bool,
                22 => Type::Null,
                23 => Type::Undefined,
                25 => Type::F16,
                26 => Type::F32,
                27 => Type::F64,
                31 => Type::Break,
                0..=19 | 24 => Type::Simple,
                _ => Type::Unknown(b),
            },
            _ => unreachable!(),
        };

        Ok(ty)
    }

    pub fn u8(&mut self) -> Result<u8, Error> {
        let v = self.u64()?;
        u8::try_from(v).map_err(|_| Error::IntegerOutOfRange)
    }

    pub fn u16(&mut self) -> Result<u16, Error> {
        let v = self.u64()?;
        u16::try_from(v).map_err(|_| Error::IntegerOutOfRange)
    }

    pub fn u32(&mut self) -> Result<u32, Error> {
        let v = self.u64()?;
        u32::try_from(v).map_err(|_| Error::IntegerOutOfRange)
    }

    pub fn u64(&mut self) -> Result<u64, Error> {
        match self.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => {
                let (_, v) = self.read_head()?;
                self.note_item();
                Ok(v)
            }
            found => Err(self.unexpected("unsigned int", found)),
        }
    }

    pub fn i8(&mut self) -> Result<i8, Error> {
        let v = self.i64()?;
        i8::try_from(v).map_err(|_| Error::IntegerOutOfRange)
    }

    pub fn i16(&mut self) -> Result<i16, Error> {
        let v = self.i64()?;
        i16::try_from(v).map_err(|_| Error::IntegerOutOfRange)
    }

    pub fn i32(&mut self) -> Result<i32, Error> {
        let v = self.i64()?;
        i32::try_from(v).map_err(|_| Error::IntegerOutOfRange)
    }

    pub fn i64(&mut self) -> Result<i64, Error> {
        let v = self.int()?;
        i64::try_from(v).map_err(|_| Error::IntegerOutOfRange)
    }

    /// Reads any major type 0 or 1 integer, including negatives near
    /// `-2^64` that exceed the `i64` range.
    pub fn int(&mut self) -> Result<Int, Error> {
        match self.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => {
                let (_, v) = self.read_head()?;
                self.note_item();
                Ok(Int::from(v))
            }
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
                let (_, n) = self.read_head()?;
                self.note_item();
                let v = -1i128 - n as i128;
                Ok(Int::try_from(v).expect("within cbor integer range"))
            }
            found => Err(self.unexpected("int", found)),
        }
    }

    /// Reads a definite byte string. Indefinite strings must be walked with
    /// [`Decoder::bytes_iter`].
    pub fn bytes(&mut self) -> Result<&'b [u8], Error> {
        match self.datatype()? {
            Type::Bytes => {
                let (_, len) = self.read_head()?;
                let out = self.take(len as usize)?;
                self.note_item();
                Ok(out)
            }
            found => Err(self.unexpected("bytes", found)),
        }
    }

    /// Iterates the chunks of a definite or indefinite byte string.
    pub fn bytes_iter(&mut self) -> Result<BytesIter<'_, 'b>, Error> {
        match self.datatype()? {
            Type::Bytes => Ok(BytesIter {
                d: self,
                indef: false,
                done: false,
            }),
            Type::BytesIndef => {
                self.pos += 1;
                Ok(BytesIter {
                    d: self,
                    indef: true,
                    done: false,
                })
            }
            found => Err(self.unexpected("bytes", found)),
        }
    }

    /// Reads a definite text string.
    pub fn str(&mut self) -> Result<&'b str, Error> {
        match self.datatype()? {
            Type::String => {
                let (_, len) = self.read_head()?;
                let out = self.take(len as usize)?;
                self.note_item();
                std::str::from_utf8(out)
                    .map_err(|e| Error::InvalidCbor(format!("invalid utf-8 in text string: {e}")))
            }
            found => Err(self.unexpected("text", found)),
        }
    }

    /// Iterates the chunks of a definite or indefinite text string.
    pub fn str_iter(&mut self) -> Result<StrIter<'_, 'b>, Error> {
        match self.datatype()? {
            Type::String => Ok(StrIter {
                d: self,
                indef: false,
                done: false,
            }),
            Type::StringIndef => {
                self.pos += 1;
                Ok(StrIter {
                    d: self,
                    indef: true,
                    done: false,
                })
            }
            found => Err(self.unexpected("text", found)),
        }
    }

    /// Opens an array. Returns the declared length, or `None` when the array
    /// is indefinite and runs until a break.
    pub fn array(&mut self) -> Result<Option<u64>, Error> {
        match self.datatype()? {
            Type::Array => {
                let (_, len) = self.read_head()?;
                self.open_frame(Some(len));
                Ok(Some(len))
            }
            Type::ArrayIndef => {
                self.pos += 1;
                self.open_frame(None);
                Ok(None)
            }
            found => Err(self.unexpected("array", found)),
        }
    }

    /// Opens a map. Returns the declared entry count, or `None` when the map
    /// is indefinite and runs until a break.
    pub fn map(&mut self) -> Result<Option<u64>, Error> {
        match self.datatype()? {
            Type::Map => {
                let (_, len) = self.read_head()?;
                let items = len
                    .checked_mul(2)
                    .ok_or_else(|| Error::InvalidCbor("map length overflow".into()))?;
                self.open_frame(Some(items));
                Ok(Some(len))
            }
            Type::MapIndef => {
                self.pos += 1;
                self.open_frame(None);
                Ok(None)
            }
            found => Err(self.unexpected("map", found)),
        }
    }

    pub fn tag(&mut self) -> Result<Tag, Error> {
        match self.datatype()? {
            Type::Tag => {
                let (_, v) = self.read_head()?;
                Ok(Tag::new(v))
            }
            found => Err(self.unexpected("tag", found)),
        }
    }

    pub fn bool(&mut self) -> Result<bool, Error> {
        match self.datatype()? {
            Type::Bool => {
                let b = self.current()?;
                self.pos += 1;
                self.note_item();
                Ok(b == 0xf5)
            }
            found => Err(self.unexpected("bool", found)),
        }
    }

    pub fn null(&mut self) -> Result<(), Error> {
        match self.datatype()? {
            Type::Null => {
                self.pos += 1;
                self.note_item();
                Ok(())
            }
            found => Err(self.unexpected("null", found)),
        }
    }

    pub fn undefined(&mut self) -> Result<(), Error> {
        match self.datatype()? {
            Type::Undefined => {
                self.pos += 1;
                self.note_item();
                Ok(())
            }
            found => Err(self.unexpected("undefined", found)),
        }
    }

    /// Reads a simple value (major type 7, unassigned range).
    pub fn simple(&mut self) -> Result<u8, Error> {
        match self.datatype()? {
            Type::Simple => {
                let b = self.current()?;
                self.pos += 1;
                let v = if b & 0x1f == 24 {
                    let v = self.current()?;
                    self.pos += 1;
                    v
                } else {
                    b & 0x1f
                };
                self.note_item();
                Ok(v)
            }
            found => Err(self.unexpected("simple", found)),
        }
    }

    /// Reads a half-precision float, widened exactly to `f32`.
    pub fn f16(&mut self) -> Result<f32, Error> {
        match self.datatype()? {
            Type::F16 => {
                self.pos += 1;
                let raw = self.take(2)?;
                self.note_item();
                Ok(half::f16::from_bits(u16::from_be_bytes([raw[0], raw[1]])).to_f32())
            }
            found => Err(self.unexpected("f16", found)),
        }
    }

    /// Reads a half or single precision float. Doubles are accepted only
    /// when they narrow without losing precision.
    pub fn f32(&mut self) -> Result<f32, Error> {
        match self.datatype()? {
            Type::F16 => self.f16(),
            Type::F32 => {
                self.pos += 1;
                let raw = self.take(4)?;
                self.note_item();
                Ok(f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
            }
            Type::F64 => {
                let wide = self.f64()?;
                let narrow = wide as f32;
                if narrow as f64 == wide || wide.is_nan() {
                    Ok(narrow)
                } else {
                    Err(Error::LossOfPrecision)
                }
            }
            found => Err(self.unexpected("f32", found)),
        }
    }

    /// Reads a float of any width, widened to `f64`.
    pub fn f64(&mut self) -> Result<f64, Error> {
        match self.datatype()? {
            Type::F16 => Ok(self.f16()? as f64),
            Type::F32 => Ok(self.f32()? as f64),
            Type::F64 => {
                self.pos += 1;
                let raw = self.take(8)?;
                self.note_item();
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                Ok(f64::from_be_bytes(buf))
            }
            found => Err(self.unexpected("f64", found)),
        }
    }

    /// Decodes a value of a known type from the stream.
    pub fn decode<T: crate::Decode<'b>>(&mut self) -> Result<T, Error> {
        T::decode(self)
    }

    /// Consumes the next item, whatever it is, including nested containers.
    pub fn skip(&mut self) -> Result<(), Error> {
        match self.datatype()? {
            Type::U8 | Type::U16 | Type::U32 | Type::U64 => {
                self.u64()?;
            }
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::Int => {
                self.int()?;
            }
            Type::Bytes | Type::BytesIndef => {
                let iter = self.bytes_iter()?;
                for chunk in iter {
                    chunk?;
                }
            }
            Type::String | Type::StringIndef => {
                let iter = self.str_iter()?;
                for chunk in iter {
                    chunk?;
                }
            }
            Type::Array | Type::ArrayIndef => match self.array()? {
                Some(n) => {
                    for _ in 0..n {
                        self.skip()?;
                    }
                }
                None => {
                    while self.datatype()? != Type::Break {
                        self.skip()?;
                    }
                    self.consume_break()?;
                }
            },
            Type::Map | Type::MapIndef => match self.map()? {
                Some(n) => {
                    for _ in 0..n * 2 {
                        self.skip()?;
                    }
                }
                None => {
                    while self.datatype()? != Type::Break {
                        self.skip()?;
                    }
                    self.consume_break()?;
                }
            },
            Type::Tag => {
                self.tag()?;
                self.skip()?;
            }
            Type::Bool => {
                self.bool()?;
            }
            Type::Null => self.null()?,
            Type::Undefined => self.undefined()?,
            Type::Simple => {
                self.simple()?;
            }
            Type::F16 | Type::F32 | Type::F64 => {
                self.f64()?;
            }
            Type::Break => {
                return Err(Error::InvalidCbor("unexpected break".into()));
            }
            Type::Unknown(b) => {
                return Err(Error::InvalidCbor(format!("unknown initial byte {b:#04x}")));
            }
        }

        Ok(())
    }

    /// Typed iteration over the items of an array.
    pub fn array_iter<T: crate::Decode<'b>>(&mut self) -> Result<ArrayIter<'_, 'b, T>, Error> {
        let len = self.array()?;
        Ok(ArrayIter {
            d: self,
            len,
            _marker: PhantomData,
        })
    }

    /// Typed iteration over the entries of a map.
    pub fn map_iter<K, V>(&mut self) -> Result<MapIter<'_, 'b, K, V>, Error>
    where
        K: crate::Decode<'b>,
        V: crate::Decode<'b>,
    {
        let len = self.map()?;
        Ok(MapIter {
            d: self,
            len,
            _marker: PhantomData,
        })
    }

    /// Consumes the break closing the innermost indefinite container. Used
    /// by clients that walk containers by state instead of structurally.
    pub fn consume_break(&mut self) -> Result<(), Error> {
        if self.current()? != 0xff {
            return Err(Error::InvalidCbor("expected break".into()));
        }

        match self.stack.pop() {
            Some(Frame {
                remaining: None, ..
            }) => {
                self.pos += 1;
                self.note_item();
                Ok(())
            }
            _ => Err(Error::ContainerMismatch),
        }
    }

    fn open_frame(&mut self, remaining: Option<u64>) {
        match remaining {
            // an empty definite container is already a complete item
            Some(0) => self.note_item(),
            _ => self.stack.push(Frame { remaining }),
        }
    }

    /// Marks one item as consumed within the enclosing frame, closing every
    /// definite frame this completes.
    fn note_item(&mut self) {
        while let Some(top) = self.stack.last_mut() {
            match &mut top.remaining {
                Some(r) => {
                    *r -= 1;
                    if *r == 0 {
                        self.stack.pop();
                        // the closed container is itself an item of its parent
                        continue;
                    }
                }
                None => {}
            }
            break;
        }
    }

    fn unexpected(&self, expected: &'static str, found: Type) -> Error {
        Error::UnexpectedType {
            expected,
            found,
            position: self.pos,
        }
    }

    fn current(&self) -> Result<u8, Error> {
        self.input.get(self.pos).copied().ok_or(Error::TruncatedInput)
    }

    fn take(&mut self, n: usize) -> Result<&'b [u8], Error> {
        let end = self.pos.checked_add(n).ok_or(Error::TruncatedInput)?;
        if end > self.input.len() {
            return Err(Error::TruncatedInput);
        }
        let out = &self.input[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn peek_u64_arg(&self) -> Result<u64, Error> {
        if self.pos + 9 > self.input.len() {
            return Err(Error::TruncatedInput);
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.input[self.pos + 1..self.pos + 9]);
        Ok(u64::from_be_bytes(buf))
    }

    /// Consumes a head, returning major type and argument value. Indefinite
    /// and reserved info values are rejected here; container entry points
    /// handle the indefinite case before calling.
    fn read_head(&mut self) -> Result<(u8, u64), Error> {
        let b = self.current()?;
        let major = b >> 5;
        let info = b & 0x1f;
        self.pos += 1;

        let value = match info {
            0..=23 => info as u64,
            24 => self.take(1)?[0] as u64,
            25 => {
                let raw = self.take(2)?;
                u16::from_be_bytes([raw[0], raw[1]]) as u64
            }
            26 => {
                let raw = self.take(4)?;
                u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64
            }
            27 => {
                let raw = self.take(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                u64::from_be_bytes(buf)
            }
            _ => {
                return Err(Error::InvalidCbor(format!(
                    "reserved or indefinite info value {info} in head"
                )))
            }
        };

        Ok((major, value))
    }
}

pub struct BytesIter<'a, 'b> {
    d: &'a mut Decoder<'b>,
    indef: bool,
    done: bool,
}

impl<'a, 'b> Iterator for BytesIter<'a, 'b> {
    type Item = Result<&'b [u8], Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.indef {
            self.done = true;
            return Some(self.d.bytes());
        }

        match self.d.current() {
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            Ok(0xff) => {
                self.done = true;
                self.d.pos += 1;
                self.d.note_item();
                None
            }
            Ok(b) if b >> 5 == 2 && b & 0x1f != 31 => Some(self.chunk()),
            Ok(_) => {
                self.done = true;
                Some(Err(Error::InvalidCbor(
                    "expected byte string chunk".into(),
                )))
            }
        }
    }
}

impl<'a, 'b> BytesIter<'a, 'b> {
    fn chunk(&mut self) -> Result<&'b [u8], Error> {
        let (_, len) = self.d.read_head()?;
        self.d.take(len as usize)
    }
}

pub struct StrIter<'a, 'b> {
    d: &'a mut Decoder<'b>,
    indef: bool,
    done: bool,
}

impl<'a, 'b> Iterator for StrIter<'a, 'b> {
    type Item = Result<&'b str, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.indef {
            self.done = true;
            return Some(self.d.str());
        }

        match self.d.current() {
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            Ok(0xff) => {
                self.done = true;
                self.d.pos += 1;
                self.d.note_item();
                None
            }
            Ok(b) if b >> 5 == 3 && b & 0x1f != 31 => Some(self.chunk()),
            Ok(_) => {
                self.done = true;
                Some(Err(Error::InvalidCbor(
                    "expected text string chunk".into(),
                )))
            }
        }
    }
}

impl<'a, 'b> StrIter<'a, 'b> {
    fn chunk(&mut self) -> Result<&'b str, Error> {
        let (_, len) = self.d.read_head()?;
        let raw = self.d.take(len as usize)?;
        std::str::from_utf8(raw)
            .map_err(|e| Error::InvalidCbor(format!("invalid utf-8 in text string: {e}")))
    }
}

pub struct ArrayIter<'a, 'b, T> {
    d: &'a mut Decoder<'b>,
    len: Option<u64>,
    _marker: PhantomData<T>,
}

impl<'a, 'b, T: crate::Decode<'b>> Iterator for ArrayIter<'a, 'b, T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.len {
            Some(0) => None,
            Some(n) => {
                self.len = Some(n - 1);
                Some(T::decode(self.d))
            }
            None => match self.d.datatype() {
                Err(e) => Some(Err(e)),
                Ok(Type::Break) => match self.d.consume_break() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                },
                Ok(_) => Some(T::decode(self.d)),
            },
        }
    }
}

pub struct MapIter<'a, 'b, K, V> {
    d: &'a mut Decoder<'b>,
    len: Option<u64>,
    _marker: PhantomData<(K, V)>,
}

impl<'a, 'b, K, V> Iterator for MapIter<'a, 'b, K, V>
where
    K: crate::Decode<'b>,
    V: crate::Decode<'b>,
{
    type Item = Result<(K, V), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = |d: &mut Decoder<'b>| {
            let k = K::decode(d)?;
            let v = V::decode(d)?;
            Ok((k, v))
        };

        match self.len {
            Some(0) => None,
            Some(n) => {
                self.len = Some(n - 1);
                Some(entry(self.d))
            }
            None => match self.d.datatype() {
                Err(e) => Some(Err(e)),
                Ok(Type::Break) => match self.d.consume_break() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                },
                Ok(_) => Some(entry(self.d)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn reads_unsigned_boundaries() {
        assert_eq!(Decoder::new(&hex("00")).u64().unwrap(), 0);
        assert_eq!(Decoder::new(&hex("17")).u64().unwrap(), 23);
        assert_eq!(Decoder::new(&hex("1818")).u64().unwrap(), 24);
        assert_eq!(
            Decoder::new(&hex("1bffffffffffffffff")).u64().unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn reads_negative_boundaries() {
        assert_eq!(Decoder::new(&hex("20")).i64().unwrap(), -1);
        assert_eq!(Decoder::new(&hex("3818")).i64().unwrap(), -25);

        // -2^64 exceeds i64 and must surface as Int
        let input = hex("3bffffffffffffffff");
        let d = Decoder::new(&input);
        assert_eq!(d.datatype().unwrap(), Type::Int);

        let v = Decoder::new(&input).int().unwrap();
        assert_eq!(i128::from(v), -(1i128 << 64));

        assert_eq!(
            Decoder::new(&input).i64().unwrap_err(),
            Error::IntegerOutOfRange
        );
    }

    #[test]
    fn walks_indefinite_byte_strings() {
        // (_ h'0102', h'03')
        let input = hex("5f42010241 03ff".replace(' ', "").as_str());
        let mut d = Decoder::new(&input);
        let chunks: Result<Vec<_>, _> = d.bytes_iter().unwrap().collect();
        let flat: Vec<u8> = chunks.unwrap().concat();
        assert_eq!(flat, vec![1, 2, 3]);
        assert!(d.finished());
    }

    #[test]
    fn tracks_definite_frames() {
        // [1, [2, 3], 4]
        let input = hex("8301820203 04".replace(' ', "").as_str());
        let mut d = Decoder::new(&input);
        assert_eq!(d.array().unwrap(), Some(3));
        assert_eq!(d.u64().unwrap(), 1);
        assert_eq!(d.array().unwrap(), Some(2));
        assert_eq!(d.u64().unwrap(), 2);
        assert_eq!(d.u64().unwrap(), 3);
        assert!(!d.finished());
        assert_eq!(d.u64().unwrap(), 4);
        assert!(d.finished());
    }

    #[test]
    fn reads_half_precision() {
        // 1.5 as binary16
        let input = hex("f93e00");
        assert_eq!(Decoder::new(&input).f64().unwrap(), 1.5);
    }

    #[test]
    fn rejects_lossy_narrowing() {
        // 1.1 as binary64 does not narrow exactly
        let input = hex("fb3ff199999999999a");
        assert_eq!(
            Decoder::new(&input).f32().unwrap_err(),
            Error::LossOfPrecision
        );
    }

    #[test]
    fn truncated_input_is_an_error() {
        assert_eq!(
            Decoder::new(&hex("1b0000")).u64().unwrap_err(),
            Error::TruncatedInput
        );
    }

    #[test]
    fn skip_consumes_nested_structures() {
        // {1: [_ "a", "b"], 2: h'00'} followed by 7
        let input = hex("a2019f61616162ff0241 0007".replace(' ', "").as_str());
        let mut d = Decoder::new(&input);
        d.skip().unwrap();
        assert_eq!(d.u64().unwrap(), 7);
        assert!(d.finished());
    }

    #[test]
    fn embedded_cbor_round_trips_as_bytes() {
        // tag 24 wrapping bytes of the encoding of 42
        let input = hex("d81842182a");
        let mut d = Decoder::new(&input);
        assert_eq!(d.tag().unwrap(), Tag::ENCODED_CBOR);
        let inner = d.bytes().unwrap();
        assert_eq!(Decoder::new(inner).u64().unwrap(), 42);
    }
}
