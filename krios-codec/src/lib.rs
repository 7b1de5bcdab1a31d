//! Streaming CBOR codec with the canonical-encoding conventions used by the
//! Cardano ledger.
//!
//! The [`Encoder`] emits shortest-form heads and tracks nesting frames so
//! that container length violations surface as errors instead of corrupt
//! output. The [`Decoder`] is pull-based: [`Decoder::datatype`] reports the
//! next item state without consuming it, and each typed read validates the
//! state before advancing.

/// Growable byte container with typed endian reads and writes
pub mod buffer;

/// CBOR item states, tags and the bounded integer type
pub mod data;

/// Pull-based CBOR reader
pub mod decode;

/// Streaming CBOR writer
pub mod encode;

mod impls;

/// Round-trip friendly common helper structs
pub mod utils;

pub use decode::Decoder;
pub use encode::Encoder;

/// A type that knows how to write itself into a CBOR stream.
pub trait Encode {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
    ) -> Result<(), encode::Error<W::Error>>;
}

/// A type that knows how to read itself out of a CBOR stream.
pub trait Decode<'b>: Sized {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error>;
}

/// Convenience methods for self-contained CBOR fragments
pub trait Fragment: Sized + for<'b> Decode<'b> + Encode {
    fn encode_fragment(&self) -> Result<Vec<u8>, encode::Error<std::convert::Infallible>> {
        to_vec(self)
    }

    fn decode_fragment(bytes: &[u8]) -> Result<Self, decode::Error> {
        decode(bytes)
    }
}

impl<T> Fragment for T where T: Sized + for<'b> Decode<'b> + Encode {}

/// Encodes a value into a fresh byte vector.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>, encode::Error<std::convert::Infallible>>
where
    T: Encode,
{
    let mut out = Vec::new();
    encode(value, &mut out)?;
    Ok(out)
}

/// Encodes a value into any [`encode::Write`] sink.
pub fn encode<T, W>(value: &T, writer: W) -> Result<(), encode::Error<W::Error>>
where
    T: Encode,
    W: encode::Write,
{
    let mut e = Encoder::new(writer);
    value.encode(&mut e)
}

/// Decodes a value from a byte slice holding exactly one CBOR item.
pub fn decode<'b, T>(bytes: &'b [u8]) -> Result<T, decode::Error>
where
    T: Decode<'b>,
{
    let mut d = Decoder::new(bytes);
    T::decode(&mut d)
}
