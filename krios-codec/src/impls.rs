//! Codec impls for standard library types.

use crate::data::{Int, Type};
use crate::{decode, encode, Decode, Decoder, Encode, Encoder};

macro_rules! uint_codec {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Encode for $ty {
            fn encode<W: encode::Write>(
                &self,
                e: &mut Encoder<W>,
            ) -> Result<(), encode::Error<W::Error>> {
                e.$write(*self)?.ok()
            }
        }

        impl<'b> Decode<'b> for $ty {
            fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
                d.$read()
            }
        }
    };
}

uint_codec!(u8, u8, u8);
uint_codec!(u16, u16, u16);
uint_codec!(u32, u32, u32);
uint_codec!(u64, u64, u64);
uint_codec!(i32, i32, i32);
uint_codec!(i64, i64, i64);

impl Encode for Int {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.int(*self)?.ok()
    }
}

impl<'b> Decode<'b> for Int {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.int()
    }
}

impl Encode for bool {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.bool(*self)?.ok()
    }
}

impl<'b> Decode<'b> for bool {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.bool()
    }
}

impl Encode for String {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.str(self)?.ok()
    }
}

impl<'b> Decode<'b> for String {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let mut full = String::new();
        for chunk in d.str_iter()? {
            full.push_str(chunk?);
        }
        Ok(full)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(self.len() as u64)?;
        for item in self {
            e.encode(item)?;
        }
        Ok(())
    }
}

impl<'b, T: Decode<'b>> Decode<'b> for Vec<T> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array_iter()?.collect()
    }
}

/// Absent values encode as null; decoding accepts null and undefined.
impl<T: Encode> Encode for Option<T> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        match self {
            Some(x) => e.encode(x)?.ok(),
            None => e.null()?.ok(),
        }
    }
}

impl<'b, T: Decode<'b>> Decode<'b> for Option<T> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        match d.datatype()? {
            Type::Null => {
                d.null()?;
                Ok(None)
            }
            Type::Undefined => {
                d.undefined()?;
                Ok(None)
            }
            _ => Ok(Some(d.decode()?)),
        }
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?;
        e.encode(&self.0)?;
        e.encode(&self.1)?;
        Ok(())
    }
}

impl<'b, A: Decode<'b>, B: Decode<'b>> Decode<'b> for (A, B) {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        d.array()?;
        let a = d.decode()?;
        let b = d.decode()?;
        Ok((a, b))
    }
}

impl<T: Encode> Encode for &T {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        (*self).encode(e)
    }
}

impl<T: Encode> Encode for Box<T> {
    fn encode<W: encode::Write>(&self, e: &mut Encoder<W>) -> Result<(), encode::Error<W::Error>> {
        self.as_ref().encode(e)
    }
}

impl<'b, T: Decode<'b>> Decode<'b> for Box<T> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        Ok(Box::new(d.decode()?))
    }
}
