//! Every AMQP value on the wire starts with a one byte constructor, its format code. The upper nibble of
//! the code selects how the payload is laid out: `0x4_` codes carry no payload at all, `0x5_` to `0x9_`
//! codes are followed by a fixed number of bytes (1, 2, 4, 8 or 16), `0xa_` and `0xb_` codes by a one
//! or four byte length and that many bytes, `0xc_` and `0xd_` codes by a size and an element count of
//! one or four bytes each and `0xe_` and `0xf_` codes additionally by a single constructor shared by all
//! elements of an array. The code `0x00` introduces a described type: a descriptor value followed by
//! the described value. All multi-byte quantities are in network byte order.

use crate::error::{DecodeError, EncodeError};
use std::convert::TryFrom;
use std::io::Write;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCode {
    Described  = 0x00,
    Null       = 0x40,
    True       = 0x41,
    False      = 0x42,
    UInt0      = 0x43,
    ULong0     = 0x44,
    List0      = 0x45,
    UByte      = 0x50,
    Byte       = 0x51,
    SmallUInt  = 0x52,
    SmallULong = 0x53,
    SmallInt   = 0x54,
    SmallLong  = 0x55,
    Bool       = 0x56,
    UShort     = 0x60,
    Short      = 0x61,
    UInt       = 0x70,
    Int        = 0x71,
    Float      = 0x72,
    Char       = 0x73,
    Decimal32  = 0x74,
    ULong      = 0x80,
    Long       = 0x81,
    Double     = 0x82,
    Timestamp  = 0x83,
    Decimal64  = 0x84,
    Decimal128 = 0x94,
    Uuid       = 0x98,
    VBin8      = 0xa0,
    Str8       = 0xa1,
    Sym8       = 0xa3,
    VBin32     = 0xb0,
    Str32      = 0xb1,
    Sym32      = 0xb3,
    List8      = 0xc0,
    Map8       = 0xc1,
    List32     = 0xd0,
    Map32      = 0xd1,
    Array8     = 0xe0,
    Array32    = 0xf0,
}

/// Width of the length, size and count fields following a constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// One byte
    Small,
    /// Four bytes
    Large,
}

/// How the payload after a constructor is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// The given amount of payload bytes, possibly none
    Fixed(usize),
    /// A length field followed by that many bytes
    Variable(Width),
    /// A size field, a count field and `count` fully encoded elements
    Compound(Width),
    /// A size field, a count field, one element constructor and `count` payloads
    Array(Width),
    /// A descriptor value followed by the described value
    Described,
}

impl FormatCode {

    const ALL: [FormatCode; 40] = [
        FormatCode::Described, FormatCode::Null, FormatCode::True, FormatCode::False, FormatCode::UInt0,
        FormatCode::ULong0, FormatCode::List0, FormatCode::UByte, FormatCode::Byte, FormatCode::SmallUInt,
        FormatCode::SmallULong, FormatCode::SmallInt, FormatCode::SmallLong, FormatCode::Bool, FormatCode::UShort,
        FormatCode::Short, FormatCode::UInt, FormatCode::Int, FormatCode::Float, FormatCode::Char,
        FormatCode::Decimal32, FormatCode::ULong, FormatCode::Long, FormatCode::Double, FormatCode::Timestamp,
        FormatCode::Decimal64, FormatCode::Decimal128, FormatCode::Uuid, FormatCode::VBin8, FormatCode::Str8,
        FormatCode::Sym8, FormatCode::VBin32, FormatCode::Str32, FormatCode::Sym32, FormatCode::List8,
        FormatCode::Map8, FormatCode::List32, FormatCode::Map32, FormatCode::Array8, FormatCode::Array32,
    ];

    pub fn category(&self) -> Category {
        match *self {
            FormatCode::Described => Category::Described,
            FormatCode::Null
                | FormatCode::True
                | FormatCode::False
                | FormatCode::UInt0
                | FormatCode::ULong0
                | FormatCode::List0     => Category::Fixed(0),
            FormatCode::UByte
                | FormatCode::Byte
                | FormatCode::SmallUInt
                | FormatCode::SmallULong
                | FormatCode::SmallInt
                | FormatCode::SmallLong
                | FormatCode::Bool      => Category::Fixed(1),
            FormatCode::UShort
                | FormatCode::Short     => Category::Fixed(2),
            FormatCode::UInt
                | FormatCode::Int
                | FormatCode::Float
                | FormatCode::Char
                | FormatCode::Decimal32 => Category::Fixed(4),
            FormatCode::ULong
                | FormatCode::Long
                | FormatCode::Double
                | FormatCode::Timestamp
                | FormatCode::Decimal64 => Category::Fixed(8),
            FormatCode::Decimal128
                | FormatCode::Uuid      => Category::Fixed(16),
            FormatCode::VBin8
                | FormatCode::Str8
                | FormatCode::Sym8      => Category::Variable(Width::Small),
            FormatCode::VBin32
                | FormatCode::Str32
                | FormatCode::Sym32     => Category::Variable(Width::Large),
            FormatCode::List8
                | FormatCode::Map8      => Category::Compound(Width::Small),
            FormatCode::List32
                | FormatCode::Map32     => Category::Compound(Width::Large),
            FormatCode::Array8          => Category::Array(Width::Small),
            FormatCode::Array32         => Category::Array(Width::Large),
        }
    }

    /// Width of the length fields following this code, if it has any
    pub fn width(&self) -> Option<Width> {
        match self.category() {
            Category::Variable(w) | Category::Compound(w) | Category::Array(w) => Some(w),
            Category::Fixed(_) | Category::Described                         => None,
        }
    }

    /// Returns the number of written bytes
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<usize, EncodeError> {
        w.write_all(&[*self as u8])?;
        Ok(1)
    }

    /// Returns the decoded code and the number of consumed bytes
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &B) -> Result<(Self, usize), DecodeError> {
        match buf.as_ref().first() {
            Some(byte) => Ok((Self::try_from(*byte)?, 1)),
            None       => Err(DecodeError::Truncated),
        }
    }

}

impl TryFrom<u8> for FormatCode {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::ALL.iter().copied().find(|code| *code as u8 == v).ok_or(DecodeError::UnknownConstructor(v))
    }
}

impl Width {

    /// The narrowest width able to hold `value`
    #[inline]
    pub fn of(value: usize) -> Self {
        if value <= u8::MAX as usize { Width::Small } else { Width::Large }
    }

    #[inline]
    pub const fn bytes(&self) -> usize {
        match *self {
            Width::Small => 1,
            Width::Large => 4,
        }
    }

    /// Reads a length field of this width from the start of `buf`. Returns the value and the number of consumed bytes.
    pub fn decode_length(&self, buf: &[u8]) -> Result<(usize, usize), DecodeError> {
        if buf.len() < self.bytes() {
            return Err(DecodeError::Truncated);
        }
        let value = match *self {
            Width::Small => buf[0] as u32,
            Width::Large => u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
        };
        Ok((to_usize(value)?, self.bytes()))
    }

    /// Returns the number of written bytes
    pub fn encode_length<W: Write>(&self, value: usize, w: &mut W) -> Result<usize, EncodeError> {
        match *self {
            Width::Small => w.write_all(&[u8::try_from(value).map_err(|_| EncodeError::Length(value))?])?,
            Width::Large => w.write_all(&u32::try_from(value).map_err(|_| EncodeError::Length(value))?.to_be_bytes())?,
        }
        Ok(self.bytes())
    }

}

#[inline]
fn to_usize(value: u32) -> Result<usize, DecodeError> {
    usize::try_from(value).map_err(|_| DecodeError::Allocation)
}
