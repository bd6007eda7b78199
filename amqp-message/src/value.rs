//! The atom of an AMQP message is the primitive `Value`.
//! Values are encoded on wire as a format code and, depending on the code, a fixed amount of payload bytes, a length
//! prefixed run of bytes or a container of further values. The encoder always picks the most compact of the possible
//! encodings, the decoder accepts all of them.

use crate::error::{DecodeError, DecoderError, EncodeError};
use crate::format_code::{Category, FormatCode, Width};
use crate::options::DEFAULT_MAX_DEPTH;
use std::borrow::Cow;
use std::io::Write;
use std::str::from_utf8;

/// Arrays of elements without payload (only `null` is encoded that way) are capped at this many elements since their
/// count can't be checked against the remaining input. The encoder refuses to write larger ones.
pub const MAX_EMPTY_ELEMENTS: usize = 1 << 16;

/// The possible values according to the AMQP 1.0 type system.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    UByte(u8),
    UShort(u16),
    UInt(u32),
    ULong(u64),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// IEEE 754-2008 decimal32 using the Binary Integer Decimal encoding, kept as raw bytes
    Decimal32([u8; 4]),
    Decimal64([u8; 8]),
    Decimal128([u8; 16]),
    Char(char),
    /// Milliseconds since the unix epoch
    Timestamp(i64),
    Uuid([u8; 16]),
    Binary(Cow<'a, [u8]>),
    String(Cow<'a, str>),
    Symbol(Cow<'a, str>),
    /// A descriptor and the value it describes
    Described(Box<Value<'a>>, Box<Value<'a>>),
    List(Vec<Value<'a>>),
    /// Key value pairs in wire order. Duplicate keys are kept.
    Map(Vec<(Value<'a>, Value<'a>)>),
    Array(Vec<Value<'a>>),
}

impl<'a> Value<'a> {

    const PROTECTED_CHARS: &'static str = "\n\\$ ,:\"'()[]{}#";

    pub fn typename(&self) -> &'static str {
        match *self {
            Self::Null            => "null",
            Self::Bool(_)         => "boolean",
            Self::UByte(_)        => "ubyte",
            Self::UShort(_)       => "ushort",
            Self::UInt(_)         => "uint",
            Self::ULong(_)        => "ulong",
            Self::Byte(_)         => "byte",
            Self::Short(_)        => "short",
            Self::Int(_)          => "int",
            Self::Long(_)         => "long",
            Self::Float(_)        => "float",
            Self::Double(_)       => "double",
            Self::Decimal32(_)    => "decimal32",
            Self::Decimal64(_)    => "decimal64",
            Self::Decimal128(_)   => "decimal128",
            Self::Char(_)         => "char",
            Self::Timestamp(_)    => "timestamp",
            Self::Uuid(_)         => "uuid",
            Self::Binary(_)       => "binary",
            Self::String(_)       => "string",
            Self::Symbol(_)       => "symbol",
            Self::Described(_, _) => "described",
            Self::List(_)         => "list",
            Self::Map(_)          => "map",
            Self::Array(_)        => "array",
        }
    }

    /// The text of a string or symbol
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) | Self::Symbol(v) => Some(v.as_ref()),
            _                                 => None,
        }
    }

    /// Copies all borrowed strings, symbols and binaries so that the value no longer depends on the input buffer.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Self::Null            => Value::Null,
            Self::Bool(v)         => Value::Bool(v),
            Self::UByte(v)        => Value::UByte(v),
            Self::UShort(v)       => Value::UShort(v),
            Self::UInt(v)         => Value::UInt(v),
            Self::ULong(v)        => Value::ULong(v),
            Self::Byte(v)         => Value::Byte(v),
            Self::Short(v)        => Value::Short(v),
            Self::Int(v)          => Value::Int(v),
            Self::Long(v)         => Value::Long(v),
            Self::Float(v)        => Value::Float(v),
            Self::Double(v)       => Value::Double(v),
            Self::Decimal32(v)    => Value::Decimal32(v),
            Self::Decimal64(v)    => Value::Decimal64(v),
            Self::Decimal128(v)   => Value::Decimal128(v),
            Self::Char(v)         => Value::Char(v),
            Self::Timestamp(v)    => Value::Timestamp(v),
            Self::Uuid(v)         => Value::Uuid(v),
            Self::Binary(v)       => Value::Binary(Cow::Owned(v.into_owned())),
            Self::String(v)       => Value::String(Cow::Owned(v.into_owned())),
            Self::Symbol(v)       => Value::Symbol(Cow::Owned(v.into_owned())),
            Self::Described(d, v) => Value::Described(Box::new(d.into_owned()), Box::new(v.into_owned())),
            Self::List(v)         => Value::List(v.into_iter().map(Value::into_owned).collect()),
            Self::Map(v)          => Value::Map(v.into_iter().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()),
            Self::Array(v)        => Value::Array(v.into_iter().map(Value::into_owned).collect()),
        }
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn escape(v: &str) -> String {
        v.replace("\\", "\\\\").replace("\"", "\\\"").replace("\n", "\\n")
    }

}

impl<'a> From<bool> for Value<'a> {
    fn from(v: bool) -> Self { Value::Bool(v) }
}

impl<'a> From<u32> for Value<'a> {
    fn from(v: u32) -> Self { Value::UInt(v) }
}

impl<'a> From<u64> for Value<'a> {
    fn from(v: u64) -> Self { Value::ULong(v) }
}

impl<'a> From<i32> for Value<'a> {
    fn from(v: i32) -> Self { Value::Int(v) }
}

impl<'a> From<i64> for Value<'a> {
    fn from(v: i64) -> Self { Value::Long(v) }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self { Value::String(Cow::Borrowed(v)) }
}

impl<'a> From<String> for Value<'a> {
    fn from(v: String) -> Self { Value::String(Cow::Owned(v)) }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self { Value::Binary(Cow::Borrowed(v)) }
}

impl<'a> std::fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null            => f.write_str("null"),
            Value::Bool(true)      => f.write_str("true"),
            Value::Bool(false)     => f.write_str("false"),
            Value::UByte(v)        => write!(f, "{}u8", v),
            Value::UShort(v)       => write!(f, "{}u16", v),
            Value::UInt(v)         => write!(f, "{}u32", v),
            Value::ULong(v)        => write!(f, "{}u64", v),
            Value::Byte(v)         => write!(f, "{}i8", v),
            Value::Short(v)        => write!(f, "{}i16", v),
            Value::Int(v)          => write!(f, "{}i32", v),
            Value::Long(v)         => write!(f, "{}i64", v),
            Value::Float(v)        => write!(f, "{}f32", v),
            Value::Double(v)       => write!(f, "{}f64", v),
            Value::Decimal32(v)    => write!(f, "d32({})", Self::hex(v)),
            Value::Decimal64(v)    => write!(f, "d64({})", Self::hex(v)),
            Value::Decimal128(v)   => write!(f, "d128({})", Self::hex(v)),
            Value::Char(v)         => write!(f, "'{}'", v),
            Value::Timestamp(v)    => write!(f, "ts({})", v),
            Value::Uuid(v)         => write!(f, "uuid({}-{}-{}-{}-{})",
                Self::hex(&v[..4]), Self::hex(&v[4..6]), Self::hex(&v[6..8]), Self::hex(&v[8..10]), Self::hex(&v[10..])),
            Value::Binary(v)       => write!(f, "x'{}'", Self::hex(v)),
            Value::String(v)       => write!(f, "\"{}\"", Self::escape(v)),
            Value::Symbol(v) if v.is_empty() || v.chars().any(|c| c.is_whitespace() || Self::PROTECTED_CHARS.contains(c))
                                   => write!(f, "#\"{}\"", Self::escape(v)),
            Value::Symbol(v)       => write!(f, "#{}", v),
            Value::Described(d, v) => write!(f, "described({}, {})", d, v),
            Value::List(v)         => write!(f, "[{}]", v.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")),
            Value::Map(v)          => write!(f, "{{{}}}", v.iter().map(|(k, v)| format!("{}: {}", k, v)).collect::<Vec<_>>().join(", ")),
            Value::Array(v)        => write!(f, "array[{}]", v.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")),
        }
    }
}

/// Used to encode AMQP values.
pub struct Encoder<'w, W: Write> {
    writer: &'w mut W,
}

impl<'w, W: Write> Encoder<'w, W> {

    /// Encode a value to the given writer. The resulting `usize` is the amount of bytes that got written.
    pub fn encode(value: &Value, writer: &'w mut W) -> Result<usize, EncodeError> {
        Self { writer }.encode_inner(value)
    }

    fn encode_inner(&mut self, value: &Value) -> Result<usize, EncodeError> {
        let (count, body) = match value {
            Value::List(inner) if inner.is_empty() => { return FormatCode::List0.encode(self.writer); },
            Value::List(inner)  => list_body(inner)?,
            Value::Map(inner)   => map_body(inner)?,
            Value::Array(inner) => array_body(inner)?,
            _ => {
                let code = preferred_code(value);
                let c = code.encode(self.writer)?;
                return Ok(c + self.encode_payload(value, code)?);
            },
        };
        let width = if count <= u8::MAX as usize && body.len() < u8::MAX as usize { Width::Small } else { Width::Large };
        let code = match (value, width) {
            (Value::List(_), Width::Small) => FormatCode::List8,
            (Value::List(_), Width::Large) => FormatCode::List32,
            (Value::Map(_), Width::Small)  => FormatCode::Map8,
            (Value::Map(_), Width::Large)  => FormatCode::Map32,
            (_, Width::Small)              => FormatCode::Array8,
            (_, Width::Large)              => FormatCode::Array32,
        };
        let c = code.encode(self.writer)?;
        Ok(c + self.encode_compound(width, count, &body)?)
    }

    /// Writes everything that follows the constructor `code`
    fn encode_payload(&mut self, value: &Value, code: FormatCode) -> Result<usize, EncodeError> {
        let width = code.width().unwrap_or(Width::Large);
        match value {
            Value::Null                 => Ok(0),
            Value::Bool(v)              => match code {
                FormatCode::Bool        => self.write(&[*v as u8]),
                _                       => Ok(0),
            },
            Value::UByte(v)             => self.write(&v.to_be_bytes()),
            Value::UShort(v)            => self.write(&v.to_be_bytes()),
            Value::UInt(v)              => match code {
                FormatCode::UInt0       => Ok(0),
                FormatCode::SmallUInt   => self.write(&[*v as u8]),
                _                       => self.write(&v.to_be_bytes()),
            },
            Value::ULong(v)             => match code {
                FormatCode::ULong0      => Ok(0),
                FormatCode::SmallULong  => self.write(&[*v as u8]),
                _                       => self.write(&v.to_be_bytes()),
            },
            Value::Byte(v)              => self.write(&v.to_be_bytes()),
            Value::Short(v)             => self.write(&v.to_be_bytes()),
            Value::Int(v)               => match code {
                FormatCode::SmallInt    => self.write(&(*v as i8).to_be_bytes()),
                _                       => self.write(&v.to_be_bytes()),
            },
            Value::Long(v)              => match code {
                FormatCode::SmallLong   => self.write(&(*v as i8).to_be_bytes()),
                _                       => self.write(&v.to_be_bytes()),
            },
            Value::Float(v)             => self.write(&v.to_be_bytes()),
            Value::Double(v)            => self.write(&v.to_be_bytes()),
            Value::Decimal32(v)         => self.write(v),
            Value::Decimal64(v)         => self.write(v),
            Value::Decimal128(v)        => self.write(v),
            Value::Char(v)              => self.write(&(*v as u32).to_be_bytes()),
            Value::Timestamp(v)         => self.write(&v.to_be_bytes()),
            Value::Uuid(v)              => self.write(v),
            Value::Binary(v)            => self.encode_variable(width, v),
            Value::String(v)            => self.encode_variable(width, v.as_bytes()),
            Value::Symbol(v)            => self.encode_variable(width, v.as_bytes()),
            Value::Described(d, v)      => {
                let c = self.encode_inner(d)?;
                Ok(c + self.encode_inner(v)?)
            },
            Value::List(inner)          => {
                let (count, body) = list_body(inner)?;
                self.encode_compound(width, count, &body)
            },
            Value::Map(inner)           => {
                let (count, body) = map_body(inner)?;
                self.encode_compound(width, count, &body)
            },
            Value::Array(inner)         => {
                let (count, body) = array_body(inner)?;
                self.encode_compound(width, count, &body)
            },
        }
    }

    fn encode_variable(&mut self, width: Width, bytes: &[u8]) -> Result<usize, EncodeError> {
        let c = width.encode_length(bytes.len(), self.writer)?;
        Ok(c + self.write(bytes)?)
    }

    /// The size field covers the count field and the body
    fn encode_compound(&mut self, width: Width, count: usize, body: &[u8]) -> Result<usize, EncodeError> {
        let mut c = width.encode_length(body.len() + width.bytes(), self.writer)?;
        c += width.encode_length(count, self.writer)?;
        c += self.write(body)?;
        Ok(c)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, EncodeError> {
        self.writer.write_all(bytes)?;
        Ok(bytes.len())
    }

}

/// The most compact constructor for a non-container value
fn preferred_code(value: &Value) -> FormatCode {
    match value {
        Value::Null                                  => FormatCode::Null,
        Value::Bool(true)                            => FormatCode::True,
        Value::Bool(false)                           => FormatCode::False,
        Value::UByte(_)                              => FormatCode::UByte,
        Value::UShort(_)                             => FormatCode::UShort,
        Value::UInt(0)                               => FormatCode::UInt0,
        Value::UInt(v) if *v <= u8::MAX as u32       => FormatCode::SmallUInt,
        Value::UInt(_)                               => FormatCode::UInt,
        Value::ULong(0)                              => FormatCode::ULong0,
        Value::ULong(v) if *v <= u8::MAX as u64      => FormatCode::SmallULong,
        Value::ULong(_)                              => FormatCode::ULong,
        Value::Byte(_)                               => FormatCode::Byte,
        Value::Short(_)                              => FormatCode::Short,
        Value::Int(v) if i8::try_from(*v).is_ok()    => FormatCode::SmallInt,
        Value::Int(_)                                => FormatCode::Int,
        Value::Long(v) if i8::try_from(*v).is_ok()   => FormatCode::SmallLong,
        Value::Long(_)                               => FormatCode::Long,
        Value::Float(_)                              => FormatCode::Float,
        Value::Double(_)                             => FormatCode::Double,
        Value::Decimal32(_)                          => FormatCode::Decimal32,
        Value::Decimal64(_)                          => FormatCode::Decimal64,
        Value::Decimal128(_)                         => FormatCode::Decimal128,
        Value::Char(_)                               => FormatCode::Char,
        Value::Timestamp(_)                          => FormatCode::Timestamp,
        Value::Uuid(_)                               => FormatCode::Uuid,
        Value::Binary(v)                             => variable_code(v.len(), FormatCode::VBin8, FormatCode::VBin32),
        Value::String(v)                             => variable_code(v.len(), FormatCode::Str8, FormatCode::Str32),
        Value::Symbol(v)                             => variable_code(v.len(), FormatCode::Sym8, FormatCode::Sym32),
        Value::Described(_, _)                       => FormatCode::Described,
        Value::List(_)                               => FormatCode::List32,
        Value::Map(_)                                => FormatCode::Map32,
        Value::Array(_)                              => FormatCode::Array32,
    }
}

#[inline]
fn variable_code(len: usize, small: FormatCode, large: FormatCode) -> FormatCode {
    match Width::of(len) {
        Width::Small => small,
        Width::Large => large,
    }
}

fn list_body(inner: &[Value]) -> Result<(usize, Vec<u8>), EncodeError> {
    let mut body = Vec::new();
    for value in inner.iter() {
        Encoder::encode(value, &mut body)?;
    }
    Ok((inner.len(), body))
}

fn map_body(inner: &[(Value, Value)]) -> Result<(usize, Vec<u8>), EncodeError> {
    let mut body = Vec::new();
    for (key, val) in inner.iter() {
        Encoder::encode(key, &mut body)?;
        Encoder::encode(val, &mut body)?;
    }
    Ok((inner.len() * 2, body))
}

fn array_body(inner: &[Value]) -> Result<(usize, Vec<u8>), EncodeError> {
    let mut body = Vec::new();
    let (descriptor, code) = array_constructor(inner)?;
    if code.category() == Category::Fixed(0) && inner.len() > MAX_EMPTY_ELEMENTS {
        return Err(EncodeError::Limit(inner.len()));
    }
    let mut encoder = Encoder { writer: &mut body };
    if let Some(descriptor) = descriptor {
        FormatCode::Described.encode(encoder.writer)?;
        encoder.encode_inner(descriptor)?;
    }
    code.encode(encoder.writer)?;
    for value in inner.iter() {
        encoder.encode_payload(undescribed(value).1, code)?;
    }
    Ok((inner.len(), body))
}

#[inline]
fn undescribed<'v, 'a>(value: &'v Value<'a>) -> (Option<&'v Value<'a>>, &'v Value<'a>) {
    match value {
        Value::Described(d, v) => (Some(d.as_ref()), v.as_ref()),
        v                      => (None, v),
    }
}

/// All elements of an array share one constructor, which is the widest one any of them needs. Empty arrays use `null`.
fn array_constructor<'v, 'a>(inner: &'v [Value<'a>]) -> Result<(Option<&'v Value<'a>>, FormatCode), EncodeError> {
    let first = match inner.first() {
        Some(first) => first,
        None        => { return Ok((None, FormatCode::Null)); },
    };
    let (descriptor, sample) = undescribed(first);
    for value in inner.iter() {
        let (d, v) = undescribed(value);
        if d != descriptor || std::mem::discriminant(v) != std::mem::discriminant(sample) {
            return Err(EncodeError::Array(first.typename(), value.typename()));
        }
    }
    let wide = inner.iter().any(|value| match undescribed(value).1 {
        Value::Binary(v)                     => v.len() > u8::MAX as usize,
        Value::String(v) | Value::Symbol(v)  => v.len() > u8::MAX as usize,
        _                                    => false,
    });
    let code = match sample {
        Value::Null           => FormatCode::Null,
        Value::Bool(_)        => FormatCode::Bool,
        Value::UByte(_)       => FormatCode::UByte,
        Value::UShort(_)      => FormatCode::UShort,
        Value::UInt(_)        => FormatCode::UInt,
        Value::ULong(_)       => FormatCode::ULong,
        Value::Byte(_)        => FormatCode::Byte,
        Value::Short(_)       => FormatCode::Short,
        Value::Int(_)         => FormatCode::Int,
        Value::Long(_)        => FormatCode::Long,
        Value::Float(_)       => FormatCode::Float,
        Value::Double(_)      => FormatCode::Double,
        Value::Decimal32(_)   => FormatCode::Decimal32,
        Value::Decimal64(_)   => FormatCode::Decimal64,
        Value::Decimal128(_)  => FormatCode::Decimal128,
        Value::Char(_)        => FormatCode::Char,
        Value::Timestamp(_)   => FormatCode::Timestamp,
        Value::Uuid(_)        => FormatCode::Uuid,
        Value::Binary(_)      => if wide { FormatCode::VBin32 } else { FormatCode::VBin8 },
        Value::String(_)      => if wide { FormatCode::Str32 } else { FormatCode::Str8 },
        Value::Symbol(_)      => if wide { FormatCode::Sym32 } else { FormatCode::Sym8 },
        Value::List(_)        => FormatCode::List32,
        Value::Map(_)         => FormatCode::Map32,
        Value::Array(_)       => FormatCode::Array32,
        Value::Described(_, _) => { return Err(EncodeError::Array(first.typename(), sample.typename())); },
    };
    Ok((descriptor, code))
}

/// Used to decode AMQP values. Strings, symbols and binaries are borrowed from the buffer.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    /// End of the innermost container being decoded
    end: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {

    /// Decode a single value from the given buffer. All strings, symbols and byte data will be borrowed from the
    /// buffer instead of copied. This means that the decoded value may only live as long as the buffer does. However,
    /// some allocations still occur: containers need their own heap space.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<(Value<'a>, usize), DecoderError> {
        Self::decode_with_depth(buf, DEFAULT_MAX_DEPTH)
    }

    /// Like `decode` but fails with `DecodeError::Depth` once containers nest deeper than `max_depth`
    pub fn decode_with_depth<B: ?Sized + AsRef<[u8]>>(buf: &'a B, max_depth: usize) -> Result<(Value<'a>, usize), DecoderError> {
        let mut decoder = Self::new(buf.as_ref(), max_depth);
        let value = decoder.decode_value().map_err(|e| e.at(decoder.pos))?;
        Ok((value, decoder.pos))
    }

    pub(crate) fn new(buf: &'a [u8], max_depth: usize) -> Self {
        Self { buf, pos: 0, end: buf.len(), depth: 0, max_depth }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.end - self.pos
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.buf[self.pos..self.end].first().copied()
    }

    pub(crate) fn decode_value(&mut self) -> Result<Value<'a>, DecodeError> {
        let code = self.decode_code()?;
        self.decode_payload(code)
    }

    pub(crate) fn decode_code(&mut self) -> Result<FormatCode, DecodeError> {
        let (code, c) = FormatCode::decode(&self.buf[self.pos..self.end])?;
        self.pos += c;
        Ok(code)
    }

    fn decode_payload(&mut self, code: FormatCode) -> Result<Value<'a>, DecodeError> {
        match code {
            FormatCode::Described  => self.nested(|d| {
                let descriptor = d.decode_value()?;
                let value = d.decode_value()?;
                Ok(Value::Described(Box::new(descriptor), Box::new(value)))
            }),
            FormatCode::Null       => Ok(Value::Null),
            FormatCode::True       => Ok(Value::Bool(true)),
            FormatCode::False      => Ok(Value::Bool(false)),
            FormatCode::UInt0      => Ok(Value::UInt(0)),
            FormatCode::ULong0     => Ok(Value::ULong(0)),
            FormatCode::List0      => Ok(Value::List(Vec::new())),
            FormatCode::Bool       => match u8::from_be_bytes(self.decode_fixed()?) {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                b => Err(DecodeError::InvalidBool(b)),
            },
            FormatCode::UByte      => Ok(Value::UByte(u8::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Byte       => Ok(Value::Byte(i8::from_be_bytes(self.decode_fixed()?))),
            FormatCode::SmallUInt  => Ok(Value::UInt(u8::from_be_bytes(self.decode_fixed()?).into())),
            FormatCode::SmallULong => Ok(Value::ULong(u8::from_be_bytes(self.decode_fixed()?).into())),
            FormatCode::SmallInt   => Ok(Value::Int(i8::from_be_bytes(self.decode_fixed()?).into())),
            FormatCode::SmallLong  => Ok(Value::Long(i8::from_be_bytes(self.decode_fixed()?).into())),
            FormatCode::UShort     => Ok(Value::UShort(u16::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Short      => Ok(Value::Short(i16::from_be_bytes(self.decode_fixed()?))),
            FormatCode::UInt       => Ok(Value::UInt(u32::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Int        => Ok(Value::Int(i32::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Float      => Ok(Value::Float(f32::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Char       => {
                let c = u32::from_be_bytes(self.decode_fixed()?);
                char::from_u32(c).map(Value::Char).ok_or(DecodeError::InvalidChar(c))
            },
            FormatCode::Decimal32  => Ok(Value::Decimal32(self.decode_fixed()?)),
            FormatCode::ULong      => Ok(Value::ULong(u64::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Long       => Ok(Value::Long(i64::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Double     => Ok(Value::Double(f64::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Timestamp  => Ok(Value::Timestamp(i64::from_be_bytes(self.decode_fixed()?))),
            FormatCode::Decimal64  => Ok(Value::Decimal64(self.decode_fixed()?)),
            FormatCode::Decimal128 => Ok(Value::Decimal128(self.decode_fixed()?)),
            FormatCode::Uuid       => Ok(Value::Uuid(self.decode_fixed()?)),
            FormatCode::VBin8      => Ok(Value::Binary(Cow::Borrowed(self.decode_variable(Width::Small)?))),
            FormatCode::VBin32     => Ok(Value::Binary(Cow::Borrowed(self.decode_variable(Width::Large)?))),
            FormatCode::Str8       => Ok(Value::String(Cow::Borrowed(from_utf8(self.decode_variable(Width::Small)?)?))),
            FormatCode::Str32      => Ok(Value::String(Cow::Borrowed(from_utf8(self.decode_variable(Width::Large)?)?))),
            FormatCode::Sym8       => Ok(Value::Symbol(Cow::Borrowed(from_utf8(self.decode_variable(Width::Small)?)?))),
            FormatCode::Sym32      => Ok(Value::Symbol(Cow::Borrowed(from_utf8(self.decode_variable(Width::Large)?)?))),
            FormatCode::List8      => self.decode_compound(Width::Small, Self::decode_list),
            FormatCode::List32     => self.decode_compound(Width::Large, Self::decode_list),
            FormatCode::Map8       => self.decode_compound(Width::Small, Self::decode_map),
            FormatCode::Map32      => self.decode_compound(Width::Large, Self::decode_map),
            FormatCode::Array8     => self.decode_compound(Width::Small, Self::decode_array),
            FormatCode::Array32    => self.decode_compound(Width::Large, Self::decode_array),
        }
    }

    /// Decodes the size and count fields of a container and hands the count to `f`, which may not read past the
    /// declared size and has to consume all of it.
    fn decode_compound(&mut self, width: Width, f: fn(&mut Self, usize) -> Result<Value<'a>, DecodeError>) -> Result<Value<'a>, DecodeError> {
        let size = self.decode_length(width)?;
        if size > self.remaining() {
            return Err(DecodeError::Truncated);
        }
        let start = self.pos;
        let end = start + size;
        let outer = std::mem::replace(&mut self.end, end);
        let result = self.nested(|d| {
            let count = d.decode_length(width)?;
            f(d, count)
        });
        self.end = outer;
        let value = result?;
        if self.pos != end {
            return Err(DecodeError::Size { declared: size, consumed: self.pos - start });
        }
        Ok(value)
    }

    fn decode_list(&mut self, count: usize) -> Result<Value<'a>, DecodeError> {
        if count > self.remaining() {
            return Err(DecodeError::Truncated);
        }
        let mut elements = Vec::with_capacity(0);
        elements.try_reserve(count)?;
        for _ in 0..count {
            elements.push(self.decode_value()?);
        }
        Ok(Value::List(elements))
    }

    fn decode_map(&mut self, count: usize) -> Result<Value<'a>, DecodeError> {
        if count % 2 != 0 {
            return Err(DecodeError::OddMapCount(count));
        }
        if count > self.remaining() {
            return Err(DecodeError::Truncated);
        }
        let mut elements = Vec::with_capacity(0);
        elements.try_reserve(count / 2)?;
        for _ in 0..count / 2 {
            let key = self.decode_value()?;
            let val = self.decode_value()?;
            elements.push((key, val));
        }
        Ok(Value::Map(elements))
    }

    fn decode_array(&mut self, count: usize) -> Result<Value<'a>, DecodeError> {
        let mut code = self.decode_code()?;
        let mut descriptor = None;
        if code == FormatCode::Described {
            descriptor = Some(self.decode_value()?);
            code = self.decode_code()?;
            if code == FormatCode::Described {
                return Err(DecodeError::UnknownConstructor(code as u8));
            }
        }
        let element_width = match code.category() {
            Category::Fixed(n)                                                 => n,
            Category::Variable(w) | Category::Compound(w) | Category::Array(w) => w.bytes(),
            Category::Described                                                => 1,
        };
        match element_width {
            0 if count > MAX_EMPTY_ELEMENTS     => { return Err(DecodeError::Limit(count)); },
            0                                   => {},
            w if count > self.remaining() / w   => { return Err(DecodeError::Truncated); },
            _                                   => {},
        }
        let mut elements = Vec::with_capacity(0);
        elements.try_reserve(count)?;
        for _ in 0..count {
            let value = self.decode_payload(code)?;
            elements.push(match &descriptor {
                Some(d) => Value::Described(Box::new(d.clone()), Box::new(value)),
                None    => value,
            });
        }
        Ok(Value::Array(elements))
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, DecodeError>) -> Result<T, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(DecodeError::Depth(self.max_depth));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn decode_length(&mut self, width: Width) -> Result<usize, DecodeError> {
        let (len, c) = width.decode_length(&self.buf[self.pos..self.end])?;
        self.pos += c;
        Ok(len)
    }

    fn decode_variable(&mut self, width: Width) -> Result<&'a [u8], DecodeError> {
        let len = self.decode_length(width)?;
        self.decode_slice(len)
    }

    fn decode_fixed<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.decode_slice(N)?);
        Ok(bytes)
    }

    fn decode_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            Err(DecodeError::Truncated)
        } else {
            self.pos += len;
            Ok(&self.buf[self.pos - len .. self.pos])
        }
    }

}

#[cfg(test)]
mod test {
    use super::{Value, Encoder, Decoder, DecodeError, MAX_EMPTY_ELEMENTS};
    use crate::error::{DecoderError, EncodeError};
    use std::borrow::Cow;

    #[test]
    fn simple_values() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Null, &mut buf);
        assert_roundtrip(Value::Bool(true), &mut buf);
        assert_roundtrip(Value::Bool(false), &mut buf);
        for i in [0, 1, 255, 256, u32::MAX] {
            assert_roundtrip(Value::UInt(i), &mut buf);
            assert_roundtrip(Value::ULong(i as u64), &mut buf);
        }
        for i in [i64::MIN, -129, -128, -1, 0, 127, 128, i64::MAX] {
            assert_roundtrip(Value::Long(i), &mut buf);
            assert_roundtrip(Value::Int(i as i32), &mut buf);
        }
        assert_roundtrip(Value::UByte(200), &mut buf);
        assert_roundtrip(Value::UShort(u16::MAX), &mut buf);
        assert_roundtrip(Value::Byte(i8::MIN), &mut buf);
        assert_roundtrip(Value::Short(-300), &mut buf);
        assert_roundtrip(Value::ULong(u64::MAX), &mut buf);
        assert_roundtrip(Value::Char('ß'), &mut buf);
        assert_roundtrip(Value::Timestamp(1_311_704_463_521), &mut buf);
        assert_roundtrip(Value::Uuid([7; 16]), &mut buf);
        assert_roundtrip(Value::Decimal32([1, 2, 3, 4]), &mut buf);
        assert_roundtrip(Value::Decimal64([9; 8]), &mut buf);
        assert_roundtrip(Value::Decimal128([3; 16]), &mut buf);
    }

    #[test]
    fn compact_encodings() {
        assert_eq!(encoded(Value::UInt(0)), [0x43]);
        assert_eq!(encoded(Value::UInt(255)), [0x52, 0xff]);
        assert_eq!(encoded(Value::UInt(256)), [0x70, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(encoded(Value::ULong(0)), [0x44]);
        assert_eq!(encoded(Value::ULong(7)), [0x53, 0x07]);
        assert_eq!(encoded(Value::Int(-1)), [0x54, 0xff]);
        assert_eq!(encoded(Value::Int(128)), [0x71, 0x00, 0x00, 0x00, 0x80]);
        assert_eq!(encoded(Value::Long(-128)), [0x55, 0x80]);
        assert_eq!(encoded(Value::Bool(true)), [0x41]);
        assert_eq!(encoded(Value::List(vec![])), [0x45]);
        assert_eq!(encoded(Value::Map(vec![])), [0xc1, 0x01, 0x00]);
        assert_eq!(encoded(Value::Array(vec![])), [0xe0, 0x02, 0x00, 0x40]);
    }

    #[test]
    fn alternative_encodings() {
        assert_eq!(Value::Bool(true), decode(&[0x56, 0x01]).unwrap().0);
        assert_eq!(Value::Bool(false), decode(&[0x56, 0x00]).unwrap().0);
        assert_eq!(Value::UInt(5), decode(&[0x70, 0x00, 0x00, 0x00, 0x05]).unwrap().0);
        assert_eq!(Value::List(vec![]), decode(&[0xd0, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00]).unwrap().0);
        assert_eq!(Value::String(Cow::Borrowed("ab")), decode(&[0xb1, 0x00, 0x00, 0x00, 0x02, 0x61, 0x62]).unwrap().0);
    }

    #[test]
    fn invalid_bool() {
        assert_eq!(DecodeError::InvalidBool(2), decode(&[0x56, 0x02]).unwrap_err().into_inner());
    }

    #[test]
    fn invalid_char() {
        assert_eq!(DecodeError::InvalidChar(0xd800), decode(&[0x73, 0x00, 0x00, 0xd8, 0x00]).unwrap_err().into_inner());
    }

    #[test]
    fn floats() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Double(f64::MAX), &mut buf);
        assert_roundtrip(Value::Double(f64::MIN), &mut buf);
        assert_roundtrip(Value::Double(std::f64::consts::PI), &mut buf);
        assert_roundtrip(Value::Float(f32::MAX), &mut buf);
        assert_roundtrip(Value::Float(f32::MIN), &mut buf);
        assert_roundtrip(Value::Float(std::f32::consts::PI), &mut buf);
    }

    #[test]
    fn strings() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::String(Cow::Borrowed("Üben von Xylophon und Querflöte ist ja zweckmäßig.")), &mut buf);
        assert_roundtrip(Value::Symbol(Cow::Borrowed("amqp:accepted:list")), &mut buf);
        let long = "x".repeat(300);
        assert_roundtrip(Value::String(Cow::Borrowed(&long[..])), &mut buf);
        assert_eq!(encoded(Value::String(Cow::Borrowed(&long[..])))[..5], [0xb1, 0x00, 0x00, 0x01, 0x2c]);
    }

    #[test]
    fn invalid_utf8() {
        assert!(matches!(decode(&[0xa1, 0x01, 0xff]).unwrap_err().into_inner(), DecodeError::Utf8(_)));
    }

    #[test]
    fn bytes() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Binary(Cow::Borrowed(&[1, 2, 3, 4, 255][..])), &mut buf);
        assert_eq!(encoded(Value::Binary(Cow::Borrowed(&[1, 2][..]))), [0xa0, 0x02, 0x01, 0x02]);
        let long = vec![0xab; 256];
        assert_roundtrip(Value::Binary(Cow::Borrowed(&long[..])), &mut buf);
        assert_eq!(encoded(Value::Binary(Cow::Borrowed(&long[..])))[0], 0xb0);
    }

    #[test]
    fn map_with_zero_count() {
        let value = Value::Map(vec![(Value::String(Cow::Borrowed("count")), Value::Int(0))]);
        let buf = encoded(value.clone());
        assert_eq!(buf, [0xc1, 0x0a, 0x02, 0xa1, 0x05, 0x63, 0x6f, 0x75, 0x6e, 0x74, 0x54, 0x00]);
        let (decoded, consumed) = Decoder::decode(&buf).unwrap();
        assert_eq!(12, consumed);
        match decoded {
            Value::Map(pairs) => {
                assert_eq!(1, pairs.len());
                assert_eq!(Some("count"), pairs[0].0.as_str());
                assert_eq!(Value::Int(0), pairs[0].1);
            },
            other => panic!("expected a map, got {}", other),
        }
        let buf = encoded(Value::Map(vec![(Value::String(Cow::Borrowed("count")), Value::UInt(0))]));
        assert_eq!(buf, [0xc1, 0x09, 0x02, 0xa1, 0x05, 0x63, 0x6f, 0x75, 0x6e, 0x74, 0x43]);
    }

    #[test]
    fn duplicate_keys_are_kept() {
        let buf = [0xc1, 0x09, 0x04, 0xa3, 0x01, 0x6b, 0x41, 0xa3, 0x01, 0x6b, 0x42];
        assert_eq!(Value::Map(vec![
            (Value::Symbol(Cow::Borrowed("k")), Value::Bool(true)),
            (Value::Symbol(Cow::Borrowed("k")), Value::Bool(false)),
        ]), decode(&buf).unwrap().0);
    }

    #[test]
    fn list_mixed() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::List(vec![
                Value::Int(1),
                Value::String(Cow::Borrowed("Jessica")),
                Value::Symbol(Cow::Borrowed("FelisCatus")),
                Value::Float(std::f32::consts::PI),
                Value::List(vec![Value::Null, Value::List(vec![])]),
                Value::Map(vec![(Value::ULong(1), Value::Binary(Cow::Borrowed(&b"x"[..])))]),
        ]), &mut buf);
    }

    #[test]
    fn list_long() {
        let mut buf = Vec::new();
        for i in [1, 84, 85, 255, 256, 1000] {
            assert_roundtrip(Value::List(vec![Value::Long(1); i]), &mut buf);
        }
    }

    #[test]
    fn arrays() {
        let value = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(encoded(value.clone()), [0xe0, 0x0a, 0x02, 0x71, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]);
        let mut buf = Vec::new();
        assert_roundtrip(value, &mut buf);
        assert_roundtrip(Value::Array(vec![Value::Symbol(Cow::Borrowed("a")), Value::Symbol(Cow::Borrowed("bc"))]), &mut buf);
        assert_roundtrip(Value::Array(vec![Value::Bool(true), Value::Bool(false)]), &mut buf);
        assert_roundtrip(Value::Array(vec![Value::UInt(0), Value::UInt(70_000)]), &mut buf);
        assert_roundtrip(Value::Array(vec![Value::List(vec![]), Value::List(vec![Value::Null])]), &mut buf);
        assert_roundtrip(Value::Array(vec![Value::Array(vec![Value::Short(1)]), Value::Array(vec![Value::Short(2)])]), &mut buf);
        assert_roundtrip(Value::Array(vec![Value::Null; 3]), &mut buf);
        let long = "y".repeat(256);
        assert_roundtrip(Value::Array(vec![Value::String(Cow::Borrowed("a")), Value::String(Cow::Borrowed(&long[..]))]), &mut buf);
    }

    #[test]
    fn payload_less_arrays_are_capped() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Array(vec![Value::Null; MAX_EMPTY_ELEMENTS]), &mut buf);
        match Encoder::encode(&Value::Array(vec![Value::Null; MAX_EMPTY_ELEMENTS + 1]), &mut buf) {
            Err(EncodeError::Limit(65537)) => {},
            other => panic!("unexpected result {:?}", other),
        }
        let oversized = [0xf0, 0x00, 0x00, 0x00, 0x05, 0x00, 0x01, 0x00, 0x01, 0x40];
        assert_eq!(DecodeError::Limit(65537), decode(&oversized).unwrap_err().into_inner());
    }

    #[test]
    fn heterogeneous_array() {
        let mut buf = Vec::new();
        match Encoder::encode(&Value::Array(vec![Value::Int(1), Value::Long(2)]), &mut buf) {
            Err(EncodeError::Array("int", "long")) => {},
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn described() {
        let mut buf = Vec::new();
        let value = Value::Described(Box::new(Value::ULong(0x24)), Box::new(Value::List(vec![])));
        assert_eq!(encoded(value.clone()), [0x00, 0x53, 0x24, 0x45]);
        assert_roundtrip(value, &mut buf);
        let descriptor = Value::Symbol(Cow::Borrowed("example:point"));
        assert_roundtrip(Value::Array(vec![
            Value::Described(Box::new(descriptor.clone()), Box::new(Value::Int(1))),
            Value::Described(Box::new(descriptor.clone()), Box::new(Value::Int(2))),
        ]), &mut buf);
    }

    #[test]
    fn truncated() {
        assert_eq!(DecodeError::Truncated, decode(&[0xa1, 0x05, 0x61]).unwrap_err().into_inner());
        assert_eq!(DecodeError::Truncated, decode(&[0x71, 0x00]).unwrap_err().into_inner());
        assert_eq!(DecodeError::Truncated, decode(&[0xc0, 0x01, 0xff]).unwrap_err().into_inner());
        assert_eq!(DecodeError::Truncated, decode(&[0xc0, 0x09, 0x01]).unwrap_err().into_inner());
        assert_eq!(DecodeError::Truncated, decode(&[0xe0, 0x02, 0xff, 0x71]).unwrap_err().into_inner());
    }

    #[test]
    fn element_may_not_leave_its_container() {
        // The list claims two bytes: the count and the constructor of a smalluint whose payload lies outside
        assert_eq!(DecodeError::Truncated, decode(&[0xc0, 0x02, 0x01, 0x52, 0x05]).unwrap_err().into_inner());
    }

    #[test]
    fn declared_size_must_match() {
        assert_eq!(DecodeError::Size { declared: 3, consumed: 2 }, decode(&[0xc0, 0x03, 0x01, 0x40, 0x40]).unwrap_err().into_inner());
    }

    #[test]
    fn unknown_constructor() {
        let err = decode(&[0xc0, 0x02, 0x01, 0x01]).unwrap_err();
        assert_eq!(3, err.position());
        assert_eq!(DecodeError::UnknownConstructor(0x01), err.into_inner());
    }

    #[test]
    fn odd_map() {
        assert_eq!(DecodeError::OddMapCount(1), decode(&[0xc1, 0x02, 0x01, 0x40]).unwrap_err().into_inner());
    }

    #[test]
    fn depth_limit() {
        let mut value = Value::List(vec![]);
        for _ in 0..40 {
            value = Value::List(vec![value]);
        }
        let buf = encoded(value.clone());
        assert_eq!(DecodeError::Depth(32), Decoder::decode(&buf).unwrap_err().into_inner());
        assert_eq!(value, Decoder::decode_with_depth(&buf, 40).unwrap().0);
        assert_eq!(DecodeError::Depth(0), Decoder::decode_with_depth(&[0xc0u8, 0x01, 0x00], 0).unwrap_err().into_inner());
    }

    #[test]
    fn decoding_is_pure() {
        let buf = encoded(Value::List(vec![Value::Symbol(Cow::Borrowed("x")), Value::Timestamp(-1)]));
        let first = Decoder::decode(&buf).unwrap();
        let second = Decoder::decode(&buf).unwrap();
        assert_eq!(first, second);
        assert_eq!(buf.len(), first.1);
    }

    #[test]
    fn into_owned() {
        let buf = encoded(Value::Map(vec![(Value::Symbol(Cow::Borrowed("k")), Value::Binary(Cow::Borrowed(&b"v"[..])))]));
        let owned: Value<'static> = Decoder::decode(&buf).unwrap().0.into_owned();
        drop(buf);
        assert_eq!(Value::Map(vec![(Value::Symbol(Cow::Owned("k".into())), Value::Binary(Cow::Owned(b"v".to_vec())))]), owned);
    }

    #[test]
    fn display() {
        let value = Value::Map(vec![
            (Value::Symbol(Cow::Borrowed("count")), Value::UInt(0)),
            (Value::Symbol(Cow::Borrowed("with space")), Value::List(vec![Value::Bool(true), Value::String(Cow::Borrowed("a\"b"))])),
            (Value::Long(-3), Value::Array(vec![Value::Binary(Cow::Borrowed(&[0xca, 0xfe][..]))])),
        ]);
        assert_eq!(r#"{#count: 0u32, #"with space": [true, "a\"b"], -3i64: array[x'cafe']}"#, value.to_string());
        assert_eq!("#\"a\tb\"", Value::Symbol(Cow::Borrowed("a\tb")).to_string());
        assert_eq!("uuid(00010203-0405-0607-0809-0a0b0c0d0e0f)",
            Value::Uuid([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]).to_string());
    }

    fn decode(buf: &[u8]) -> Result<(Value<'_>, usize), DecoderError> {
        Decoder::decode(buf)
    }

    fn encoded(value: Value) -> Vec<u8> {
        let mut buf = Vec::new();
        let c = Encoder::encode(&value, &mut buf).unwrap();
        assert_eq!(c, buf.len());
        buf
    }

    fn assert_roundtrip(value: Value, buf: &mut Vec<u8>) {
        let c = Encoder::encode(&value, buf).unwrap();
        assert_eq!(c, buf.len());
        let (decoded, consumed) = Decoder::decode(buf).unwrap();
        assert_eq!(value, decoded);
        assert_eq!(c, consumed);
        buf.clear();
    }

}
