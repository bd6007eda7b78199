use crate::registry::{Descriptor, SectionKind};
use std::fmt::{Display, Formatter, self};

/// A `DecodeError` together with the input position at which it occurred.
#[derive(Debug, PartialEq)]
pub struct DecoderError {
    inner: DecodeError,
    at: usize,
}

impl DecoderError {
    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    pub fn inner(&self) -> &DecodeError {
        &self.inner
    }

    /// Offset into the input buffer where decoding stopped
    pub fn position(&self) -> usize {
        self.at
    }
}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
       Some(&self.inner)
    }
}

impl Display for DecoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} at input position {}", self.inner, self.at)
    }
}

#[derive(Debug, PartialEq)]
pub enum DecodeError {
    /// A declared length or count reaches past the end of the buffer or the enclosing container
    Truncated,
    UnknownConstructor(u8),
    UnrecognizedSection(Descriptor),
    /// A section boundary did not start with the described type constructor `0x00`
    NotDescribed(u8),
    Utf8(std::str::Utf8Error),
    InvalidBool(u8),
    InvalidChar(u32),
    OddMapCount(usize),
    /// A list, map or array declared `declared` bytes but its elements took up `consumed`
    Size { declared: usize, consumed: usize },
    Depth(usize),
    IllegalKey(&'static str),
    UnexpectedType { context: &'static str, expected: &'static str, found: &'static str },
    DuplicateSection(SectionKind),
    MixedBody(SectionKind),
    Allocation,
    /// An array holds more payload-less elements than the decoder accepts
    Limit(usize),
}

impl DecodeError {
    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(e: std::str::Utf8Error) -> DecodeError {
        DecodeError::Utf8(e)
    }
}

impl From<std::collections::TryReserveError> for DecodeError {
    fn from(_e: std::collections::TryReserveError) -> DecodeError {
        DecodeError::Allocation
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DecodeError::Truncated => f.write_str("Unexpected end of buffer while decoding"),
            DecodeError::UnknownConstructor(code) => write!(f, "Unknown constructor 0x{:02x}", code),
            DecodeError::UnrecognizedSection(descriptor) => write!(f, "Unrecognized section descriptor {}", descriptor),
            DecodeError::NotDescribed(code) => write!(f, "Expected a described section, found constructor 0x{:02x}", code),
            DecodeError::Utf8(e) => write!(f, "String slice was not valid Utf-8: {}", e),
            DecodeError::InvalidBool(value) => write!(f, "Boolean payload must be 0 or 1, found {}", value),
            DecodeError::InvalidChar(value) => write!(f, "0x{:08x} is not a unicode scalar value", value),
            DecodeError::OddMapCount(count) => write!(f, "Map declares an odd number of elements {}", count),
            DecodeError::Size { declared, consumed } => write!(f, "Container declares {} bytes but its elements occupy {}", declared, consumed),
            DecodeError::Depth(max) => write!(f, "Nesting exceeds maximum depth {}", max),
            DecodeError::IllegalKey(found) => write!(f, "Illegal key of type {}", found),
            DecodeError::UnexpectedType { context, expected, found } => write!(f, "Expected {} for {}, found {}", expected, context, found),
            DecodeError::DuplicateSection(kind) => write!(f, "Section {} occurs more than once", kind),
            DecodeError::MixedBody(kind) => write!(f, "Section {} conflicts with a previous body section", kind),
            DecodeError::Allocation => f.write_str("An allocation failed"),
            DecodeError::Limit(count) => write!(f, "Array of {} payload-less elements exceeds the maximum {}", count, crate::value::MAX_EMPTY_ELEMENTS),
        }
    }
}

#[derive(Debug)]
pub enum EncodeError {
    Io(std::io::Error),
    Length(usize),
    /// Array elements must share a single constructor
    Array(&'static str, &'static str),
    MixedBody,
    /// An array holds more payload-less elements than a decoder accepts
    Limit(usize),
}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> EncodeError {
        EncodeError::Io(e)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            EncodeError::Io(e) => write!(f, "IO error {}", e),
            EncodeError::Length(value) => write!(f, "Length {} exceeds maximum {}", value, u32::MAX),
            EncodeError::Array(first, other) => write!(f, "Array of {} cannot hold a {}", first, other),
            EncodeError::MixedBody => f.write_str("A message carries at most one kind of body"),
            EncodeError::Limit(count) => write!(f, "Array of {} payload-less elements exceeds the maximum {}", count, crate::value::MAX_EMPTY_ELEMENTS),
        }
    }
}
