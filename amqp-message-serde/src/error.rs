use std::fmt::{self, Display};
use serde::{de, ser};
use amqp_message::{DecoderError, EncodeError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    // Decode
    Decode(DecoderError),
    /// Input continues after the value at the given position
    Trailing(usize),
    UnexpectedType(&'static [&'static str], &'static str),
    Int,
    /// The message has no amqp-value section
    NoValue,
    // Encode
    Encode(EncodeError),
    // Both
    Message(String),
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(msg) => fmt.write_str(msg),
            Error::Encode(e) => write!(fmt, "Encoding error: {}", e),
            Error::Decode(e) => write!(fmt, "Decoding error: {}", e),
            Error::Trailing(at) => write!(fmt, "Trailing bytes in input after position {}", at),
            Error::UnexpectedType(expected, actual) => write!(fmt, "Unexpected type: expected one of ({}), found {}", expected.join(", "), actual),
            Error::Int => fmt.write_str("Integer didn't fit into target type"),
            Error::NoValue => fmt.write_str("Message carries no amqp-value section"),
        }
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Error {
        Error::Encode(e)
    }
}

impl From<DecoderError> for Error {
    fn from(e: DecoderError) -> Error {
        Error::Decode(e)
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(_e: std::num::TryFromIntError) -> Error {
        Error::Int
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Encode(e) => Some(e),
            _ => None,
        }
    }
}
