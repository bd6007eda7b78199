//! A bare message is a sequence of sections, each of which is a described type: the constructor `0x00`, a descriptor
//! identifying the section and the section's value. Descriptors are either a numeric code (domain `0x00000000`, the
//! AMQP domain, and a section id) or the equivalent symbolic name.

use crate::error::{DecodeError, EncodeError};
use crate::format_code::FormatCode;
use crate::options::DEFAULT_MAX_DEPTH;
use crate::value::{Decoder, Encoder, Value};
use std::fmt::{self, Display, Formatter};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    MessageHeader,
    DeliveryAnnotations,
    MessageAnnotations,
    MessageProperties,
    ApplicationProperties,
    ApplicationData,
    AmqpSequence,
    AmqpValue,
    Footer,
}

/// A section descriptor as found on wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Code(u64),
    Name(String),
}

impl SectionKind {

    const ALL: [SectionKind; 9] = [
        SectionKind::MessageHeader,
        SectionKind::DeliveryAnnotations,
        SectionKind::MessageAnnotations,
        SectionKind::MessageProperties,
        SectionKind::ApplicationProperties,
        SectionKind::ApplicationData,
        SectionKind::AmqpSequence,
        SectionKind::AmqpValue,
        SectionKind::Footer,
    ];

    /// The numeric descriptor
    pub const fn code(&self) -> u64 {
        match *self {
            SectionKind::MessageHeader         => 0x70,
            SectionKind::DeliveryAnnotations   => 0x71,
            SectionKind::MessageAnnotations    => 0x72,
            SectionKind::MessageProperties     => 0x73,
            SectionKind::ApplicationProperties => 0x74,
            SectionKind::ApplicationData       => 0x75,
            SectionKind::AmqpSequence          => 0x76,
            SectionKind::AmqpValue             => 0x77,
            SectionKind::Footer                => 0x78,
        }
    }

    /// The symbolic descriptor
    pub const fn name(&self) -> &'static str {
        match *self {
            SectionKind::MessageHeader         => "amqp:header:list",
            SectionKind::DeliveryAnnotations   => "amqp:delivery-annotations:map",
            SectionKind::MessageAnnotations    => "amqp:message-annotations:map",
            SectionKind::MessageProperties     => "amqp:properties:list",
            SectionKind::ApplicationProperties => "amqp:application-properties:map",
            SectionKind::ApplicationData       => "amqp:data:binary",
            SectionKind::AmqpSequence          => "amqp:amqp-sequence:list",
            SectionKind::AmqpValue             => "amqp:amqp-value:*",
            SectionKind::Footer                => "amqp:footer:map",
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Resolves the section descriptor at the start of `buf`. Returns the section kind and the number of bytes the
    /// descriptor occupies, after which the section's value starts.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &B) -> Result<(Self, usize), DecodeError> {
        let mut decoder = Decoder::new(buf.as_ref(), DEFAULT_MAX_DEPTH);
        let kind = Self::read(&mut decoder)?;
        Ok((kind, decoder.position()))
    }

    pub(crate) fn read(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        match decoder.peek() {
            None                                          => { return Err(DecodeError::Truncated); },
            Some(code) if code == FormatCode::Described as u8 => {},
            Some(code)                                    => { return Err(DecodeError::NotDescribed(code)); },
        }
        decoder.decode_code()?;
        match decoder.decode_value()? {
            Value::ULong(code) => Self::from_code(code).ok_or(DecodeError::UnrecognizedSection(Descriptor::Code(code))),
            Value::Symbol(name) => Self::from_name(&name).ok_or_else(|| DecodeError::UnrecognizedSection(Descriptor::Name(name.into_owned()))),
            other => Err(DecodeError::UnexpectedType { context: "section descriptor", expected: "ulong or symbol", found: other.typename() }),
        }
    }

    /// Writes the compact numeric descriptor. Returns the number of written bytes.
    pub fn encode_descriptor<W: Write>(&self, w: &mut W) -> Result<usize, EncodeError> {
        let c = FormatCode::Described.encode(w)?;
        Ok(c + Encoder::encode(&Value::ULong(self.code()), w)?)
    }

}

impl Display for SectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            SectionKind::MessageHeader         => "header",
            SectionKind::DeliveryAnnotations   => "delivery-annotations",
            SectionKind::MessageAnnotations    => "message-annotations",
            SectionKind::MessageProperties     => "properties",
            SectionKind::ApplicationProperties => "application-properties",
            SectionKind::ApplicationData       => "data",
            SectionKind::AmqpSequence          => "amqp-sequence",
            SectionKind::AmqpValue             => "amqp-value",
            SectionKind::Footer                => "footer",
        })
    }
}

impl Display for Descriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Code(code) => write!(f, "0x{:016x}", code),
            Descriptor::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Descriptor, SectionKind};
    use crate::error::DecodeError;

    #[test]
    fn numeric_descriptors() {
        assert_eq!((SectionKind::MessageHeader, 3), SectionKind::decode(&[0x00u8, 0x53, 0x70]).unwrap());
        assert_eq!((SectionKind::ApplicationData, 10), SectionKind::decode(&[0x00u8, 0x80, 0, 0, 0, 0, 0, 0, 0, 0x75]).unwrap());
        assert_eq!((SectionKind::AmqpValue, 3), SectionKind::decode(&[0x00u8, 0x53, 0x77, 0xa1, 0x00]).unwrap());
    }

    #[test]
    fn symbolic_descriptors() {
        let mut buf = vec![0x00, 0xa3, 16];
        buf.extend_from_slice(b"amqp:header:list");
        assert_eq!((SectionKind::MessageHeader, 19), SectionKind::decode(&buf).unwrap());
    }

    #[test]
    fn unrecognized() {
        assert_eq!(Err(DecodeError::UnrecognizedSection(Descriptor::Code(0x7a))), SectionKind::decode(&[0x00u8, 0x53, 0x7a]));
        assert_eq!(Err(DecodeError::UnrecognizedSection(Descriptor::Code(0))), SectionKind::decode(&[0x00u8, 0x44]));
        let mut buf = vec![0x00, 0xa3, 9];
        buf.extend_from_slice(b"amqp:nope");
        assert_eq!(Err(DecodeError::UnrecognizedSection(Descriptor::Name("amqp:nope".into()))), SectionKind::decode(&buf));
    }

    #[test]
    fn not_described() {
        assert_eq!(Err(DecodeError::NotDescribed(0x40)), SectionKind::decode(&[0x40u8]));
        assert_eq!(Err(DecodeError::Truncated), SectionKind::decode(&[0u8; 0]));
        assert_eq!(Err(DecodeError::Truncated), SectionKind::decode(&[0x00u8, 0x53]));
        assert!(matches!(SectionKind::decode(&[0x00u8, 0x40]), Err(DecodeError::UnexpectedType { found: "null", .. })));
    }

    #[test]
    fn every_kind_resolves() {
        for kind in SectionKind::ALL.iter().copied() {
            let mut buf = Vec::new();
            assert_eq!(3, kind.encode_descriptor(&mut buf).unwrap());
            assert_eq!(buf, [0x00, 0x53, kind.code() as u8]);
            assert_eq!((kind, 3), SectionKind::decode(&buf).unwrap());
            assert_eq!(Some(kind), SectionKind::from_name(kind.name()));
        }
    }

}
