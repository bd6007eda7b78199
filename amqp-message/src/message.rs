//! A bare message is the concatenation of its sections. Decoding walks the buffer section by section, resolving each
//! descriptor and folding the section into the message; encoding writes all present sections in wire order.

use crate::error::{DecodeError, DecoderError, EncodeError};
use crate::options::{DecodeOptions, RepeatedSection};
use crate::registry::SectionKind;
use crate::sections::{encode_section, Annotations, ApplicationProperties, Header, Properties};
use crate::value::{Decoder, Value};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::io::Write;
use tracing::{trace, warn};

/// A decoded AMQP 1.0 message. At most one of `body`, `amqp_sequence` and `amqp_value` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message<'a> {
    pub header: Option<Header>,
    pub delivery_annotations: Option<Annotations<'a>>,
    pub annotations: Option<Annotations<'a>>,
    pub properties: Option<Properties<'a>>,
    pub application_properties: Option<ApplicationProperties<'a>>,
    /// The concatenated payload of all data sections
    pub body: Option<Cow<'a, [u8]>>,
    /// The concatenated elements of all amqp-sequence sections
    pub amqp_sequence: Option<Vec<Value<'a>>>,
    pub amqp_value: Option<Value<'a>>,
    pub footer: Option<Annotations<'a>>,
}

impl<'a> Message<'a> {

    /// Decodes a complete message. An empty buffer is a message without any sections.
    pub fn unmarshal<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<Self, DecoderError> {
        Self::unmarshal_with(buf, &DecodeOptions::default())
    }

    pub fn unmarshal_with<B: ?Sized + AsRef<[u8]>>(buf: &'a B, options: &DecodeOptions) -> Result<Self, DecoderError> {
        let mut decoder = Decoder::new(buf.as_ref(), options.max_depth);
        let mut assembler = Assembler::new(options.repeated_sections);
        while decoder.remaining() > 0 {
            let start = decoder.position();
            let kind = SectionKind::read(&mut decoder).map_err(|e| e.at(decoder.position()))?;
            let value = decoder.decode_value().map_err(|e| e.at(decoder.position()))?;
            trace!(section = %kind, offset = start, len = decoder.position() - start, "decoded section");
            assembler.add(kind, value).map_err(|e| e.at(start))?;
        }
        Ok(assembler.finish())
    }

    /// Encodes `body` as a message consisting of a single data section.
    pub fn marshal<B: AsRef<[u8]>>(body: B) -> Result<Vec<u8>, EncodeError> {
        Message { body: Some(Cow::Borrowed(body.as_ref())), ..Message::default() }.to_bytes()
    }

    /// Writes all present sections in wire order. Returns the number of written bytes.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<usize, EncodeError> {
        let bodies = [self.body.is_some(), self.amqp_sequence.is_some(), self.amqp_value.is_some()];
        if bodies.iter().filter(|present| **present).count() > 1 {
            return Err(EncodeError::MixedBody);
        }
        let mut c = 0;
        if let Some(header) = &self.header {
            c += encode_section(SectionKind::MessageHeader, &header.to_value(), w)?;
        }
        if let Some(annotations) = &self.delivery_annotations {
            c += encode_section(SectionKind::DeliveryAnnotations, &annotations.to_value(), w)?;
        }
        if let Some(annotations) = &self.annotations {
            c += encode_section(SectionKind::MessageAnnotations, &annotations.to_value(), w)?;
        }
        if let Some(properties) = &self.properties {
            c += encode_section(SectionKind::MessageProperties, &properties.to_value(), w)?;
        }
        if let Some(properties) = &self.application_properties {
            c += encode_section(SectionKind::ApplicationProperties, &properties.to_value(), w)?;
        }
        if let Some(body) = &self.body {
            c += encode_section(SectionKind::ApplicationData, &Value::Binary(Cow::Borrowed(body.as_ref())), w)?;
        }
        if let Some(sequence) = &self.amqp_sequence {
            c += encode_section(SectionKind::AmqpSequence, &Value::List(sequence.clone()), w)?;
        }
        if let Some(value) = &self.amqp_value {
            c += encode_section(SectionKind::AmqpValue, value, w)?;
        }
        if let Some(footer) = &self.footer {
            c += encode_section(SectionKind::Footer, &footer.to_value(), w)?;
        }
        Ok(c)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Copies everything still borrowed from the input buffer
    pub fn into_owned(self) -> Message<'static> {
        Message {
            header: self.header,
            delivery_annotations: self.delivery_annotations.map(Annotations::into_owned),
            annotations: self.annotations.map(Annotations::into_owned),
            properties: self.properties.map(Properties::into_owned),
            application_properties: self.application_properties.map(ApplicationProperties::into_owned),
            body: self.body.map(|body| Cow::Owned(body.into_owned())),
            amqp_sequence: self.amqp_sequence.map(|sequence| sequence.into_iter().map(Value::into_owned).collect()),
            amqp_value: self.amqp_value.map(Value::into_owned),
            footer: self.footer.map(Annotations::into_owned),
        }
    }

}

impl<'a> Display for Message<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(header) = &self.header {
            writeln!(f, "{}: {}", SectionKind::MessageHeader, header)?;
        }
        if let Some(annotations) = &self.delivery_annotations {
            writeln!(f, "{}: {}", SectionKind::DeliveryAnnotations, annotations)?;
        }
        if let Some(annotations) = &self.annotations {
            writeln!(f, "{}: {}", SectionKind::MessageAnnotations, annotations)?;
        }
        if let Some(properties) = &self.properties {
            writeln!(f, "{}: {}", SectionKind::MessageProperties, properties)?;
        }
        if let Some(properties) = &self.application_properties {
            writeln!(f, "{}: {}", SectionKind::ApplicationProperties, properties)?;
        }
        if let Some(body) = &self.body {
            writeln!(f, "{}: {}", SectionKind::ApplicationData, Value::Binary(Cow::Borrowed(body.as_ref())))?;
        }
        if let Some(sequence) = &self.amqp_sequence {
            writeln!(f, "{}: {}", SectionKind::AmqpSequence, Value::List(sequence.clone()))?;
        }
        if let Some(value) = &self.amqp_value {
            writeln!(f, "{}: {}", SectionKind::AmqpValue, value)?;
        }
        if let Some(footer) = &self.footer {
            writeln!(f, "{}: {}", SectionKind::Footer, footer)?;
        }
        Ok(())
    }
}

enum Body<'a> {
    Data(Cow<'a, [u8]>),
    Sequence(Vec<Value<'a>>),
    Value(Value<'a>),
}

/// Collects sections until the buffer is exhausted. Nothing of it is observable before `finish`.
struct Assembler<'a> {
    policy: RepeatedSection,
    header: Option<Header>,
    delivery_annotations: Option<Annotations<'a>>,
    annotations: Option<Annotations<'a>>,
    properties: Option<Properties<'a>>,
    application_properties: Option<ApplicationProperties<'a>>,
    body: Option<Body<'a>>,
    footer: Option<Annotations<'a>>,
}

impl<'a> Assembler<'a> {

    fn new(policy: RepeatedSection) -> Self {
        Self {
            policy,
            header: None,
            delivery_annotations: None,
            annotations: None,
            properties: None,
            application_properties: None,
            body: None,
            footer: None,
        }
    }

    fn add(&mut self, kind: SectionKind, value: Value<'a>) -> Result<(), DecodeError> {
        match kind {
            SectionKind::MessageHeader         => place(self.policy, kind, &mut self.header, Header::from_value(value)?),
            SectionKind::DeliveryAnnotations   => place(self.policy, kind, &mut self.delivery_annotations, Annotations::from_value(value)?),
            SectionKind::MessageAnnotations    => place(self.policy, kind, &mut self.annotations, Annotations::from_value(value)?),
            SectionKind::MessageProperties     => place(self.policy, kind, &mut self.properties, Properties::from_value(value)?),
            SectionKind::ApplicationProperties => place(self.policy, kind, &mut self.application_properties, ApplicationProperties::from_value(value)?),
            SectionKind::Footer                => place(self.policy, kind, &mut self.footer, Annotations::from_value(value)?),
            SectionKind::ApplicationData       => {
                let data = match value {
                    Value::Binary(data) => data,
                    other               => { return Err(unexpected("data section", "binary", &other)); },
                };
                self.body = Some(match self.body.take() {
                    None                   => Body::Data(data),
                    Some(Body::Data(mut body)) => {
                        body.to_mut().extend_from_slice(&data);
                        Body::Data(body)
                    },
                    Some(_)                => { return Err(DecodeError::MixedBody(kind)); },
                });
                Ok(())
            },
            SectionKind::AmqpSequence          => {
                let elements = match value {
                    Value::List(elements) => elements,
                    other                 => { return Err(unexpected("amqp-sequence section", "list", &other)); },
                };
                self.body = Some(match self.body.take() {
                    None                           => Body::Sequence(elements),
                    Some(Body::Sequence(mut body)) => {
                        body.extend(elements);
                        Body::Sequence(body)
                    },
                    Some(_)                        => { return Err(DecodeError::MixedBody(kind)); },
                });
                Ok(())
            },
            SectionKind::AmqpValue             => match self.body {
                None                                => {
                    self.body = Some(Body::Value(value));
                    Ok(())
                },
                Some(Body::Value(ref mut previous)) => match self.policy {
                    RepeatedSection::Reject    => Err(DecodeError::DuplicateSection(kind)),
                    RepeatedSection::Overwrite => {
                        warn!(section = %kind, "repeated section replaces the previous one");
                        *previous = value;
                        Ok(())
                    },
                    RepeatedSection::Ignore    => {
                        warn!(section = %kind, "repeated section ignored");
                        Ok(())
                    },
                },
                Some(_)                             => Err(DecodeError::MixedBody(kind)),
            },
        }
    }

    fn finish(self) -> Message<'a> {
        let (body, amqp_sequence, amqp_value) = match self.body {
            None                       => (None, None, None),
            Some(Body::Data(data))     => (Some(data), None, None),
            Some(Body::Sequence(seq))  => (None, Some(seq), None),
            Some(Body::Value(value))   => (None, None, Some(value)),
        };
        Message {
            header: self.header,
            delivery_annotations: self.delivery_annotations,
            annotations: self.annotations,
            properties: self.properties,
            application_properties: self.application_properties,
            body,
            amqp_sequence,
            amqp_value,
            footer: self.footer,
        }
    }

}

fn place<T>(policy: RepeatedSection, kind: SectionKind, slot: &mut Option<T>, section: T) -> Result<(), DecodeError> {
    if slot.is_none() {
        *slot = Some(section);
        return Ok(());
    }
    match policy {
        RepeatedSection::Reject    => Err(DecodeError::DuplicateSection(kind)),
        RepeatedSection::Overwrite => {
            warn!(section = %kind, "repeated section replaces the previous one");
            *slot = Some(section);
            Ok(())
        },
        RepeatedSection::Ignore    => {
            warn!(section = %kind, "repeated section ignored");
            Ok(())
        },
    }
}

fn unexpected(context: &'static str, expected: &'static str, found: &Value) -> DecodeError {
    DecodeError::UnexpectedType { context, expected, found: found.typename() }
}
