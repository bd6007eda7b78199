//! Typed views on the sections of a bare message. Every section value is a plain primitive on wire: header and
//! properties are lists with fixed field positions, the annotation sections and application-properties are maps.
//! Trailing list fields may be omitted and `null` stands for a field's default.

use crate::error::{DecodeError, DecoderError, EncodeError};
use crate::registry::SectionKind;
use crate::value::{Decoder, Encoder, Value};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::io::Write;

/// Transport headers of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub durable: bool,
    pub priority: u8,
    /// Time to live in milliseconds
    pub ttl: Option<u32>,
    pub first_acquirer: bool,
    pub delivery_count: u32,
}

impl Default for Header {
    fn default() -> Self {
        Self { durable: false, priority: 4, ttl: None, first_acquirer: false, delivery_count: 0 }
    }
}

impl Header {

    const FIELDS: [&'static str; 5] = ["durable", "priority", "ttl", "first-acquirer", "delivery-count"];

    /// Decodes the value of a header section at the start of `buf`, that is everything after the descriptor.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &B) -> Result<(Self, usize), DecoderError> {
        decode_section(buf.as_ref(), Self::from_value)
    }

    pub fn from_value(value: Value<'_>) -> Result<Self, DecodeError> {
        let defaults = Self::default();
        let mut fields = Fields::new("header", value)?;
        Ok(Self {
            durable: fields.boolean("durable")?.unwrap_or(defaults.durable),
            priority: fields.ubyte("priority")?.unwrap_or(defaults.priority),
            ttl: fields.uint("ttl")?,
            first_acquirer: fields.boolean("first-acquirer")?.unwrap_or(defaults.first_acquirer),
            delivery_count: fields.uint("delivery-count")?.unwrap_or(defaults.delivery_count),
        })
    }

    /// The list representation with default fields left out
    pub fn to_value(&self) -> Value<'static> {
        let defaults = Self::default();
        trimmed(vec![
            (self.durable != defaults.durable).then(|| Value::Bool(self.durable)),
            (self.priority != defaults.priority).then(|| Value::UByte(self.priority)),
            self.ttl.map(Value::UInt),
            (self.first_acquirer != defaults.first_acquirer).then(|| Value::Bool(self.first_acquirer)),
            (self.delivery_count != defaults.delivery_count).then(|| Value::UInt(self.delivery_count)),
        ])
    }

}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_fields(f, &Self::FIELDS, &self.to_value())
    }
}

/// Identifies a message or the message a reply correlates to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageId<'a> {
    ULong(u64),
    Uuid([u8; 16]),
    Binary(Cow<'a, [u8]>),
    String(Cow<'a, str>),
}

impl<'a> MessageId<'a> {

    fn from_value(value: Value<'a>) -> Option<Self> {
        match value {
            Value::ULong(v)  => Some(MessageId::ULong(v)),
            Value::Uuid(v)   => Some(MessageId::Uuid(v)),
            Value::Binary(v) => Some(MessageId::Binary(v)),
            Value::String(v) => Some(MessageId::String(v)),
            _                => None,
        }
    }

    pub fn to_value(&self) -> Value<'_> {
        match self {
            MessageId::ULong(v)  => Value::ULong(*v),
            MessageId::Uuid(v)   => Value::Uuid(*v),
            MessageId::Binary(v) => Value::Binary(Cow::Borrowed(v.as_ref())),
            MessageId::String(v) => Value::String(Cow::Borrowed(v.as_ref())),
        }
    }

    pub fn into_owned(self) -> MessageId<'static> {
        match self {
            MessageId::ULong(v)  => MessageId::ULong(v),
            MessageId::Uuid(v)   => MessageId::Uuid(v),
            MessageId::Binary(v) => MessageId::Binary(Cow::Owned(v.into_owned())),
            MessageId::String(v) => MessageId::String(Cow::Owned(v.into_owned())),
        }
    }

}

impl<'a> From<u64> for MessageId<'a> {
    fn from(v: u64) -> Self { MessageId::ULong(v) }
}

impl<'a> From<&'a str> for MessageId<'a> {
    fn from(v: &'a str) -> Self { MessageId::String(Cow::Borrowed(v)) }
}

impl<'a> Display for MessageId<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.to_value().fmt(f)
    }
}

/// The immutable properties of a bare message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties<'a> {
    pub message_id: Option<MessageId<'a>>,
    pub user_id: Option<Cow<'a, [u8]>>,
    pub to: Option<Cow<'a, str>>,
    pub subject: Option<Cow<'a, str>>,
    pub reply_to: Option<Cow<'a, str>>,
    pub correlation_id: Option<MessageId<'a>>,
    pub content_type: Option<Cow<'a, str>>,
    pub content_encoding: Option<Cow<'a, str>>,
    /// Milliseconds since the unix epoch
    pub absolute_expiry_time: Option<i64>,
    pub creation_time: Option<i64>,
    pub group_id: Option<Cow<'a, str>>,
    pub group_sequence: Option<u32>,
    pub reply_to_group_id: Option<Cow<'a, str>>,
}

impl<'a> Properties<'a> {

    const FIELDS: [&'static str; 13] = [
        "message-id", "user-id", "to", "subject", "reply-to", "correlation-id", "content-type", "content-encoding",
        "absolute-expiry-time", "creation-time", "group-id", "group-sequence", "reply-to-group-id",
    ];

    /// Decodes the value of a properties section at the start of `buf`, that is everything after the descriptor.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<(Self, usize), DecoderError> {
        decode_section(buf.as_ref(), Self::from_value)
    }

    /// Fields past the thirteenth are ignored.
    pub fn from_value(value: Value<'a>) -> Result<Self, DecodeError> {
        let mut fields = Fields::new("properties", value)?;
        Ok(Self {
            message_id: fields.message_id("message-id")?,
            user_id: fields.binary("user-id")?,
            to: fields.string("to")?,
            subject: fields.string("subject")?,
            reply_to: fields.string("reply-to")?,
            correlation_id: fields.message_id("correlation-id")?,
            content_type: fields.symbol("content-type")?,
            content_encoding: fields.symbol("content-encoding")?,
            absolute_expiry_time: fields.timestamp("absolute-expiry-time")?,
            creation_time: fields.timestamp("creation-time")?,
            group_id: fields.string("group-id")?,
            group_sequence: fields.uint("group-sequence")?,
            reply_to_group_id: fields.string("reply-to-group-id")?,
        })
    }

    /// The list representation with absent trailing fields left out
    pub fn to_value(&self) -> Value<'_> {
        trimmed(vec![
            self.message_id.as_ref().map(MessageId::to_value),
            self.user_id.as_deref().map(|v| Value::Binary(Cow::Borrowed(v))),
            string(&self.to),
            string(&self.subject),
            string(&self.reply_to),
            self.correlation_id.as_ref().map(MessageId::to_value),
            symbol(&self.content_type),
            symbol(&self.content_encoding),
            self.absolute_expiry_time.map(Value::Timestamp),
            self.creation_time.map(Value::Timestamp),
            string(&self.group_id),
            self.group_sequence.map(Value::UInt),
            string(&self.reply_to_group_id),
        ])
    }

    pub fn into_owned(self) -> Properties<'static> {
        Properties {
            message_id: self.message_id.map(MessageId::into_owned),
            user_id: self.user_id.map(|v| Cow::Owned(v.into_owned())),
            to: owned(self.to),
            subject: owned(self.subject),
            reply_to: owned(self.reply_to),
            correlation_id: self.correlation_id.map(MessageId::into_owned),
            content_type: owned(self.content_type),
            content_encoding: owned(self.content_encoding),
            absolute_expiry_time: self.absolute_expiry_time,
            creation_time: self.creation_time,
            group_id: owned(self.group_id),
            group_sequence: self.group_sequence,
            reply_to_group_id: owned(self.reply_to_group_id),
        }
    }

}

impl<'a> Display for Properties<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_fields(f, &Self::FIELDS, &self.to_value())
    }
}

/// Delivery annotations, message annotations or a footer. Keys are symbols or ulongs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations<'a> {
    entries: Vec<(Value<'a>, Value<'a>)>,
}

impl<'a> Annotations<'a> {

    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the value of an annotations section at the start of `buf`, that is everything after the descriptor.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<(Self, usize), DecoderError> {
        decode_section(buf.as_ref(), Self::from_value)
    }

    /// String keys are tolerated, anything but strings, symbols and ulongs fails with `IllegalKey`.
    pub fn from_value(value: Value<'a>) -> Result<Self, DecodeError> {
        let entries = map_entries("annotations", value)?;
        if let Some((key, _)) = entries.iter().find(|(key, _)| !matches!(key, Value::Symbol(_) | Value::ULong(_) | Value::String(_))) {
            return Err(DecodeError::IllegalKey(key.typename()));
        }
        Ok(Self { entries })
    }

    pub fn to_value(&self) -> Value<'a> {
        Value::Map(self.entries.clone())
    }

    /// The value of the first entry whose key is a symbol or string equal to `key`
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.entries.iter().find(|(k, _)| k.as_str() == Some(key)).map(|(_, v)| v)
    }

    /// Sets a symbol keyed entry, replacing the first entry with an equal key
    pub fn insert<K: Into<Cow<'a, str>>>(&mut self, key: K, value: Value<'a>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| k.as_str() == Some(&*key)) {
            Some(entry) => entry.1 = value,
            None        => self.entries.push((Value::Symbol(key), value)),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Value<'a>, Value<'a>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_owned(self) -> Annotations<'static> {
        Annotations { entries: self.entries.into_iter().map(|(k, v)| (k.into_owned(), v.into_owned())).collect() }
    }

}

impl<'a> Display for Annotations<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.to_value().fmt(f)
    }
}

/// User defined properties, keyed by string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationProperties<'a> {
    entries: Vec<(Cow<'a, str>, Value<'a>)>,
}

impl<'a> ApplicationProperties<'a> {

    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the value of an application-properties section at the start of `buf`, that is everything after the
    /// descriptor.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<(Self, usize), DecoderError> {
        decode_section(buf.as_ref(), Self::from_value)
    }

    /// Symbol keys are tolerated, anything but strings and symbols fails with `IllegalKey`.
    pub fn from_value(value: Value<'a>) -> Result<Self, DecodeError> {
        let mut entries = Vec::new();
        for (key, value) in map_entries("application-properties", value)? {
            match key {
                Value::String(key) | Value::Symbol(key) => entries.push((key, value)),
                other                                   => { return Err(DecodeError::IllegalKey(other.typename())); },
            }
        }
        Ok(Self { entries })
    }

    pub fn to_value(&self) -> Value<'_> {
        Value::Map(self.entries.iter().map(|(k, v)| (Value::String(Cow::Borrowed(k.as_ref())), v.clone())).collect())
    }

    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Sets an entry, replacing the first one with an equal key
    pub fn insert<K: Into<Cow<'a, str>>>(&mut self, key: K, value: Value<'a>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None        => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Cow<'a, str>, Value<'a>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_owned(self) -> ApplicationProperties<'static> {
        ApplicationProperties { entries: self.entries.into_iter().map(|(k, v)| (Cow::Owned(k.into_owned()), v.into_owned())).collect() }
    }

}

impl<'a> Display for ApplicationProperties<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.to_value().fmt(f)
    }
}

/// Writes a complete section, the descriptor of `kind` followed by `value`. Returns the number of written bytes.
pub fn encode_section<W: Write>(kind: SectionKind, value: &Value, w: &mut W) -> Result<usize, EncodeError> {
    let c = kind.encode_descriptor(w)?;
    Ok(c + Encoder::encode(value, w)?)
}

fn decode_section<'a, T>(buf: &'a [u8], f: impl FnOnce(Value<'a>) -> Result<T, DecodeError>) -> Result<(T, usize), DecoderError> {
    let (value, c) = Decoder::decode(buf)?;
    let section = f(value).map_err(|e| e.at(c))?;
    Ok((section, c))
}

fn unexpected(context: &'static str, expected: &'static str, found: &Value) -> DecodeError {
    DecodeError::UnexpectedType { context, expected, found: found.typename() }
}

fn map_entries<'a>(context: &'static str, value: Value<'a>) -> Result<Vec<(Value<'a>, Value<'a>)>, DecodeError> {
    match value {
        Value::Map(entries) => Ok(entries),
        Value::Null         => Ok(Vec::new()),
        other               => Err(unexpected(context, "map", &other)),
    }
}

/// A list of optional fields with absent trailing fields removed and absent inner fields set to `null`
fn trimmed(fields: Vec<Option<Value<'_>>>) -> Value<'_> {
    let len = fields.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
    Value::List(fields.into_iter().take(len).map(|field| field.unwrap_or(Value::Null)).collect())
}

fn string<'v>(field: &'v Option<Cow<'_, str>>) -> Option<Value<'v>> {
    field.as_deref().map(|v| Value::String(Cow::Borrowed(v)))
}

fn symbol<'v>(field: &'v Option<Cow<'_, str>>) -> Option<Value<'v>> {
    field.as_deref().map(|v| Value::Symbol(Cow::Borrowed(v)))
}

fn owned(field: Option<Cow<'_, str>>) -> Option<Cow<'static, str>> {
    field.map(|v| Cow::Owned(v.into_owned()))
}

fn fmt_fields(f: &mut Formatter<'_>, names: &[&str], value: &Value) -> fmt::Result {
    let fields: &[Value] = match value {
        Value::List(fields) => fields,
        _                   => &[],
    };
    let shown = names.iter().zip(fields)
        .filter(|(_, v)| **v != Value::Null)
        .map(|(name, v)| format!("{}: {}", name, v))
        .collect::<Vec<_>>();
    write!(f, "{{{}}}", shown.join(", "))
}

/// Positional access to the fields of a list shaped section
struct Fields<'a> {
    fields: std::vec::IntoIter<Value<'a>>,
}

impl<'a> Fields<'a> {

    fn new(context: &'static str, value: Value<'a>) -> Result<Self, DecodeError> {
        match value {
            Value::List(fields) => Ok(Self { fields: fields.into_iter() }),
            other               => Err(unexpected(context, "list", &other)),
        }
    }

    /// Omitted and `null` fields are `None`
    fn field<T>(&mut self, name: &'static str, expected: &'static str, f: impl FnOnce(Value<'a>) -> Option<T>) -> Result<Option<T>, DecodeError> {
        match self.fields.next() {
            None | Some(Value::Null) => Ok(None),
            Some(value)              => {
                let found = value.typename();
                f(value).map(Some).ok_or(DecodeError::UnexpectedType { context: name, expected, found })
            },
        }
    }

    fn boolean(&mut self, name: &'static str) -> Result<Option<bool>, DecodeError> {
        self.field(name, "boolean", |v| match v { Value::Bool(v) => Some(v), _ => None })
    }

    fn ubyte(&mut self, name: &'static str) -> Result<Option<u8>, DecodeError> {
        self.field(name, "ubyte", |v| match v { Value::UByte(v) => Some(v), _ => None })
    }

    fn uint(&mut self, name: &'static str) -> Result<Option<u32>, DecodeError> {
        self.field(name, "uint", |v| match v { Value::UInt(v) => Some(v), _ => None })
    }

    fn timestamp(&mut self, name: &'static str) -> Result<Option<i64>, DecodeError> {
        self.field(name, "timestamp", |v| match v { Value::Timestamp(v) => Some(v), _ => None })
    }

    fn string(&mut self, name: &'static str) -> Result<Option<Cow<'a, str>>, DecodeError> {
        self.field(name, "string", |v| match v { Value::String(v) => Some(v), _ => None })
    }

    fn symbol(&mut self, name: &'static str) -> Result<Option<Cow<'a, str>>, DecodeError> {
        self.field(name, "symbol", |v| match v { Value::Symbol(v) => Some(v), _ => None })
    }

    fn binary(&mut self, name: &'static str) -> Result<Option<Cow<'a, [u8]>>, DecodeError> {
        self.field(name, "binary", |v| match v { Value::Binary(v) => Some(v), _ => None })
    }

    fn message_id(&mut self, name: &'static str) -> Result<Option<MessageId<'a>>, DecodeError> {
        self.field(name, "ulong, uuid, binary or string", MessageId::from_value)
    }

}

#[cfg(test)]
mod tests {
    use super::{encode_section, Annotations, ApplicationProperties, Header, MessageId, Properties};
    use crate::error::DecodeError;
    use crate::registry::SectionKind;
    use crate::value::{Encoder, Value};
    use std::borrow::Cow;

    #[test]
    fn default_header() {
        assert_eq!((Header::default(), 1), Header::decode(&[0x45u8]).unwrap());
        let mut buf = Vec::new();
        assert_eq!(4, encode_section(SectionKind::MessageHeader, &Header::default().to_value(), &mut buf).unwrap());
        assert_eq!(buf, [0x00, 0x53, 0x70, 0x45]);
    }

    #[test]
    fn omitted_header_fields() {
        let (header, c) = Header::decode(&[0xc0u8, 0x02, 0x01, 0x41]).unwrap();
        assert_eq!(4, c);
        assert_eq!(Header { durable: true, ..Header::default() }, header);
        let (header, _) = Header::decode(&[0xc0u8, 0x05, 0x03, 0x40, 0x50, 0x07, 0x40]).unwrap();
        assert_eq!(Header { priority: 7, ..Header::default() }, header);
    }

    #[test]
    fn header_roundtrip() {
        let header = Header { durable: true, priority: 9, ttl: Some(1000), first_acquirer: true, delivery_count: 3 };
        let mut buf = Vec::new();
        Encoder::encode(&header.to_value(), &mut buf).unwrap();
        assert_eq!((header, buf.len()), Header::decode(&buf).unwrap());
        let header = Header { delivery_count: 2, ..Header::default() };
        assert_eq!(Value::List(vec![Value::Null, Value::Null, Value::Null, Value::Null, Value::UInt(2)]), header.to_value());
    }

    #[test]
    fn header_type_mismatch() {
        assert_eq!(
            DecodeError::UnexpectedType { context: "durable", expected: "boolean", found: "string" },
            Header::decode(&[0xc0u8, 0x03, 0x01, 0xa1, 0x00]).unwrap_err().into_inner(),
        );
        assert_eq!(
            DecodeError::UnexpectedType { context: "header", expected: "list", found: "null" },
            Header::from_value(Value::Null).unwrap_err(),
        );
    }

    #[test]
    fn properties_roundtrip() {
        let properties = Properties {
            message_id: Some(MessageId::from("order-17")),
            user_id: Some(Cow::Borrowed(&b"guest"[..])),
            to: Some(Cow::Borrowed("queue://orders")),
            correlation_id: Some(MessageId::Uuid([3; 16])),
            content_type: Some(Cow::Borrowed("application/json")),
            creation_time: Some(1_600_000_000_000),
            group_sequence: Some(2),
            ..Properties::default()
        };
        let mut buf = Vec::new();
        Encoder::encode(&properties.to_value(), &mut buf).unwrap();
        let (decoded, c) = Properties::decode(&buf).unwrap();
        assert_eq!(buf.len(), c);
        assert_eq!(properties, decoded);
        assert_eq!(properties, decoded.into_owned());
    }

    #[test]
    fn properties_trailing_fields() {
        let properties = Properties { message_id: Some(MessageId::ULong(7)), ..Properties::default() };
        assert_eq!(Value::List(vec![Value::ULong(7)]), properties.to_value());
        let mut fields = vec![Value::Null; 13];
        fields.push(Value::Int(1));
        assert_eq!(Properties::default(), Properties::from_value(Value::List(fields)).unwrap());
    }

    #[test]
    fn message_id_types() {
        assert_eq!(
            DecodeError::UnexpectedType { context: "message-id", expected: "ulong, uuid, binary or string", found: "boolean" },
            Properties::from_value(Value::List(vec![Value::Bool(true)])).unwrap_err(),
        );
        let properties = Properties::from_value(Value::List(vec![Value::Binary(Cow::Borrowed(&[1, 2][..]))])).unwrap();
        assert_eq!(Some(MessageId::Binary(Cow::Borrowed(&[1, 2][..]))), properties.message_id);
    }

    #[test]
    fn annotations() {
        let value = Value::Map(vec![
            (Value::Symbol(Cow::Borrowed("x-opt-partition")), Value::Int(3)),
            (Value::ULong(0x1234), Value::Null),
            (Value::String(Cow::Borrowed("legacy")), Value::Bool(true)),
        ]);
        let annotations = Annotations::from_value(value.clone()).unwrap();
        assert_eq!(3, annotations.len());
        assert_eq!(Some(&Value::Int(3)), annotations.get("x-opt-partition"));
        assert_eq!(Some(&Value::Bool(true)), annotations.get("legacy"));
        assert_eq!(None, annotations.get("missing"));
        assert_eq!(value, annotations.to_value());
        assert_eq!(
            DecodeError::IllegalKey("int"),
            Annotations::from_value(Value::Map(vec![(Value::Int(1), Value::Null)])).unwrap_err(),
        );
    }

    #[test]
    fn annotations_insert() {
        let mut annotations = Annotations::new();
        annotations.insert("x-opt-a", Value::UInt(1));
        annotations.insert("x-opt-a", Value::UInt(2));
        assert_eq!(1, annotations.len());
        assert_eq!(Some(&Value::UInt(2)), annotations.get("x-opt-a"));
        assert_eq!("{#x-opt-a: 2u32}", annotations.to_string());
    }

    #[test]
    fn application_properties() {
        let buf = [0xc1u8, 0x0a, 0x02, 0xa1, 0x05, 0x63, 0x6f, 0x75, 0x6e, 0x74, 0x54, 0x00];
        let (properties, c) = ApplicationProperties::decode(&buf).unwrap();
        assert_eq!(12, c);
        assert_eq!(1, properties.len());
        assert_eq!(Some(&Value::Int(0)), properties.get("count"));
        assert_eq!(
            DecodeError::IllegalKey("ulong"),
            ApplicationProperties::from_value(Value::Map(vec![(Value::ULong(1), Value::Null)])).unwrap_err(),
        );
        let tolerated = ApplicationProperties::from_value(Value::Map(vec![(Value::Symbol(Cow::Borrowed("k")), Value::Null)])).unwrap();
        assert_eq!(Some(&Value::Null), tolerated.get("k"));
        assert_eq!(r#"{"k": null}"#, tolerated.to_string());
    }

    #[test]
    fn display() {
        let header = Header { durable: true, ttl: Some(500), ..Header::default() };
        assert_eq!("{durable: true, ttl: 500u32}", header.to_string());
        let properties = Properties { subject: Some(Cow::Borrowed("hi")), content_type: Some(Cow::Borrowed("text/plain")), ..Properties::default() };
        assert_eq!(r#"{subject: "hi", content-type: #text/plain}"#, properties.to_string());
    }

}
