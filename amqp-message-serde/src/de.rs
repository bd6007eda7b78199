use serde::Deserialize;
use serde::de::{self, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::de::value::StrDeserializer;
use amqp_message::{Decoder, Message, Value};
use std::borrow::Cow;

use crate::error::{Error, Result};

/// Walks a decoded `Value`. Strings and bytes still borrowed from the input are handed out as borrowed. Described
/// values are transparent: only the described value is visited.
#[derive(Clone, Copy)]
pub struct Deserializer<'a, 'de> {
    value: &'a Value<'de>,
}

impl<'a, 'de> Deserializer<'a, 'de> {
    pub fn new(mut value: &'a Value<'de>) -> Self {
        while let Value::Described(_, inner) = value {
            value = inner;
        }
        Deserializer { value }
    }
}

pub fn from_value<'a, 'de, T: Deserialize<'de>>(value: &'a Value<'de>) -> Result<T> {
    T::deserialize(Deserializer::new(value))
}

/// Decodes a bare primitive which has to span the whole input
pub fn from_bytes<'de, T: Deserialize<'de>>(buf: &'de [u8]) -> Result<T> {
    let (value, c) = Decoder::decode(buf)?;
    if c != buf.len() {
        return Err(Error::Trailing(c));
    }
    from_value(&value)
}

/// Reads the amqp-value section of a message
pub fn from_message<'de, T: Deserialize<'de>>(buf: &'de [u8]) -> Result<T> {
    let message = Message::unmarshal(buf)?;
    let value = message.amqp_value.as_ref().ok_or(Error::NoValue)?;
    from_value(value)
}

impl<'a, 'de> Deserializer<'a, 'de> {

    fn unexpected(&self, expected: &'static [&'static str]) -> Error {
        Error::UnexpectedType(expected, self.value.typename())
    }

    fn integer(&self) -> Result<i128> {
        Ok(match *self.value {
            Value::UByte(v)  => v.into(),
            Value::UShort(v) => v.into(),
            Value::UInt(v)   => v.into(),
            Value::ULong(v)  => v.into(),
            Value::Byte(v)   => v.into(),
            Value::Short(v)  => v.into(),
            Value::Int(v)    => v.into(),
            Value::Long(v)   => v.into(),
            _                => { return Err(self.unexpected(&["ubyte", "ushort", "uint", "ulong", "byte", "short", "int", "long"])); },
        })
    }

    fn stringy(&self) -> Result<&'a Cow<'de, str>> {
        match self.value {
            Value::String(v) | Value::Symbol(v) => Ok(v),
            _                                   => Err(self.unexpected(&["string", "symbol"])),
        }
    }

}

fn visit_str<'de, V: Visitor<'de>>(v: &Cow<'de, str>, visitor: V) -> Result<V::Value> {
    match v {
        Cow::Borrowed(v) => visitor.visit_borrowed_str(*v),
        Cow::Owned(v)    => visitor.visit_str(v),
    }
}

fn visit_bytes<'de, V: Visitor<'de>>(v: &Cow<'de, [u8]>, visitor: V) -> Result<V::Value> {
    match v {
        Cow::Borrowed(v) => visitor.visit_borrowed_bytes(*v),
        Cow::Owned(v)    => visitor.visit_bytes(v),
    }
}

impl<'a, 'de> de::Deserializer<'de> for Deserializer<'a, 'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null            => visitor.visit_unit(),
            Value::Bool(v)         => visitor.visit_bool(*v),
            Value::UByte(v)        => visitor.visit_u8(*v),
            Value::UShort(v)       => visitor.visit_u16(*v),
            Value::UInt(v)         => visitor.visit_u32(*v),
            Value::ULong(v)        => visitor.visit_u64(*v),
            Value::Byte(v)         => visitor.visit_i8(*v),
            Value::Short(v)        => visitor.visit_i16(*v),
            Value::Int(v)          => visitor.visit_i32(*v),
            Value::Long(v)         => visitor.visit_i64(*v),
            Value::Float(v)        => visitor.visit_f32(*v),
            Value::Double(v)       => visitor.visit_f64(*v),
            Value::Decimal32(v)    => visitor.visit_bytes(v),
            Value::Decimal64(v)    => visitor.visit_bytes(v),
            Value::Decimal128(v)   => visitor.visit_bytes(v),
            Value::Char(v)         => visitor.visit_char(*v),
            Value::Timestamp(v)    => visitor.visit_i64(*v),
            Value::Uuid(v)         => visitor.visit_bytes(v),
            Value::Binary(v)       => visit_bytes(v, visitor),
            Value::String(v)       => visit_str(v, visitor),
            Value::Symbol(v)       => visit_str(v, visitor),
            Value::Described(_, v) => de::Deserializer::deserialize_any(Deserializer::new(v), visitor),
            Value::List(v)         => visitor.visit_seq(SeqDeserializer::new(v)),
            Value::Array(v)        => visitor.visit_seq(SeqDeserializer::new(v)),
            Value::Map(v)          => visitor.visit_map(MapDeserializer::new(v)),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bool(v) => visitor.visit_bool(*v),
            _ => Err(self.unexpected(&["boolean"])),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.integer()?.try_into()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.integer()?.try_into()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.integer()?.try_into()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Timestamp(v) => visitor.visit_i64(*v),
            _ => visitor.visit_i64(self.integer()?.try_into()?),
        }
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.integer()?.try_into()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.integer()?.try_into()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.integer()?.try_into()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.integer()?.try_into()?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Float(v) => visitor.visit_f32(*v),
            _ => Err(self.unexpected(&["float"])),
        }
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Double(v) => visitor.visit_f64(*v),
            Value::Float(v) => visitor.visit_f64((*v).into()),
            _ => Err(self.unexpected(&["double", "float"])),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if let Value::Char(c) = self.value {
            return visitor.visit_char(*c);
        }
        let v = self.stringy().map_err(|_| self.unexpected(&["char", "string", "symbol"]))?;
        let mut chars = v.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::Message(format!("Expected a single character, found {:?}", v))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visit_str(self.stringy()?, visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Binary(v) => visit_bytes(v, visitor),
            _ => Err(self.unexpected(&["binary"])),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Binary(v) => visitor.visit_byte_buf(v.to_vec()),
            Value::List(v) | Value::Array(v) => {
                let mut bytes: Vec<u8> = Vec::with_capacity(v.len());
                for element in v.iter() {
                    bytes.push(Deserializer::new(element).integer()?.try_into()?);
                }
                visitor.visit_byte_buf(bytes)
            },
            _ => Err(self.unexpected(&["binary", "list", "array"])),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            _ => Err(self.unexpected(&["null"])),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::List(v) | Value::Array(v) => visitor.visit_seq(SeqDeserializer::new(v)),
            _ => Err(self.unexpected(&["list", "array"])),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Map(v) => visitor.visit_map(MapDeserializer::new(v)),
            _ => Err(self.unexpected(&["map"])),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(self, _name: &'static str, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str], visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Map(v) if v.len() == 1 => {
                let (variant, value) = &v[0];
                visitor.visit_enum(EnumDeserializer::new(variant, value))
            },
            Value::Symbol(s) | Value::String(s) => {
                let name: &str = s;
                let deserializer: StrDeserializer<'_, Error> = name.into_deserializer();
                visitor.visit_enum(deserializer)
            },
            _ => Err(self.unexpected(&["map", "symbol", "string"])),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

}

struct SeqDeserializer<'a, 'de> {
    iter: std::slice::Iter<'a, Value<'de>>,
}

impl<'a, 'de> SeqDeserializer<'a, 'de> {
    fn new(elements: &'a [Value<'de>]) -> Self {
        Self { iter: elements.iter() }
    }
}

impl<'de, 'a> SeqAccess<'de> for SeqDeserializer<'a, 'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::new(value)).map(Some),
            None        => Ok(None),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }

}

struct MapDeserializer<'a, 'de> {
    iter: std::slice::Iter<'a, (Value<'de>, Value<'de>)>,
    value: Option<&'a Value<'de>>,
}

impl<'a, 'de> MapDeserializer<'a, 'de> {
    fn new(entries: &'a [(Value<'de>, Value<'de>)]) -> Self {
        Self { iter: entries.iter(), value: None }
    }
}

impl<'de, 'a> MapAccess<'de> for MapDeserializer<'a, 'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Deserializer::new(key)).map(Some)
            },
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None        => Err(Error::Message("Map value requested before its key".to_owned())),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer<'a, 'de> {
    variant: &'a Value<'de>,
    value: &'a Value<'de>,
}

impl<'a, 'de> EnumDeserializer<'a, 'de> {
    fn new(variant: &'a Value<'de>, value: &'a Value<'de>) -> Self {
        Self { variant, value }
    }
}

impl<'de, 'a> EnumAccess<'de> for EnumDeserializer<'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(Deserializer::new(self.variant))?;
        Ok((variant, self))
    }
}

impl<'de, 'a> VariantAccess<'de> for EnumDeserializer<'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            o => Err(Error::UnexpectedType(&["null"], o.typename())),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(Deserializer::new(self.value))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(Deserializer::new(self.value), visitor)
    }

    fn struct_variant<V: Visitor<'de>>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_map(Deserializer::new(self.value), visitor)
    }

}
