use serde::{ser, Serialize};
use amqp_message::{Encoder, Message, Value};
use std::borrow::Cow;
use std::io::Write;

use crate::error::{Error, Result};

/// Turns any `Serialize` into an owned `Value`. Compound values need their encoded size up front, so the whole tree is
/// built before anything gets encoded.
pub struct Serializer;

pub fn to_value<T: ?Sized + Serialize>(value: &T) -> Result<Value<'static>> {
    value.serialize(Serializer)
}

/// Encodes `value` as a bare primitive
pub fn to_bytes<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_writer(&mut buf, value)?;
    Ok(buf)
}

/// Returns the number of written bytes
pub fn to_writer<T: ?Sized + Serialize, W: Write>(mut writer: W, value: &T) -> Result<usize> {
    Ok(Encoder::encode(&to_value(value)?, &mut writer)?)
}

/// Encodes `value` as a message consisting of a single amqp-value section
pub fn to_message<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(Message { amqp_value: Some(to_value(value)?), ..Message::default() }.to_bytes()?)
}

#[inline]
fn symbol(name: &'static str) -> Value<'static> {
    Value::Symbol(Cow::Borrowed(name))
}

/// Variants carrying data become a map with the variant name as its single key
#[inline]
fn variant(name: &'static str, value: Value<'static>) -> Value<'static> {
    Value::Map(vec![(symbol(name), value)])
}

impl ser::Serializer for Serializer {

    type Ok = Value<'static>;
    type Error = Error;
    type SerializeSeq = SerializeList;
    type SerializeTuple = SerializeList;
    type SerializeTupleStruct = SerializeList;
    type SerializeTupleVariant = SerializeList;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value<'static>> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value<'static>> {
        Ok(Value::Byte(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value<'static>> {
        Ok(Value::Short(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value<'static>> {
        Ok(Value::Int(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value<'static>> {
        Ok(Value::Long(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value<'static>> {
        Ok(Value::UByte(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value<'static>> {
        Ok(Value::UShort(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value<'static>> {
        Ok(Value::UInt(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value<'static>> {
        Ok(Value::ULong(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value<'static>> {
        Ok(Value::Float(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value<'static>> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Value<'static>> {
        Ok(Value::Char(v))
    }

    fn serialize_str(self, v: &str) -> Result<Value<'static>> {
        Ok(Value::String(Cow::Owned(v.to_owned())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value<'static>> {
        Ok(Value::Binary(Cow::Owned(v.to_vec())))
    }

    fn serialize_none(self) -> Result<Value<'static>> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value<'static>> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value<'static>> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value<'static>> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<Value<'static>> {
        Ok(symbol(variant))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<Value<'static>> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _name: &'static str, _index: u32, name: &'static str, value: &T) -> Result<Value<'static>> {
        Ok(variant(name, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeList> {
        Ok(SerializeList { variant: None, elements: Vec::with_capacity(len.unwrap_or(0)) })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeList> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeList> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(self, _name: &'static str, _index: u32, variant: &'static str, len: usize) -> Result<SerializeList> {
        Ok(SerializeList { variant: Some(variant), elements: Vec::with_capacity(len) })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap { variant: None, entries: Vec::with_capacity(len.unwrap_or(0)), key: None })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(self, _name: &'static str, _index: u32, variant: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap { variant: Some(variant), entries: Vec::with_capacity(len), key: None })
    }

}

pub struct SerializeList {
    variant: Option<&'static str>,
    elements: Vec<Value<'static>>,
}

impl SerializeList {

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.elements.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn finish(self) -> Result<Value<'static>> {
        let list = Value::List(self.elements);
        Ok(match self.variant {
            Some(name) => variant(name, list),
            None       => list,
        })
    }

}

impl ser::SerializeSeq for SerializeList {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value<'static>> {
        self.finish()
    }
}

impl ser::SerializeTuple for SerializeList {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value<'static>> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SerializeList {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value<'static>> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SerializeList {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value<'static>> {
        self.finish()
    }
}

pub struct SerializeMap {
    variant: Option<&'static str>,
    entries: Vec<(Value<'static>, Value<'static>)>,
    key: Option<Value<'static>>,
}

impl SerializeMap {

    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.entries.push((symbol(key), value.serialize(Serializer)?));
        Ok(())
    }

    fn finish(self) -> Result<Value<'static>> {
        let map = Value::Map(self.entries);
        Ok(match self.variant {
            Some(name) => variant(name, map),
            None       => map,
        })
    }

}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.key = Some(key.serialize(Serializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self.key.take().ok_or_else(|| Error::Message("Map value serialized before its key".to_owned()))?;
        self.entries.push((key, value.serialize(Serializer)?));
        Ok(())
    }

    fn end(self) -> Result<Value<'static>> {
        self.finish()
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<Value<'static>> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<Value<'static>> {
        self.finish()
    }
}
