//! Conveniently serialize and deserialize your Rust data structures into AMQP 1.0 values and messages.
//!
//! # Mapping
//!
//! Integers, floats, booleans and chars map to the AMQP type of the same width, strings to `string` and byte buffers
//! (with the help of `serde_bytes`) to `binary`. `None` and `()` become `null`. Sequences and tuples become lists,
//! maps become maps and structs become maps keyed by the field names as symbols. Unit variants are encoded as the
//! symbol of their name, all other variants as a map with the variant's symbol as its only key.
//!
//! Deserialization is lenient where AMQP offers several types for the same data: any integer which fits the target type
//! is accepted, text may be a string or a symbol and described values are read as the value they describe.
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub enum Species {
//!     PrionailurusViverrinus,
//!     LynxLynx,
//!     FelisCatus,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! pub struct Cat<'a> {
//!     name: &'a str,
//!     species: Species,
//! }
//!
//! let cat = Cat { name: "Jessica", species: Species::FelisCatus };
//!
//! let bytes = amqp_message_serde::to_bytes(&cat).unwrap();
//! assert_eq!(bytes, [
//!   0xc1, 0x25, 0x04,                                       // map8 of 37 bytes holding 4 elements
//!     0xa3, 0x04,                                           // sym8 of length 4
//!       0x6e, 0x61, 0x6d, 0x65,                             // 'name'
//!     0xa1, 0x07,                                           // str8 of length 7
//!       0x4a, 0x65, 0x73, 0x73, 0x69, 0x63, 0x61,           // 'Jessica'
//!     0xa3, 0x07,                                           // sym8 of length 7
//!       0x73, 0x70, 0x65, 0x63, 0x69, 0x65, 0x73,           // 'species'
//!     0xa3, 0x0a,                                           // sym8 of length 10
//!       0x46, 0x65, 0x6c, 0x69, 0x73, 0x43, 0x61, 0x74,     // 'FelisCatus'
//!       0x75, 0x73,
//! ]);
//!
//! let deserialized: Cat = amqp_message_serde::from_bytes(&bytes).unwrap();
//! assert_eq!(cat, deserialized);
//!
//! // Wrapped into a message with a single amqp-value section
//! let message = amqp_message_serde::to_message(&cat).unwrap();
//! assert_eq!(message[..3], [0x00, 0x53, 0x77]);
//! assert_eq!(cat, amqp_message_serde::from_message::<Cat>(&message).unwrap());
//! ```

mod de;
mod error;
mod ser;

pub use de::{from_bytes, from_message, from_value, Deserializer};
pub use error::{Error, Result};
pub use ser::{to_bytes, to_message, to_value, to_writer, Serializer};

#[cfg(test)]
mod tests {
    use serde::{Serialize, Deserialize};
    use std::borrow::Cow;
    use std::collections::HashMap;
    use amqp_message::{Message, Value};
    use super::{to_bytes, from_bytes, to_message, from_message, to_value, Error};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Enum {
        UnitVariant,
        NewtypeVariant(bool),
        TupleVariant(f32, f32),
        StructVariant{ a: usize, b: usize, c: usize },
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Struct {
        field: u8,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct UnitStruct;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct NewtypeStruct(String);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct TupleStruct(char, char, char);

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Test {
        bool: bool,
        i8: i8,
        i16: i16,
        i32: i32,
        i64: i64,
        u8: u8,
        u16: u16,
        u32: u32,
        u64: u64,
        f32: f32,
        f64: f64,
        char: char,
        str: String,
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
        none: Option<u8>,
        some: Option<u8>,
        unit: (),
        unit_struct: UnitStruct,
        newtype_struct: NewtypeStruct,
        tuple_struct: TupleStruct,
        seq: Vec<String>,
        tuple: (u16, u16, u16),
        map: HashMap<usize, String>,
        r#struct: Struct,
        unit_variant: Enum,
        newtype_variant: Enum,
        tuple_variant: Enum,
        struct_variant: Enum,
    }

    #[test]
    fn roundtrip() {
        let message = Test {
            bool: true,
            i8: -1,
            i16: -20,
            i32: -7000,
            i64: i64::MIN,
            u8: 1,
            u16: 20,
            u32: 7000,
            u64: u64::MAX,
            f32: 1337.8472,
            f64: 1337.8472,
            char: 'x',
            str: "Test".to_string(),
            bytes: vec![0x00, 0x53, 0x75, 0xa0, 0x05, 0x68, 0x65, 0x6c, 0x6c, 0x6f],
            none: None,
            some: Some(0),
            unit: (),
            unit_struct: UnitStruct,
            newtype_struct: NewtypeStruct("Qapla'".to_string()),
            tuple_struct: TupleStruct('a', 'ß', '∑'),
            seq: vec![
                "Elen".to_string(),
                "síla".to_string(),
                "lúmenn'".to_string(),
                "omentielvo".to_string(),
            ],
            tuple: (0, 0, 0),
            map: [
                (1701, "Enterprise".to_string()),
                (74656, "Voyager".to_string())
            ].into_iter().collect(),
            r#struct: Struct {
                field: 42,
            },
            unit_variant: Enum::UnitVariant,
            newtype_variant: Enum::NewtypeVariant(false),
            tuple_variant: Enum::TupleVariant(1.0, 0.999),
            struct_variant: Enum::StructVariant {
                a: 255,
                b: 0,
                c: 33,
            }
        };
        assert_eq!(message, from_bytes::<Test>(&to_bytes(&message).unwrap()).unwrap());
        assert_eq!(message, from_message::<Test>(&to_message(&message).unwrap()).unwrap());
    }

    #[test]
    fn variants() {
        assert_eq!(Value::Symbol(Cow::Borrowed("UnitVariant")), to_value(&Enum::UnitVariant).unwrap());
        assert_eq!(
            Value::Map(vec![(Value::Symbol(Cow::Borrowed("NewtypeVariant")), Value::Bool(true))]),
            to_value(&Enum::NewtypeVariant(true)).unwrap(),
        );
        assert_eq!(
            Value::Map(vec![(
                Value::Symbol(Cow::Borrowed("StructVariant")),
                Value::Map(vec![
                    (Value::Symbol(Cow::Borrowed("a")), Value::ULong(1)),
                    (Value::Symbol(Cow::Borrowed("b")), Value::ULong(2)),
                    (Value::Symbol(Cow::Borrowed("c")), Value::ULong(3)),
                ]),
            )]),
            to_value(&Enum::StructVariant { a: 1, b: 2, c: 3 }).unwrap(),
        );
    }

    #[test]
    fn struct_encoding() {
        assert_eq!(to_bytes(&Struct { field: 7 }).unwrap(), [0xc1, 0x0a, 0x02, 0xa3, 0x05, 0x66, 0x69, 0x65, 0x6c, 0x64, 0x50, 0x07]);
    }

    #[test]
    fn integers_widen() {
        assert_eq!(7u64, from_bytes::<u64>(&[0x52, 0x07]).unwrap());
        assert_eq!(-1i64, from_bytes::<i64>(&[0x54, 0xff]).unwrap());
        assert!(matches!(from_bytes::<u8>(&[0x70, 0x00, 0x00, 0x01, 0x00]), Err(Error::Int)));
        assert!(matches!(from_bytes::<u32>(&[0x54, 0xff]), Err(Error::Int)));
    }

    #[test]
    fn described_is_transparent() {
        assert!(from_bytes::<bool>(&[0x00, 0x53, 0x01, 0x41]).unwrap());
    }

    #[test]
    fn symbols_are_text() {
        assert_eq!("amqp", from_bytes::<&str>(&[0xa3, 0x04, 0x61, 0x6d, 0x71, 0x70]).unwrap());
    }

    #[test]
    fn trailing() {
        assert!(matches!(from_bytes::<bool>(&[0x41, 0x41]), Err(Error::Trailing(1))));
    }

    #[test]
    fn message_without_value() {
        let buf = Message::marshal("x").unwrap();
        assert!(matches!(from_message::<bool>(&buf), Err(Error::NoValue)));
    }

    #[test]
    fn unexpected_type() {
        assert!(matches!(from_bytes::<bool>(&[0x40]), Err(Error::UnexpectedType(&["boolean"], "null"))));
    }

}
