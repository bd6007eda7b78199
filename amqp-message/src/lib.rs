//! All encoding functions take `&self` and a writer and return the amount of written bytes. All decoding functions take
//! a buffer and return `Self` and the number of consumed bytes, except `Message::unmarshal` which always consumes the
//! whole buffer.
//!
//! # A note on borrowing
//!
//! Strings, symbols and binaries of decoded values and messages borrow from the input buffer. Call `into_owned` on a
//! `Value` or `Message` to detach it. Data sections are the exception once a body is spread over several of them: the
//! concatenated body has to be copied.
//!
//! # A note on untrusted input
//!
//! Containers are decoded inside the window their size field declares and counts are checked against the remaining
//! bytes before anything is allocated. Nesting is bounded by `DecodeOptions::max_depth`. A message that repeats a
//! section is rejected unless `DecodeOptions::repeated_sections` says otherwise.
//!
//! # A note on Maps
//!
//! The variant `Value::Map` uses a `Vec` of key-value pairs internally because Rust's floating point types `f32` and
//! `f64` implement neither `Ord` nor `Hash`. This also keeps duplicate keys in wire order.
//!
//! # Examples
//!
//! ```
//! use amqp_message::*;
//!
//! let buf = Message::marshal("hi").unwrap();
//! assert_eq!(buf, [
//!     0x00, // Described type
//!     0x53, // smallulong
//!     0x75, // Data section
//!     0xa0, // vbin8
//!     0x02, // of length 2
//!     0x68, // 'h'
//!     0x69, // 'i'
//! ]);
//! let message = Message::unmarshal(&buf).unwrap();
//! assert_eq!(Some(&b"hi"[..]), message.body.as_deref());
//!
//! let (value, consumed) = Decoder::decode(&[0xc1u8, 0x0a, 0x02, 0xa1, 0x05, 0x63, 0x6f, 0x75, 0x6e, 0x74, 0x54, 0x00]).unwrap();
//! assert_eq!(12, consumed);
//! assert_eq!(r#"{"count": 0i32}"#, value.to_string());
//! ```

mod error;
mod format_code;
mod message;
mod options;
mod registry;
mod sections;
mod value;

pub use error::*;
pub use format_code::*;
pub use message::*;
pub use options::*;
pub use registry::*;
pub use sections::*;
pub use value::*;
