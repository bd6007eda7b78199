use nom::{
    character::complete::{anychar, char, digit1, one_of},
    Finish,
    IResult,
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    sequence::{delimited, pair, preceded, separated_pair, tuple},
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_till1, take_while},
    multi::separated_list0,
};
use amqp_message::Value;
use anyhow::{anyhow, bail, Result};
use std::borrow::Cow;

const WHITESPACE: &str = " \t\r\n";
const PROTECTED_CHARS: &str = "\n\\$ ,:\"'()[]{}#";

fn white(i: &str) -> IResult<&str, &str> {
    take_while(move |c| WHITESPACE.contains(c))(i)
}

fn separator(i: &str) -> IResult<&str, char> {
    delimited(white, char(','), white)(i)
}

fn keyword(i: &str) -> IResult<&str, Value<'static>> {
    alt((
            value(Value::Null, tag("null")),
            value(Value::Bool(true), tag("true")),
            value(Value::Bool(false), tag("false")),
    ))(i)
}

fn unhex(digits: &str) -> Result<Vec<u8>> {
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits in {}", digits);
    }
    (0..digits.len()).step_by(2).map(|i| Ok(u8::from_str_radix(&digits[i..i + 2], 16)?)).collect()
}

fn hex(i: &str) -> IResult<&str, Vec<u8>> {
    map_res(take_while(|c: char| c.is_ascii_hexdigit()), unhex)(i)
}

fn fixed<const N: usize>(bytes: Vec<u8>) -> Result<[u8; N]> {
    bytes.try_into().map_err(|b: Vec<u8>| anyhow!("expected {} bytes, got {}", N, b.len()))
}

fn decimal(i: &str) -> IResult<&str, Value<'static>> {
    alt((
            map_res(delimited(tag("d32("), hex, char(')')), |b| fixed(b).map(Value::Decimal32)),
            map_res(delimited(tag("d64("), hex, char(')')), |b| fixed(b).map(Value::Decimal64)),
            map_res(delimited(tag("d128("), hex, char(')')), |b| fixed(b).map(Value::Decimal128)),
    ))(i)
}

fn uuid(i: &str) -> IResult<&str, Value<'static>> {
    map_res(
        delimited(tag("uuid("), take_while(|c: char| c.is_ascii_hexdigit() || c == '-'), char(')')),
        |u: &str| fixed(unhex(&u.replace('-', ""))?).map(Value::Uuid)
    )(i)
}

fn timestamp(i: &str) -> IResult<&str, Value<'static>> {
    map_res(
        delimited(tag("ts("), recognize(pair(opt(char('-')), digit1)), char(')')),
        |n: &str| n.parse().map(Value::Timestamp)
    )(i)
}

fn binary(i: &str) -> IResult<&str, Value<'static>> {
    map(delimited(tag("x'"), hex, char('\'')), |b| Value::Binary(Cow::Owned(b)))(i)
}

fn character(i: &str) -> IResult<&str, Value<'static>> {
    map(delimited(char('\''), anychar, char('\'')), Value::Char)(i)
}

fn string(i: &str) -> IResult<&str, String> {
    delimited(
            char('"'),
            map(opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((
                        value("\\", tag("\\")),
                        value("\"", tag("\"")),
                        value("\n", tag("n")),
                )))), |c| c.unwrap_or_default()),
            char('"')
    )(i)
}

fn symbol(i: &str) -> IResult<&str, String> {
    preceded(char('#'), alt((
        string,
        map(take_till1(|c: char| PROTECTED_CHARS.contains(c) || c.is_whitespace()), str::to_owned),
    )))(i)
}

fn digits(i: &str) -> IResult<&str, &str> {
    alt((
            recognize(tuple((
                opt(one_of("+-")),
                digit1,
                opt(pair(char('.'), digit1)),
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            ))),
            recognize(pair(opt(char('-')), tag("inf"))),
            tag("NaN"),
    ))(i)
}

fn suffix(i: &str) -> IResult<&str, &str> {
    alt((
            tag("u8"), tag("u16"), tag("u32"), tag("u64"),
            tag("i8"), tag("i16"), tag("i32"), tag("i64"),
            tag("f32"), tag("f64"),
    ))(i)
}

/// Without a suffix integers become longs and everything else a double
fn typed(n: &str, suffix: Option<&str>) -> Result<Value<'static>> {
    Ok(match suffix {
        Some("u8")  => Value::UByte(n.parse()?),
        Some("u16") => Value::UShort(n.parse()?),
        Some("u32") => Value::UInt(n.parse()?),
        Some("u64") => Value::ULong(n.parse()?),
        Some("i8")  => Value::Byte(n.parse()?),
        Some("i16") => Value::Short(n.parse()?),
        Some("i32") => Value::Int(n.parse()?),
        Some("i64") => Value::Long(n.parse()?),
        Some("f32") => Value::Float(n.parse()?),
        Some("f64") => Value::Double(n.parse()?),
        Some(other) => bail!("unknown suffix {}", other),
        None        => match n.parse() {
            Ok(v)  => Value::Long(v),
            Err(_) => Value::Double(n.parse()?),
        },
    })
}

fn number(i: &str) -> IResult<&str, Value<'static>> {
    map_res(pair(digits, opt(suffix)), |(n, s)| typed(n, s))(i)
}

fn list(i: &str) -> IResult<&str, Vec<Value<'static>>> {
    delimited(pair(char('['), white), separated_list0(separator, amqp_value), pair(white, char(']')))(i)
}

fn entries(i: &str) -> IResult<&str, Vec<(Value<'static>, Value<'static>)>> {
    delimited(
        pair(char('{'), white),
        separated_list0(separator, separated_pair(amqp_value, delimited(white, char(':'), white), amqp_value)),
        pair(white, char('}'))
    )(i)
}

fn described(i: &str) -> IResult<&str, Value<'static>> {
    map(
        delimited(pair(tag("described("), white), separated_pair(amqp_value, separator, amqp_value), pair(white, char(')'))),
        |(d, v)| Value::Described(Box::new(d), Box::new(v))
    )(i)
}

fn amqp_value(i: &str) -> IResult<&str, Value<'static>> {
    alt((
        map(string, |s| Value::String(Cow::Owned(s))),
        map(symbol, |s| Value::Symbol(Cow::Owned(s))),
        binary,
        character,
        map(list, Value::List),
        map(entries, Value::Map),
        map(preceded(tag("array"), list), Value::Array),
        described,
        timestamp,
        uuid,
        decimal,
        keyword,
        number,
    ))(i)
}

/// Parses the notation produced by the `Display` implementation of `Value`
pub fn parse(i: &str) -> Result<Value<'static>> {
    Ok(all_consuming(delimited(white, amqp_value, white))(i).finish().map_err(|e| anyhow!("{}", e))?.1)
}

#[cfg(test)]
mod tests {

    use super::parse;
    use amqp_message::Value;
    use std::borrow::Cow;

    #[test]
    fn scalars() {
        assert_eq!(Value::Null, parse("null").unwrap());
        assert_eq!(Value::Bool(false), parse(" false\n").unwrap());
        assert_eq!(Value::UByte(7), parse("7u8").unwrap());
        assert_eq!(Value::Short(-7), parse("-7i16").unwrap());
        assert_eq!(Value::Long(42), parse("42").unwrap());
        assert_eq!(Value::Double(1.5), parse("1.5").unwrap());
        assert_eq!(Value::Float(1.5), parse("1.5f32").unwrap());
        assert_eq!(Value::Char('ß'), parse("'ß'").unwrap());
        assert_eq!(Value::Timestamp(-1000), parse("ts(-1000)").unwrap());
        assert!(parse("256u8").is_err());
        assert!(parse("1.5u8").is_err());
    }

    #[test]
    fn text() {
        assert_eq!(Value::String(Cow::Borrowed("say \"hi\"\n")), parse(r#""say \"hi\"\n""#).unwrap());
        assert_eq!(Value::String(Cow::Borrowed("")), parse("\"\"").unwrap());
        assert_eq!(Value::Symbol(Cow::Borrowed("amqp:header:list")), parse("#\"amqp:header:list\"").unwrap());
        assert!(parse("#amqp:header:list").is_err());
        assert_eq!(Value::Symbol(Cow::Borrowed("x-opt-id")), parse("#x-opt-id").unwrap());
        assert_eq!(Value::Symbol(Cow::Borrowed("a b")), parse("#\"a b\"").unwrap());
        assert_eq!(Value::Binary(Cow::Borrowed(&[0xca, 0xfe][..])), parse("x'cafe'").unwrap());
    }

    #[test]
    fn fixed_width() {
        assert_eq!(
            Value::Uuid([0x55, 0x0e, 0x84, 0x00, 0xe2, 0x9b, 0x41, 0xd4, 0xa7, 0x16, 0x44, 0x66, 0x55, 0x44, 0x00, 0x00]),
            parse("uuid(550e8400-e29b-41d4-a716-446655440000)").unwrap()
        );
        assert_eq!(Value::Decimal32([0x22, 0x50, 0x00, 0x01]), parse("d32(22500001)").unwrap());
        assert!(parse("d64(22500001)").is_err());
    }

    #[test]
    fn compound() {
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::List(vec![]), Value::Map(vec![(Value::Symbol(Cow::Borrowed("k")), Value::Null)])]),
            parse("[1i32, [], {#k: null}]").unwrap()
        );
        assert_eq!(Value::Array(vec![Value::UInt(1), Value::UInt(2)]), parse("array[1u32,2u32]").unwrap());
        assert_eq!(
            Value::Described(Box::new(Value::ULong(0x77)), Box::new(Value::String(Cow::Borrowed("hi")))),
            parse("described(119u64, \"hi\")").unwrap()
        );
        assert!(parse("[1i32, 2i32").is_err());
        assert!(parse("null null").is_err());
    }

    #[test]
    fn display_is_parseable() {
        let value = Value::Map(vec![
            (Value::Symbol(Cow::Borrowed("x-opt-seq")), Value::Array(vec![Value::Long(-1), Value::Long(i64::MAX)])),
            (Value::String(Cow::Borrowed("payload")), Value::Binary(Cow::Borrowed(&[0x00, 0xff][..]))),
            (Value::Symbol(Cow::Borrowed("with space")), Value::Described(Box::new(Value::Symbol(Cow::Borrowed("d"))), Box::new(Value::Double(0.25)))),
            (Value::Char('\''), Value::Uuid([7; 16])),
            (Value::Symbol(Cow::Borrowed("tab\there")), Value::Symbol(Cow::Borrowed("cr\r"))),
            (Value::Timestamp(1_600_000_000_000), Value::Decimal128([1; 16])),
        ]);
        assert_eq!(value, parse(&value.to_string()).unwrap());
    }

}
