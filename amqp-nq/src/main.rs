mod parser;

use amqp_message::*;
use std::io::{self, Read, Write};
use anyhow::{Context, Result};
use structopt::StructOpt;
use std::str::from_utf8;
use tracing::{debug, Level};

/// Decode and print AMQP 1.0 messages
#[derive(StructOpt)]
#[structopt(name = "aq", author = "Liv Fischer")]
struct Opt {
    /// parse a textual value and encode it into a message with a single amqp-value section instead
    #[structopt(short, long)]
    encode: bool,
    /// together with --encode, wrap stdin verbatim into a data section
    #[structopt(short, long, requires = "encode")]
    data: bool,
    /// read (or with --encode, write) base64 text instead of binary
    #[structopt(short, long)]
    base64: bool,
    /// maximum nesting of compound values accepted while decoding
    #[structopt(long, default_value = "32")]
    max_depth: usize,
    /// let repeated sections overwrite earlier ones instead of failing
    #[structopt(long)]
    lenient: bool,
    /// log more, may be repeated
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let level = match opt.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).init();
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer).context("Failed to read stdin")?;
    debug!(bytes = buffer.len(), "read input");
    if opt.encode {
        encode(&opt, &buffer)
    } else {
        print(&opt, &buffer)
    }
}

fn print(opt: &Opt, buffer: &[u8]) -> Result<()> {
    let decoded;
    let input = if opt.base64 {
        let text = from_utf8(buffer).context("input is not utf-8")?;
        decoded = base64::decode(text.trim()).context("input is not valid base64")?;
        &decoded[..]
    } else {
        buffer
    };
    let policy = if opt.lenient { RepeatedSection::Overwrite } else { RepeatedSection::Reject };
    let options = DecodeOptions::default().max_depth(opt.max_depth).repeated_sections(policy);
    let message = Message::unmarshal_with(input, &options).context("Decoding error")?;
    print!("{}", &message);
    Ok(())
}

fn encode(opt: &Opt, buffer: &[u8]) -> Result<()> {
    let bytes = if opt.data {
        Message::marshal(buffer)?
    } else {
        let string = from_utf8(buffer).context("input is not utf-8")?;
        let value = parser::parse(string)?;
        debug!(%value, "parsed input");
        Message { amqp_value: Some(value), ..Message::default() }.to_bytes().context("Encoding error")?
    };
    let mut stdout = io::stdout();
    if opt.base64 {
        writeln!(stdout, "{}", base64::encode(&bytes))?;
    } else {
        stdout.write_all(&bytes)?;
    }
    Ok(())
}
