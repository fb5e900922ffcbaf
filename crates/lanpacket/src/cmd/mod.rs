use clap::{Args, Subcommand};
use std::path::PathBuf;

use lanpacket_frame::NOP;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build one frame and print its wire bytes.
    Encode(EncodeArgs),
    /// Resynchronize a byte stream and print the frames it contains.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Frame type (decimal, 0x-prefixed hex, or "nop").
    #[arg(long = "type", short = 't', value_name = "TYPE", value_parser = parse_frame_type)]
    pub frame_type: u8,
    /// Request id stored in the header.
    #[arg(long, short = 'r', default_value = "0", value_parser = parse_u16)]
    pub request_id: u16,
    /// Sub-packet as TYPE:HEXBODY, repeatable (e.g. 0x02:0a0b).
    #[arg(long = "up", short = 'u', value_name = "TYPE:HEX")]
    pub sub_packets: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input file. Reads stdin when omitted or "-".
    pub input: Option<PathBuf>,
    /// Treat the input as hex text (whitespace ignored).
    #[arg(long)]
    pub hex: bool,
    /// Bytes fed to the decoder per step.
    #[arg(long, default_value = "64", value_parser = clap::value_parser!(u16).range(1..))]
    pub chunk_size: u16,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_frame_type(input: &str) -> Result<u8, String> {
    if input.eq_ignore_ascii_case("nop") {
        return Ok(NOP);
    }
    parse_u8(input)
}

pub fn parse_u8(input: &str) -> Result<u8, String> {
    let value = parse_number(input)?;
    u8::try_from(value).map_err(|_| format!("{input} does not fit in one byte"))
}

pub fn parse_u16(input: &str) -> Result<u16, String> {
    let value = parse_number(input)?;
    u16::try_from(value).map_err(|_| format!("{input} does not fit in two bytes"))
}

fn parse_number(input: &str) -> Result<u32, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid number: {input}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_decimal_and_hex() {
        assert_eq!(parse_u8("17"), Ok(17));
        assert_eq!(parse_u8("0xff"), Ok(0xFF));
        assert_eq!(parse_u16("0X1234"), Ok(0x1234));
        assert!(parse_u8("256").is_err());
        assert!(parse_u8("0xzz").is_err());
        assert!(parse_u16("").is_err());
    }

    #[test]
    fn nop_alias() {
        assert_eq!(parse_frame_type("NOP"), Ok(0xFF));
        assert_eq!(parse_frame_type("1"), Ok(1));
    }
}
