mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "lanpacket",
    version,
    about = "LAN bus frame encoder and decoder"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "lanpacket",
            "encode",
            "--type",
            "0x01",
            "-r",
            "7",
            "--up",
            "2:0a0b",
            "--up",
            "3:",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.frame_type, 1);
                assert_eq!(args.request_id, 7);
                assert_eq!(args.sub_packets, vec!["2:0a0b", "3:"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn encode_requires_type() {
        let err = Cli::try_parse_from(["lanpacket", "encode"]).expect_err("type is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_decode_with_global_format() {
        let cli = Cli::try_parse_from([
            "lanpacket",
            "decode",
            "--hex",
            "--chunk-size",
            "3",
            "--format",
            "json",
            "-",
        ])
        .expect("decode args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        match cli.command {
            Command::Decode(args) => {
                assert!(args.hex);
                assert_eq!(args.chunk_size, 3);
                assert_eq!(args.input.as_deref(), Some(std::path::Path::new("-")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(Cli::try_parse_from(["lanpacket", "decode", "--chunk-size", "0"]).is_err());
    }

    #[test]
    fn parses_version_subcommand() {
        let cli = Cli::try_parse_from(["lanpacket", "version", "--extended"])
            .expect("version args should parse");
        assert!(matches!(cli.command, Command::Version(args) if args.extended));
    }
}
