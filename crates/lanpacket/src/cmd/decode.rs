use std::fs;
use std::io::Read;
use std::path::Path;

use lanpacket_frame::Frame;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_decoded, DecodeReport, FrameRecord, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = read_input(args.input.as_deref())?;
    let bytes = if args.hex { decode_hex(&raw)? } else { raw };

    let report = decode_stream(&bytes, usize::from(args.chunk_size));
    tracing::debug!(
        frames = report.frames.len(),
        discarded = report.discarded_bytes,
        pending = report.pending_bytes,
        "stream decoded"
    );
    print_decoded(&report, format);

    Ok(SUCCESS)
}

/// Feed `bytes` through one receive buffer, `chunk_size` bytes at a time.
pub fn decode_stream(bytes: &[u8], chunk_size: usize) -> DecodeReport {
    let mut rx = Frame::new();
    let mut frames = Vec::new();
    let mut discarded_bytes = 0;

    for chunk in bytes.chunks(chunk_size.max(1)) {
        rx.receive_data(chunk);
        while rx.sync() {
            frames.push(FrameRecord::from_frame(&rx));
            rx.consume_data();
        }
        discarded_bytes += rx.take_discarded_bytes();
    }

    DecodeReport {
        frames,
        discarded_bytes,
        pending_bytes: rx.len(),
    }
}

fn read_input(path: Option<&Path>) -> CliResult<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err)),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            Ok(buf)
        }
    }
}

fn decode_hex(raw: &[u8]) -> CliResult<Vec<u8>> {
    let text: String = String::from_utf8_lossy(raw)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")))
}

#[cfg(test)]
mod tests {
    use lanpacket_frame::{FrameWrite, NOP};

    use super::*;

    fn wire(frame_type: u8, subs: &[(u8, &[u8])]) -> Vec<u8> {
        let mut frame = Frame::new_outbound(frame_type, 0);
        for (sub_type, body) in subs {
            let mut up = frame.up(*sub_type);
            up.add_data(body).unwrap();
            up.store().unwrap();
        }
        frame.calc_header();
        frame.as_bytes().to_vec()
    }

    #[test]
    fn chunking_does_not_change_result() {
        let mut stream = vec![0x01, 0x02, 0x03];
        stream.extend(wire(0x01, &[(0x02, b"abc"), (0x03, b"")]));
        stream.extend(wire(NOP, &[]));

        for chunk_size in [1, 5, 17, 64] {
            let report = decode_stream(&stream, chunk_size);
            assert_eq!(report.frames.len(), 2, "chunk size {chunk_size}");
            assert_eq!(report.discarded_bytes, 3);
            assert_eq!(report.pending_bytes, 0);
            assert_eq!(report.frames[0].sub_packets.len(), 2);
            assert_eq!(report.frames[0].sub_packets[0].body, "616263");
            assert_eq!(report.frames[1].type_name, "NOP");
        }
    }

    #[test]
    fn trailing_partial_frame_is_reported() {
        let frame = wire(0x01, &[(0x02, b"abcdef")]);
        let report = decode_stream(&frame[..frame.len() - 2], 64);
        assert!(report.frames.is_empty());
        assert_eq!(report.pending_bytes, frame.len() - 2);
    }

    #[test]
    fn decode_error_is_recorded() {
        let mut frame = Frame::new_outbound(0x01, 0);
        frame.write_data(&[0x02, 8, 0x00]).unwrap();
        frame.calc_header();

        let report = decode_stream(frame.as_bytes(), 64);
        assert_eq!(report.frames.len(), 1);
        assert!(report.frames[0].decode_error.is_some());
    }

    #[test]
    fn hex_input_ignores_whitespace() {
        assert_eq!(decode_hex(b"aa 01\n0f").unwrap(), vec![0xAA, 0x01, 0x0F]);
        assert_eq!(decode_hex(b"zz").unwrap_err().code, DATA_INVALID);
    }
}
