use lanpacket_manager::{PacketManager, StreamSink};

use crate::cmd::{parse_u8, EncodeArgs};
use crate::exit::{frame_error, manager_error, CliError, CliResult, SUCCESS};
use crate::output::{print_encoded, EncodeReport, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let sub_packets = args
        .sub_packets
        .iter()
        .map(|spec| parse_sub_packet(spec))
        .collect::<CliResult<Vec<_>>>()?;

    let mut manager = PacketManager::new(StreamSink::new(Vec::new()));
    {
        let mut out = manager.create_with_request(args.frame_type, args.request_id);
        out.open_session();
        for (sub_type, body) in &sub_packets {
            let mut up = out.up(*sub_type);
            up.add_data(body)
                .map_err(|err| frame_error(&format!("sub-packet 0x{sub_type:02x}"), err))?;
            up.store().map_err(|err| frame_error("store failed", err))?;
        }
        out.close_session();
        out.send(false)
            .map_err(|err| manager_error("send failed", err))?;
    }

    let frames = manager.stats().frames_sent;
    let wire = manager.into_sink().into_inner();
    tracing::debug!(frames, size = wire.len(), "frame encoded");

    let report = EncodeReport {
        frame_type: args.frame_type,
        request_id: args.request_id,
        frames,
        size: wire.len(),
        hex: hex::encode(&wire),
    };
    print_encoded(&report, &wire, format);

    Ok(SUCCESS)
}

/// Parse `TYPE:HEX` into a sub-packet type and body.
fn parse_sub_packet(spec: &str) -> CliResult<(u8, Vec<u8>)> {
    let (sub_type, body) = spec
        .split_once(':')
        .ok_or_else(|| CliError::usage(format!("--up expects TYPE:HEX, got {spec:?}")))?;
    let sub_type = parse_u8(sub_type).map_err(CliError::usage)?;
    let body = hex::decode(body.trim())
        .map_err(|err| CliError::usage(format!("--up body is not valid hex: {err}")))?;
    Ok((sub_type, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn parses_sub_packet_spec() {
        let (sub_type, body) = parse_sub_packet("0x02:0a0B").unwrap();
        assert_eq!(sub_type, 2);
        assert_eq!(body, vec![0x0A, 0x0B]);

        let (sub_type, body) = parse_sub_packet("7:").unwrap();
        assert_eq!(sub_type, 7);
        assert!(body.is_empty());
    }

    #[test]
    fn rejects_malformed_spec() {
        assert_eq!(parse_sub_packet("0x02").unwrap_err().code, USAGE);
        assert_eq!(parse_sub_packet("2:abc").unwrap_err().code, USAGE);
        assert_eq!(parse_sub_packet("300:00").unwrap_err().code, USAGE);
    }
}
