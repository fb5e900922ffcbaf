use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use lanpacket_frame::{frame_type_name, Frame};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubPacketRecord {
    pub sub_type: u8,
    pub size: usize,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct FrameRecord {
    pub frame_type: u8,
    pub type_name: &'static str,
    pub request_id: u16,
    pub payload_size: usize,
    pub sub_packets: Vec<SubPacketRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    #[serde(skip)]
    pub payload: Vec<u8>,
}

impl FrameRecord {
    /// Snapshot a synced frame.
    pub fn from_frame(frame: &Frame) -> Self {
        let mut sub_packets = Vec::new();
        let mut decode_error = None;
        for up in frame.sub_packets() {
            match up {
                Ok(up) => sub_packets.push(SubPacketRecord {
                    sub_type: up.sub_type(),
                    size: up.data_size(),
                    body: hex::encode(up.body()),
                }),
                Err(err) => {
                    tracing::warn!(frame_type = frame.frame_type(), error = %err, "sub-packet decode error");
                    decode_error = Some(err.to_string());
                }
            }
        }

        Self {
            frame_type: frame.frame_type(),
            type_name: frame_type_name(frame.frame_type()),
            request_id: frame.request_id(),
            payload_size: frame.data_size(),
            sub_packets,
            decode_error,
            payload: frame.payload().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DecodeReport {
    pub frames: Vec<FrameRecord>,
    pub discarded_bytes: u64,
    pub pending_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct EncodeReport {
    pub frame_type: u8,
    pub request_id: u16,
    pub frames: u64,
    pub size: usize,
    pub hex: String,
}

pub fn print_decoded(report: &DecodeReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "TYPE", "REQUEST", "UP", "SIZE", "BODY"]);
            for (index, frame) in report.frames.iter().enumerate() {
                let label = format!("{} ({})", hex_u8(frame.frame_type), frame.type_name);
                if frame.sub_packets.is_empty() {
                    table.add_row(vec![
                        index.to_string(),
                        label.clone(),
                        frame.request_id.to_string(),
                        "-".to_string(),
                        "0".to_string(),
                        String::new(),
                    ]);
                }
                for up in &frame.sub_packets {
                    table.add_row(vec![
                        index.to_string(),
                        label.clone(),
                        frame.request_id.to_string(),
                        hex_u8(up.sub_type),
                        up.size.to_string(),
                        up.body.clone(),
                    ]);
                }
            }
            println!("{table}");
            println!(
                "frames={} discarded={} pending={}",
                report.frames.len(),
                report.discarded_bytes,
                report.pending_bytes
            );
        }
        OutputFormat::Pretty => {
            for frame in &report.frames {
                println!(
                    "frame type={} ({}) request={} size={}",
                    hex_u8(frame.frame_type),
                    frame.type_name,
                    frame.request_id,
                    frame.payload_size
                );
                for up in &frame.sub_packets {
                    println!(
                        "  up type={} size={} body={}",
                        hex_u8(up.sub_type),
                        up.size,
                        up.body
                    );
                }
                if let Some(err) = &frame.decode_error {
                    println!("  decode error: {err}");
                }
            }
            println!(
                "discarded={} pending={}",
                report.discarded_bytes, report.pending_bytes
            );
        }
        OutputFormat::Raw => {
            for frame in &report.frames {
                print_raw(&frame.payload);
            }
        }
    }
}

pub fn print_encoded(report: &EncodeReport, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "REQUEST", "FRAMES", "SIZE", "WIRE"])
                .add_row(vec![
                    hex_u8(report.frame_type),
                    report.request_id.to_string(),
                    report.frames.to_string(),
                    report.size.to_string(),
                    report.hex.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", report.hex),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn hex_u8(value: u8) -> String {
    format!("0x{value:02x}")
}
