use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

use bitframe_format::{LayoutConfig, MetaValue, Metadata, ParsedFrame};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
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

/// One header built by `encode`, with the frame body when requested.
pub struct EncodedFrame {
    pub header: Vec<u8>,
    /// Payload plus padding; empty unless a full frame was requested.
    pub body: Vec<u8>,
    pub payload_size: usize,
    pub metadata: Metadata,
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    layout: &'a str,
    payload_size: usize,
    header_size: usize,
    header: String,
    frame_size: usize,
    metadata: &'a Metadata,
}

pub fn print_encoded(layout: &str, frames: &[EncodedFrame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for frame in frames {
                let out = EncodedOutput {
                    layout,
                    payload_size: frame.payload_size,
                    header_size: frame.header.len(),
                    header: to_hex(&frame.header),
                    frame_size: frame.header.len() + frame.body.len(),
                    metadata: &frame.metadata,
                };
                print_json(&out);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LAYOUT", "PAYLOAD", "HEADER", "METADATA"]);
            for frame in frames {
                table.add_row(vec![
                    layout.to_string(),
                    frame.payload_size.to_string(),
                    to_hex(&frame.header),
                    describe_metadata(&frame.metadata),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!(
                    "layout={} payload={} header={} {}",
                    layout,
                    frame.payload_size,
                    to_hex(&frame.header),
                    describe_metadata(&frame.metadata)
                );
            }
        }
        OutputFormat::Raw => {
            let mut wire = Vec::new();
            for frame in frames {
                wire.extend_from_slice(&frame.header);
                wire.extend_from_slice(&frame.body);
            }
            print_raw(&wire);
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    index: usize,
    offset: u64,
    payload_size: usize,
    payload: String,
    metadata: &'a Metadata,
}

pub fn print_frames(frames: &[ParsedFrame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (index, frame) in frames.iter().enumerate() {
                let out = FrameOutput {
                    index,
                    offset: frame.offset,
                    payload_size: frame.payload.len(),
                    payload: payload_preview(&frame.payload),
                    metadata: &frame.metadata,
                };
                print_json(&out);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "OFFSET", "SIZE", "METADATA", "PAYLOAD"]);
            for (index, frame) in frames.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    frame.offset.to_string(),
                    frame.payload.len().to_string(),
                    describe_metadata(&frame.metadata),
                    payload_preview(&frame.payload),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, frame) in frames.iter().enumerate() {
                println!(
                    "frame={} offset={} size={} {} payload={}",
                    index,
                    frame.offset,
                    frame.payload.len(),
                    describe_metadata(&frame.metadata),
                    payload_preview(&frame.payload)
                );
            }
        }
        OutputFormat::Raw => {
            let mut out = Vec::new();
            for frame in frames {
                out.extend_from_slice(&frame.payload);
            }
            print_raw(&out);
        }
    }
}

/// What `layout` reports about a resolved header layout.
#[derive(Serialize)]
pub struct LayoutInfo<'a> {
    pub layout: &'a str,
    pub header_nbits: usize,
    pub header_nbytes: usize,
    pub bits_per_item: u32,
    pub carries_units: bool,
    pub access_code: String,
    pub threshold: u32,
    pub config: &'a LayoutConfig,
}

pub fn print_layout(info: &LayoutInfo<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(info),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["layout".to_string(), info.layout.to_string()])
                .add_row(vec!["header bits".to_string(), info.header_nbits.to_string()])
                .add_row(vec!["header bytes".to_string(), info.header_nbytes.to_string()])
                .add_row(vec!["bits per item".to_string(), info.bits_per_item.to_string()])
                .add_row(vec!["access code".to_string(), access_code_label(info)])
                .add_row(vec!["threshold".to_string(), info.threshold.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "layout={} header_nbits={} header_nbytes={} bits_per_item={} access_code={} threshold={}",
                info.layout,
                info.header_nbits,
                info.header_nbytes,
                info.bits_per_item,
                access_code_label(info),
                info.threshold
            );
        }
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

fn access_code_label(info: &LayoutInfo<'_>) -> String {
    if info.access_code.is_empty() {
        "-".to_string()
    } else {
        info.access_code.clone()
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn describe_metadata(metadata: &Metadata) -> String {
    metadata
        .iter()
        .map(|(key, value)| match value {
            MetaValue::Int(v) => format!("{key}={v}"),
            MetaValue::Bytes(b) => format!("{key}=0x{}", to_hex(b)),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
