use std::fs;
use std::path::PathBuf;

use bitframe_format::layout::{
    CounterConfig, CrcConfig, DefaultConfig, OfdmConfig, VariableBitsConfig,
};
use bitframe_format::{HeaderFormatter, LayoutConfig};
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{format_error, io_error, CliError, CliResult, DATA_INVALID, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod layout;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build headers, or complete frames, for a payload.
    Encode(EncodeArgs),
    /// Recover framed payloads from a byte stream.
    Decode(DecodeArgs),
    /// Describe a header layout.
    Layout(LayoutArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Layout(args) => layout::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutKind {
    Default,
    Counter,
    Crc,
    VariableBits,
    Ofdm,
}

/// Layout selection shared by every framing command.
#[derive(Args, Debug, Clone)]
pub struct LayoutSelect {
    /// Header layout.
    #[arg(long, value_enum, default_value = "default", conflicts_with = "config")]
    pub layout: LayoutKind,
    /// Read the layout and its parameters from a JSON file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Access code as a string of '0'/'1' (default and counter layouts).
    #[arg(long, value_name = "BITS")]
    pub access_code: Option<String>,
    /// Access code bit errors tolerated (default and counter layouts).
    #[arg(long)]
    pub threshold: Option<u32>,
    /// Counter bits per symbol, or header bits per unit for the
    /// variable-bits and OFDM layouts.
    #[arg(long)]
    pub bps: Option<u32>,
    /// Header length in units (variable-bits layout).
    #[arg(long, value_name = "UNITS")]
    pub header_len: Option<usize>,
    /// Bits per payload symbol (OFDM layout).
    #[arg(long)]
    pub payload_bps: Option<u32>,
    /// Send the OFDM header unscrambled.
    #[arg(long)]
    pub no_scramble: bool,
}

impl LayoutSelect {
    /// Resolve the flags, or the config file, into a layout config.
    pub fn layout_config(&self) -> CliResult<LayoutConfig> {
        if let Some(path) = &self.config {
            let text = fs::read_to_string(path).map_err(|err| {
                io_error(&format!("failed reading {}", path.display()), err)
            })?;
            return serde_json::from_str(&text).map_err(|err| {
                CliError::new(
                    DATA_INVALID,
                    format!("{} is not a valid layout config: {err}", path.display()),
                )
            });
        }

        let sync = matches!(self.layout, LayoutKind::Default | LayoutKind::Counter);
        if !sync && (self.access_code.is_some() || self.threshold.is_some()) {
            return Err(CliError::new(
                USAGE,
                "--access-code and --threshold apply only to the default and counter layouts",
            ));
        }

        let config = match self.layout {
            LayoutKind::Default => {
                let mut config = DefaultConfig::default();
                if let Some(code) = &self.access_code {
                    config.access_code = code.clone();
                }
                if let Some(threshold) = self.threshold {
                    config.threshold = threshold;
                }
                LayoutConfig::Default(config)
            }
            LayoutKind::Counter => {
                let mut config = CounterConfig::default();
                if let Some(code) = &self.access_code {
                    config.access_code = code.clone();
                }
                if let Some(threshold) = self.threshold {
                    config.threshold = threshold;
                }
                if let Some(bps) = self.bps {
                    config.bps = u16::try_from(bps)
                        .map_err(|_| CliError::new(USAGE, format!("--bps {bps} is too large")))?;
                }
                LayoutConfig::Counter(config)
            }
            LayoutKind::Crc => LayoutConfig::Crc(CrcConfig::default()),
            LayoutKind::VariableBits => {
                let mut config = VariableBitsConfig::default();
                if let Some(bps) = self.bps {
                    config.bits_per_symbol = bps;
                }
                if let Some(units) = self.header_len {
                    config.header_len = units;
                }
                LayoutConfig::VariableBits(config)
            }
            LayoutKind::Ofdm => {
                let mut config = OfdmConfig {
                    scramble_header: !self.no_scramble,
                    ..OfdmConfig::default()
                };
                if let Some(bps) = self.bps {
                    config.bits_per_header_sym = bps;
                }
                if let Some(bps) = self.payload_bps {
                    config.bits_per_payload_sym = bps;
                }
                LayoutConfig::Ofdm(config)
            }
        };
        Ok(config)
    }

    pub fn formatter(&self) -> CliResult<HeaderFormatter> {
        let config = self.layout_config()?;
        HeaderFormatter::from_config(&config).map_err(|err| format_error("invalid layout", err))
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub select: LayoutSelect,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["file", "len"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "len"])]
    pub file: Option<PathBuf>,
    /// Payload length in bytes; builds headers only.
    #[arg(long, conflicts_with_all = ["data", "file", "frame"])]
    pub len: Option<usize>,
    /// Emit the payload and padding after each header.
    #[arg(long)]
    pub frame: bool,
    /// Zero bytes appended after the payload.
    #[arg(long, default_value_t = 0, requires = "frame")]
    pub padding: usize,
    /// Number of consecutive headers to build.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
    /// Integer metadata attached to each header (KEY=VALUE, repeatable).
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_meta)]
    pub meta: Vec<(String, i64)>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub select: LayoutSelect,
    /// Input file, or '-' for stdin.
    #[arg(default_value = "-")]
    pub input: PathBuf,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Bytes read from the input per chunk.
    #[arg(long, default_value_t = 4096)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    #[command(flatten)]
    pub select: LayoutSelect,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_meta(input: &str) -> Result<(String, i64), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {input:?}"))?;
    if key.is_empty() {
        return Err("metadata key must not be empty".to_string());
    }
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("metadata value for {key:?} must be an integer"))?;
    Ok((key.to_string(), value))
}
