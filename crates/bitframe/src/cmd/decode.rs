use std::fs::File;
use std::io::{self, Read};

use bitframe_format::{FrameReader, ReaderConfig};

use crate::cmd::DecodeArgs;
use crate::exit::{format_error, io_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let formatter = args.select.formatter()?;
    let source: Box<dyn Read> = if args.input.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input).map_err(|err| {
            io_error(&format!("failed opening {}", args.input.display()), err)
        })?;
        Box::new(file)
    };

    let config = ReaderConfig {
        chunk_size: args.chunk_size,
    };
    let reader = FrameReader::with_config(source, formatter, config);

    let mut frames = Vec::new();
    for frame in reader.take(args.count.unwrap_or(usize::MAX)) {
        frames.push(frame.map_err(|err| format_error("decode failed", err))?);
    }

    tracing::info!(frames = frames.len(), "decode finished");
    print_frames(&frames, format);

    if frames.is_empty() {
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}
