use std::fs;

use bitframe_format::{FramerConfig, Metadata, PduFramer};

use crate::cmd::EncodeArgs;
use crate::exit::{format_error, io_error, CliResult, SUCCESS};
use crate::output::{print_encoded, EncodedFrame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut formatter = args.select.formatter()?;
    let layout = formatter.layout().name();

    let mut metadata = Metadata::new();
    for (key, value) in &args.meta {
        metadata.insert(key.as_str(), *value);
    }

    let mut frames = Vec::with_capacity(args.count);
    if let Some(len) = args.len {
        for _ in 0..args.count {
            let (header, metadata) = formatter
                .format_len(len, &metadata)
                .map_err(|err| format_error("encode failed", err))?;
            frames.push(EncodedFrame {
                header: header.to_vec(),
                body: Vec::new(),
                payload_size: len,
                metadata,
            });
        }
    } else {
        let payload = resolve_payload(&args)?;
        let config = FramerConfig {
            padding: args.padding,
            separate_header: true,
        };
        let mut framer = PduFramer::with_config(formatter, config);
        for _ in 0..args.count {
            let pdu = framer
                .frame(&payload, &metadata)
                .map_err(|err| format_error("encode failed", err))?;
            frames.push(EncodedFrame {
                header: pdu.header.map(|h| h.to_vec()).unwrap_or_default(),
                body: if args.frame {
                    pdu.payload.to_vec()
                } else {
                    Vec::new()
                },
                payload_size: payload.len(),
                metadata: pdu.metadata,
            });
        }
    }

    tracing::debug!(layout, headers = frames.len(), "encoded");
    print_encoded(layout, &frames, format);
    Ok(SUCCESS)
}

fn resolve_payload(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}
