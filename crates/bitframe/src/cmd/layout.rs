use bitframe_format::HeaderFormatter;

use crate::cmd::LayoutArgs;
use crate::exit::{format_error, CliResult, SUCCESS};
use crate::output::{print_layout, LayoutInfo, OutputFormat};

pub fn run(args: LayoutArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.select.layout_config()?;
    let formatter =
        HeaderFormatter::from_config(&config).map_err(|err| format_error("invalid layout", err))?;
    let layout = formatter.layout();

    let info = LayoutInfo {
        layout: layout.name(),
        header_nbits: layout.header_nbits(),
        header_nbytes: layout.header_nbytes(),
        bits_per_item: layout.bits_per_item(),
        carries_units: layout.carries_units(),
        access_code: layout.access_code().to_string(),
        threshold: formatter.threshold(),
        config: &config,
    };
    print_layout(&info, format);
    Ok(SUCCESS)
}
