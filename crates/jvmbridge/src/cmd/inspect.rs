use std::fs::File;
use std::io::BufReader;

use jvmbridge_wire::read_payload;

use crate::cmd::InspectArgs;
use crate::exit::{io_error, wire_error, CliResult, SUCCESS};
use crate::output::{print_call, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.file)
        .map_err(|err| io_error(&format!("failed opening {}", args.file.display()), err))?;

    let call = read_payload(BufReader::new(file), &args.limits.decoder_config())
        .map_err(|err| wire_error("decode failed", err))?;
    tracing::debug!(
        total_length = call.total_length,
        args = call.args.len(),
        "decoded captured payload"
    );

    print_call(&call, format);
    Ok(SUCCESS)
}
