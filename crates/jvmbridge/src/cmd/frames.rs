use std::fs::File;
use std::io::BufReader;

use jvmbridge_rows::FrameReader;

use crate::cmd::FramesArgs;
use crate::exit::{io_error, row_error, CliResult, SUCCESS};
use crate::output::{print_frames, FrameSummary, OutputFormat};

pub fn run(args: FramesArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.file)
        .map_err(|err| io_error(&format!("failed opening {}", args.file.display()), err))?;
    let mut reader = FrameReader::with_config(BufReader::new(file), args.collector_config());

    let mut frames = Vec::new();
    while let Some(frame) = reader
        .next_frame()
        .map_err(|err| row_error("frame read failed", err))?
    {
        frames.push(FrameSummary {
            index: frames.len(),
            size: frame.len(),
        });
    }
    tracing::debug!(frames = frames.len(), "result stream ended");

    print_frames(&frames, format);
    Ok(SUCCESS)
}
