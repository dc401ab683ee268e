use clap::{Args, Subcommand};
use std::path::PathBuf;

use jvmbridge_rows::{CollectorConfig, DEFAULT_MAX_FRAME_SIZE};
use jvmbridge_wire::{DecoderConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAYLOAD};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod encode;
pub mod frames;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a captured call payload and print it.
    Inspect(InspectArgs),
    /// Build a call payload from JSON arguments.
    Encode(EncodeArgs),
    /// List the frames of a captured result stream.
    Frames(FramesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Inspect(args) => inspect::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Frames(args) => frames::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct LimitArgs {
    /// Maximum payload size in bytes.
    #[arg(long, env = "JVMBRIDGE_MAX_PAYLOAD", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
    /// Maximum container nesting depth when decoding.
    #[arg(long, env = "JVMBRIDGE_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

impl LimitArgs {
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            max_payload_size: self.max_payload,
            max_depth: self.max_depth,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// File holding one captured call payload, length prefix included.
    pub file: PathBuf,
    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Target object id, or class name for static calls.
    #[arg(long)]
    pub target: String,
    /// Method name.
    #[arg(long)]
    pub method: String,
    /// Mark the call as static.
    #[arg(long = "static")]
    pub is_static: bool,
    /// Process id written into the header. Default: this process.
    #[arg(long)]
    pub pid: Option<i32>,
    /// Thread id written into the header.
    #[arg(long, default_value_t = 1)]
    pub tid: i32,
    /// Arguments as a JSON array.
    #[arg(long, default_value = "[]")]
    pub args: String,
    /// Write the payload to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug)]
pub struct FramesArgs {
    /// File holding a captured result stream.
    pub file: PathBuf,
    /// Maximum accepted frame size in bytes.
    #[arg(long, env = "JVMBRIDGE_MAX_FRAME", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame: usize,
}

impl FramesArgs {
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            max_frame_size: self.max_frame,
        }
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
