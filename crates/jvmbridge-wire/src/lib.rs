//! Tagged binary payloads for calls into a JVM-hosted engine.
//!
//! Every call is sent as one length-prefixed payload:
//! - A 4-byte big-endian total length
//! - Call metadata (static flag, process and thread ids, target, method)
//! - The argument list, each argument led by a one-byte [`TypeTag`]
//!
//! Containers nest recursively. Homogeneous arrays carry one element tag
//! for all elements; heterogeneous sequences, rows and map values carry one
//! tag per element.

pub mod decode;
pub mod encode;
pub mod error;
pub mod framer;
pub mod primitive;
pub mod tag;
pub mod value;
pub mod writer;

pub use decode::{
    decode, decode_value, decode_with_config, read_payload, CallPayload, DecoderConfig,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAYLOAD,
};
pub use encode::{encode, encode_to_bytes, encode_value, Call};
pub use error::{Result, WireError};
pub use tag::{kind_for, tag_for, TypeTag};
pub use value::{Date, GenericRow, ObjectRef, Timestamp, Value, ValueMap};
pub use writer::{PayloadWriter, WriterConfig};
