//! Wire protocol for calling into a JVM-hosted Spark engine.
//!
//! A client drives the engine by sending length-prefixed call payloads
//! (target, method, tagged arguments) and reads query results back as a
//! stream of length-prefixed pickled frames.
//!
//! # Crate Structure
//!
//! - [`wire`]: type tags, payload encoding and decoding, call writer
//! - [`rows`]: result frame reader and row reconstruction

/// Re-export wire types.
pub mod wire {
    pub use jvmbridge_wire::*;
}

/// Re-export row collection types.
pub mod rows {
    pub use jvmbridge_rows::*;
}
