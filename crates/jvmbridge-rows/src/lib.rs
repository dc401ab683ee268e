//! Row collection for result streams returned by the JVM bridge.
//!
//! A result stream is a sequence of length-prefixed frames terminated by a
//! zero-length frame. Frame bodies are pickled objects; decoding them is
//! delegated to an [`Unpickler`], and the resulting row constructors are
//! finalized into [`Row`]s.
//!
//! ```
//! use jvmbridge_rows::{collect, PickleValue, RowConstructor, UnpickleError};
//!
//! let wire: &[u8] = &[0, 0, 0, 1, 42, 0, 0, 0, 0];
//! let unpickle = |frame: &[u8]| {
//!     Ok::<_, UnpickleError>(vec![PickleValue::from(RowConstructor::new(vec![
//!         PickleValue::Int(i64::from(frame[0])),
//!     ]))])
//! };
//! let rows: Vec<_> = collect(wire, unpickle, false)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(rows[0].values(), &[PickleValue::Int(42)]);
//! ```

pub mod collector;
pub mod error;
pub mod pickle;
pub mod reader;
pub mod row;

pub use collector::{collect, RowCollector};
pub use error::{Result, RowError};
pub use pickle::{PickleValue, UnpickleError, Unpickler};
pub use reader::{CollectorConfig, FrameReader, DEFAULT_MAX_FRAME_SIZE};
pub use row::{Row, RowConstructor, RowSchema, StructField};
