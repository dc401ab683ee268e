//! The object model produced by an external unpickler.
//!
//! Frame bytes are opaque to this crate. An [`Unpickler`] turns each frame
//! into zero or more [`PickleValue`]s; rows arrive as [`RowConstructor`]s
//! that are finalized into [`Row`]s on demand.

use std::error::Error as StdError;
use std::fmt;

use bytes::Bytes;

use crate::row::{Row, RowConstructor};

/// An unpickled object.
#[derive(Debug, Clone, PartialEq)]
pub enum PickleValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Bytes),
    /// An ordered, mutable list.
    List(Vec<PickleValue>),
    Tuple(Vec<PickleValue>),
    Dict(Vec<(PickleValue, PickleValue)>),
    /// A finalized row.
    Row(Row),
    /// A row not yet finalized.
    Constructor(RowConstructor),
}

impl PickleValue {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Row(_) => "row",
            Self::Constructor(_) => "row-constructor",
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_constructor(&self) -> Option<&RowConstructor> {
        match self {
            Self::Constructor(ctor) => Some(ctor),
            _ => None,
        }
    }
}

impl From<RowConstructor> for PickleValue {
    fn from(ctor: RowConstructor) -> Self {
        Self::Constructor(ctor)
    }
}

impl From<Row> for PickleValue {
    fn from(row: Row) -> Self {
        Self::Row(row)
    }
}

/// Failure reported by an [`Unpickler`].
#[derive(Debug)]
pub struct UnpickleError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl UnpickleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an error raised by the underlying decoder.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl fmt::Display for UnpickleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unpickling failed: {}", self.message)
    }
}

impl StdError for UnpickleError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}

/// Decodes one frame of pickled bytes into objects.
pub trait Unpickler {
    fn unpickle(&mut self, frame: &[u8]) -> Result<Vec<PickleValue>, UnpickleError>;
}

impl<F> Unpickler for F
where
    F: FnMut(&[u8]) -> Result<Vec<PickleValue>, UnpickleError>,
{
    fn unpickle(&mut self, frame: &[u8]) -> Result<Vec<PickleValue>, UnpickleError> {
        self(frame)
    }
}
