use crate::pickle::UnpickleError;

/// Errors that can occur while collecting rows from a result stream.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// An I/O error occurred while reading frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended inside a frame length or frame body.
    #[error("truncated frame (needed {needed} bytes, got {got})")]
    TruncatedPayload { needed: usize, got: usize },

    /// The frame length is negative.
    #[error("malformed frame (invalid length {length})")]
    MalformedFrame { length: i32 },

    /// The frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The unpickler rejected a frame.
    #[error(transparent)]
    Unpickle(#[from] UnpickleError),

    /// An unpickled top-level object is not a row.
    #[error("expected a row or row constructor, got {0}")]
    UnexpectedObject(&'static str),

    /// A row schema is not valid struct-type JSON.
    #[error("invalid row schema: {0}")]
    Schema(#[from] serde_json::Error),

    /// The schema and the row disagree on the number of fields.
    #[error("row has {values} values but its schema has {fields} fields")]
    SchemaMismatch { fields: usize, values: usize },
}

pub type Result<T> = std::result::Result<T, RowError>;
