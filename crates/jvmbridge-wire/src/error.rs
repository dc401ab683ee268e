use crate::tag::TypeTag;

/// Errors that can occur while encoding or decoding call payloads.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The argument has a shape the wire format cannot carry.
    ///
    /// Bytes may already have reached a shared stream when this surfaces from
    /// a streaming caller, so treat it as fatal to the connection.
    #[error("unsupported argument type {kind}: {reason}")]
    UnsupportedArgumentType { kind: TypeTag, reason: String },

    /// A tag byte outside the registry was read.
    #[error("unknown type tag 0x{0:02x}")]
    UnknownTag(u8),

    /// The source ended before the expected structure completed.
    #[error("truncated payload (needed {needed} bytes, {remaining} remaining)")]
    TruncatedPayload { needed: usize, remaining: usize },

    /// A length or count field is negative.
    #[error("malformed frame (invalid length {length})")]
    MalformedFrame { length: i64 },

    /// Bytes were left inside the declared payload after the last argument.
    #[error("{0} trailing bytes after last argument")]
    TrailingBytes(usize),

    /// A map declares a key kind that cannot be a map key.
    #[error("{0} cannot be a map key")]
    InvalidMapKey(TypeTag),

    /// A map carries the same key twice.
    #[error("duplicate map key at index {index}")]
    DuplicateMapKey { index: usize },

    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A date field does not hold a `yyyy-MM-dd` calendar date.
    #[error("invalid date {0:?}")]
    InvalidDate(String),

    /// Containers are nested deeper than the decoder allows.
    #[error("nesting deeper than {max} levels")]
    NestingTooDeep { max: usize },

    /// The payload or one of its counts exceeds the allowed maximum.
    #[error("payload too large ({size}, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing payloads.
    #[error("payload I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete payload was transferred.
    #[error("connection closed (incomplete payload)")]
    ConnectionClosed,
}

impl WireError {
    pub(crate) fn unsupported(kind: TypeTag, reason: impl Into<String>) -> Self {
        Self::UnsupportedArgumentType {
            kind,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
