//! Call payload decoding.
//!
//! The exact inverse of [`crate::encode`]. The remote engine owns the
//! production decoder; this one exists to verify payloads and to inspect
//! captured traffic.

use std::collections::HashSet;
use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes};

use crate::encode::Call;
use crate::error::{Result, WireError};
use crate::primitive::Cursor;
use crate::tag::TypeTag;
use crate::value::{Date, GenericRow, ObjectRef, Timestamp, Value, ValueMap};

/// Default maximum payload size: 64 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Default maximum container nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Limits applied while decoding untrusted payloads.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum declared total length. Default: 64 MiB.
    pub max_payload_size: usize,
    /// Maximum container nesting depth. Default: 64.
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A decoded call payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPayload {
    /// Declared byte length of everything after the length field.
    pub total_length: i32,
    pub is_static: bool,
    pub process_id: i32,
    pub thread_id: i32,
    pub target: String,
    pub method: String,
    pub args: Vec<Value>,
}

impl CallPayload {
    /// Borrow as a [`Call`] for re-encoding.
    pub fn as_call(&self) -> Call<'_> {
        Call {
            is_static: self.is_static,
            process_id: self.process_id,
            thread_id: self.thread_id,
            target: &self.target,
            method: &self.method,
            args: &self.args,
        }
    }
}

/// Decode one call payload from `src` with default limits.
pub fn decode<B: Buf>(src: &mut B) -> Result<CallPayload> {
    decode_with_config(src, &DecoderConfig::default())
}

/// Decode one call payload from `src`.
///
/// Consumes exactly the length field plus the declared payload bytes.
pub fn decode_with_config<B: Buf>(src: &mut B, config: &DecoderConfig) -> Result<CallPayload> {
    if src.remaining() < 4 {
        return Err(WireError::TruncatedPayload {
            needed: 4,
            remaining: src.remaining(),
        });
    }
    let total_length = src.get_i32();
    let size = checked_size(total_length, config)?;
    if src.remaining() < size {
        return Err(WireError::TruncatedPayload {
            needed: size,
            remaining: src.remaining(),
        });
    }
    let body = src.copy_to_bytes(size);
    decode_body(total_length, body, config)
}

/// Read one length-prefixed call payload from a blocking stream.
pub fn read_payload<R: Read>(mut reader: R, config: &DecoderConfig) -> Result<CallPayload> {
    let mut len = [0u8; 4];
    read_exact(&mut reader, &mut len)?;
    let total_length = i32::from_be_bytes(len);
    let size = checked_size(total_length, config)?;

    let mut body = Vec::new();
    let read = reader.take(size as u64).read_to_end(&mut body)?;
    if read < size {
        return Err(WireError::TruncatedPayload {
            needed: size,
            remaining: read,
        });
    }
    decode_body(total_length, Bytes::from(body), config)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(WireError::TruncatedPayload {
                    needed: buf.len(),
                    remaining: filled,
                })
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(WireError::Io(err)),
        }
    }
    Ok(())
}

fn checked_size(total_length: i32, config: &DecoderConfig) -> Result<usize> {
    let size = usize::try_from(total_length).map_err(|_| WireError::MalformedFrame {
        length: i64::from(total_length),
    })?;
    if size > config.max_payload_size {
        return Err(WireError::PayloadTooLarge {
            size,
            max: config.max_payload_size,
        });
    }
    Ok(size)
}

fn decode_body(total_length: i32, body: Bytes, config: &DecoderConfig) -> Result<CallPayload> {
    let mut decoder = Decoder {
        src: Cursor::new(body),
        max_depth: config.max_depth,
        depth: 0,
    };

    let is_static = decoder.src.bool()?;
    let process_id = decoder.src.i32()?;
    let thread_id = decoder.src.i32()?;
    let target = decoder.src.string()?;
    let method = decoder.src.string()?;
    let count = decoder.src.len()?;

    let mut args = Vec::with_capacity(decoder.src.capacity_for(count, 1));
    for _ in 0..count {
        args.push(decoder.value()?);
    }

    let trailing = decoder.src.remaining();
    if trailing > 0 {
        return Err(WireError::TrailingBytes(trailing));
    }

    tracing::debug!(
        call_target = %target,
        method = %method,
        args = args.len(),
        total_length,
        "decoded call payload"
    );

    Ok(CallPayload {
        total_length,
        is_static,
        process_id,
        thread_id,
        target,
        method,
        args,
    })
}

/// Decode a single tagged value from `src`.
pub fn decode_value(src: Bytes, config: &DecoderConfig) -> Result<Value> {
    let mut decoder = Decoder {
        src: Cursor::new(src),
        max_depth: config.max_depth,
        depth: 0,
    };
    decoder.value()
}

struct Decoder {
    src: Cursor,
    max_depth: usize,
    depth: usize,
}

impl Decoder {
    fn value(&mut self) -> Result<Value> {
        let tag = TypeTag::from_byte(self.src.u8()?)?;
        self.body(tag)
    }

    /// Everything after the tag.
    fn body(&mut self, tag: TypeTag) -> Result<Value> {
        let value = match tag {
            TypeTag::Null => Value::Null,
            TypeTag::Int32 => Value::Int32(self.src.i32()?),
            TypeTag::Int64 => Value::Int64(self.src.i64()?),
            TypeTag::Bool => Value::Bool(self.src.bool()?),
            TypeTag::Double => Value::Double(self.src.f64()?),
            TypeTag::Single => Value::Single(self.src.f32()?),
            TypeTag::String => Value::String(self.src.string()?),
            TypeTag::ByteBuffer => Value::Bytes(self.src.bytes()?),
            TypeTag::ObjectHandle => Value::Handle(ObjectRef::new(self.src.string()?)),
            TypeTag::Date => Value::Date(self.src.string()?.parse::<Date>()?),
            TypeTag::Timestamp => Value::Timestamp(Timestamp::from_unix_seconds(self.src.i64()?)),
            TypeTag::HomogeneousArray => {
                let sub = TypeTag::from_byte(self.src.u8()?)?;
                self.array(sub)?
            }
            // Only ever written after an 'l', but unambiguous on their own.
            TypeTag::DoubleArrayOfArrays
            | TypeTag::SingleArrayOfArrays
            | TypeTag::GenericSequence => self.array(tag)?,
            TypeTag::RowRecord => Value::Row(self.nested(Self::row)?),
            TypeTag::RowSequence => Value::Rows(self.nested(|d| d.repeat(4, Self::row))?),
            TypeTag::ObjectArray => Value::ObjectArray(self.nested(|d| d.repeat(1, Self::value))?),
            TypeTag::AssociativeMap => Value::Map(self.nested(Self::map)?),
        };
        Ok(value)
    }

    fn array(&mut self, sub: TypeTag) -> Result<Value> {
        let value = match sub {
            TypeTag::Int32 => Value::Int32Array(self.repeat(4, |d| d.src.i32())?),
            TypeTag::Int64 => Value::Int64Array(self.repeat(8, |d| d.src.i64())?),
            TypeTag::Double => Value::DoubleArray(self.repeat(8, |d| d.src.f64())?),
            TypeTag::Single => Value::SingleArray(self.repeat(4, |d| d.src.f32())?),
            TypeTag::DoubleArrayOfArrays => Value::DoubleMatrix(
                self.repeat(4, |d| d.repeat(8, |d| d.src.f64()))?,
            ),
            TypeTag::SingleArrayOfArrays => Value::SingleMatrix(
                self.repeat(4, |d| d.repeat(4, |d| d.src.f32()))?,
            ),
            TypeTag::ByteBuffer => Value::BytesArray(self.repeat(4, |d| d.src.bytes())?),
            TypeTag::String => Value::StringArray(self.repeat(4, |d| d.src.string())?),
            TypeTag::ObjectHandle => {
                Value::HandleArray(self.repeat(4, |d| d.src.string().map(ObjectRef::new))?)
            }
            TypeTag::GenericSequence => {
                Value::Sequence(self.nested(|d| d.repeat(1, Self::value))?)
            }
            other => return Err(WireError::UnknownTag(other.byte())),
        };
        Ok(value)
    }

    fn row(&mut self) -> Result<GenericRow> {
        Ok(GenericRow::new(self.repeat(1, Self::value)?))
    }

    /// Keys are compared by their wire bytes, so a decoded map re-encodes
    /// to the same bytes.
    fn map(&mut self) -> Result<ValueMap> {
        let count = self.src.len()?;
        let key_tag = TypeTag::from_byte(self.src.u8()?)?;
        // Every legal key kind reads at least one byte, which bounds the
        // key count by the remaining input.
        if !key_tag.is_map_key() {
            return Err(WireError::InvalidMapKey(key_tag));
        }

        let mut seen = HashSet::new();
        let keys = self.repeat(1, |d| {
            let mark = d.src.mark();
            let key = d.body(key_tag)?;
            if !seen.insert(d.src.consumed_since(&mark)) {
                return Err(WireError::DuplicateMapKey { index: seen.len() });
            }
            Ok(key)
        })?;
        let values = self.repeat(1, Self::value)?;
        if keys.len() != count || values.len() != count {
            return Err(WireError::MalformedFrame {
                length: count as i64,
            });
        }

        Ok(ValueMap::from_unique_entries(
            key_tag,
            keys.into_iter().zip(values).collect(),
        ))
    }

    /// Read a count, then that many elements of at least `min_size` bytes.
    fn repeat<T, F>(&mut self, min_size: usize, mut element: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let count = self.src.len()?;
        let mut items = Vec::with_capacity(self.src.capacity_for(count, min_size));
        for _ in 0..count {
            items.push(element(self)?);
        }
        Ok(items)
    }

    fn nested<T, F>(&mut self, inner: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.depth >= self.max_depth {
            return Err(WireError::NestingTooDeep {
                max: self.max_depth,
            });
        }
        self.depth += 1;
        let result = inner(self);
        self.depth -= 1;
        result
    }
}
