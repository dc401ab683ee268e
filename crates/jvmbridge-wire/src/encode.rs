//! Call payload encoding.
//!
//! ```text
//! CallPayload := totalLength:int32 isStatic:bool pid:int32 tid:int32
//!                target:String method:String argCount:int32 arg[argCount]
//! arg         := 'n' | tag payload
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::framer::{write_each, write_sized};
use crate::primitive::{put_bool, put_bytes, put_len, put_string};
use crate::value::{GenericRow, Value, ValueMap};

/// A method call to encode.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    /// True when `target` names a class rather than an object handle.
    pub is_static: bool,
    pub process_id: i32,
    pub thread_id: i32,
    /// Class name for static calls, object handle id otherwise.
    pub target: &'a str,
    pub method: &'a str,
    pub args: &'a [Value],
}

impl Call<'_> {
    /// Append the encoded call to `dst`.
    ///
    /// On error `dst` is restored to its previous length, so no partial
    /// header, tag or argument is ever left behind.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        match self.encode_unchecked(dst) {
            Ok(size) => {
                tracing::debug!(
                    call_target = self.target,
                    method = self.method,
                    args = self.args.len(),
                    total_length = size,
                    "encoded call payload"
                );
                Ok(())
            }
            Err(err) => {
                dst.truncate(start);
                Err(err)
            }
        }
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode(&mut dst)?;
        Ok(dst.freeze())
    }

    fn encode_unchecked(&self, dst: &mut BytesMut) -> Result<usize> {
        write_sized(dst, |dst| {
            put_bool(dst, self.is_static);
            dst.put_i32(self.process_id);
            dst.put_i32(self.thread_id);
            put_string(dst, self.target)?;
            put_string(dst, self.method)?;
            put_len(dst, self.args.len())?;
            for arg in self.args {
                write_value(dst, arg, true)?;
            }
            Ok(())
        })
    }
}

/// Encode a call into `dst`.
pub fn encode(
    dst: &mut BytesMut,
    is_static: bool,
    process_id: i32,
    thread_id: i32,
    target: &str,
    method: &str,
    args: &[Value],
) -> Result<()> {
    Call {
        is_static,
        process_id,
        thread_id,
        target,
        method,
        args,
    }
    .encode(dst)
}

/// Encode a call into a fresh buffer.
pub fn encode_to_bytes(
    is_static: bool,
    process_id: i32,
    thread_id: i32,
    target: &str,
    method: &str,
    args: &[Value],
) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    encode(
        &mut dst, is_static, process_id, thread_id, target, method, args,
    )?;
    Ok(dst.freeze())
}

/// Encode one value.
///
/// Null is always written as a bare `'n'`, even when `with_tag` is false.
/// Map keys are the only values written without their tag. On error `dst`
/// is left as it was, even when the failure is nested deep inside `value`.
pub fn encode_value(dst: &mut BytesMut, value: &Value, with_tag: bool) -> Result<()> {
    let start = dst.len();
    let result = write_value(dst, value, with_tag);
    if result.is_err() {
        dst.truncate(start);
    }
    result
}

fn write_value(dst: &mut BytesMut, value: &Value, with_tag: bool) -> Result<()> {
    let value = value.normalized();
    let value = value.as_ref();

    // Validate before the tag goes out.
    if let Value::Map(map) = value {
        map.check_keys()?;
    }

    let tag = value.tag();
    if with_tag || value.is_null() {
        dst.put_u8(tag.byte());
    }
    tracing::trace!(tag = %tag, with_tag, "encoding value");

    match value {
        Value::Null => {}
        Value::Int32(v) => dst.put_i32(*v),
        Value::Int64(v) => dst.put_i64(*v),
        Value::Bool(v) => put_bool(dst, *v),
        Value::Double(v) => dst.put_f64(*v),
        Value::Single(v) => dst.put_f32(*v),
        Value::String(v) => put_string(dst, v)?,
        Value::Bytes(v) => put_bytes(dst, v)?,
        Value::Handle(v) => put_string(dst, v.id())?,
        Value::Date(v) => put_string(dst, &v.to_string())?,
        Value::Timestamp(v) => dst.put_i64(v.unix_seconds()),
        Value::Row(row) => encode_row(dst, row)?,
        Value::Rows(rows) => {
            write_each(dst, rows, encode_row)?;
        }
        Value::ObjectArray(items) => {
            write_each(dst, items, |dst, item| write_value(dst, item, true))?;
        }
        Value::Map(map) => encode_map(dst, map)?,
        array => encode_array(dst, array)?,
    }
    Ok(())
}

/// Sub-tag, count, then untagged elements. Generic sequences are the
/// exception: every element carries its own tag.
fn encode_array(dst: &mut BytesMut, value: &Value) -> Result<()> {
    if let Some(sub) = value.element_tag() {
        dst.put_u8(sub.byte());
    }
    match value {
        Value::Int32Array(items) => {
            put_len(dst, items.len())?;
            items.iter().for_each(|v| dst.put_i32(*v));
        }
        Value::Int64Array(items) => {
            put_len(dst, items.len())?;
            items.iter().for_each(|v| dst.put_i64(*v));
        }
        Value::DoubleArray(items) => {
            put_len(dst, items.len())?;
            items.iter().for_each(|v| dst.put_f64(*v));
        }
        Value::SingleArray(items) => {
            put_len(dst, items.len())?;
            items.iter().for_each(|v| dst.put_f32(*v));
        }
        Value::DoubleMatrix(rows) => {
            put_len(dst, rows.len())?;
            for row in rows {
                put_len(dst, row.len())?;
                row.iter().for_each(|v| dst.put_f64(*v));
            }
        }
        Value::SingleMatrix(rows) => {
            put_len(dst, rows.len())?;
            for row in rows {
                put_len(dst, row.len())?;
                row.iter().for_each(|v| dst.put_f32(*v));
            }
        }
        Value::BytesArray(items) => {
            write_each(dst, items, |dst, b| put_bytes(dst, b))?;
        }
        Value::StringArray(items) => {
            write_each(dst, items, |dst, s| put_string(dst, s))?;
        }
        Value::HandleArray(items) => {
            write_each(dst, items, |dst, h| put_string(dst, h.id()))?;
        }
        Value::Sequence(items) => {
            write_each(dst, items, |dst, item| write_value(dst, item, true))?;
        }
        other => {
            return Err(WireError::unsupported(other.tag(), "not an array value"));
        }
    }
    Ok(())
}

fn encode_row(dst: &mut BytesMut, row: &GenericRow) -> Result<()> {
    put_len(dst, row.len())?;
    for field in row.values() {
        write_value(dst, field, true)?;
    }
    Ok(())
}

/// Count, key tag, count, untagged keys, count, tagged values.
fn encode_map(dst: &mut BytesMut, map: &ValueMap) -> Result<()> {
    put_len(dst, map.len())?;
    dst.put_u8(map.key_tag().byte());
    put_len(dst, map.len())?;
    for key in map.keys() {
        write_value(dst, key, false)?;
    }
    put_len(dst, map.len())?;
    for value in map.values() {
        write_value(dst, value, true)?;
    }
    Ok(())
}
