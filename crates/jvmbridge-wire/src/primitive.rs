//! Fixed-width and length-prefixed primitives.
//!
//! All multi-byte integers and floats are big-endian, matching the JVM's
//! `DataInputStream` on the receiving side.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Convert an element count or byte length to its `int32` wire form.
pub fn to_wire_len(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| WireError::PayloadTooLarge {
        size: len,
        max: i32::MAX as usize,
    })
}

pub fn put_bool(dst: &mut BytesMut, value: bool) {
    dst.put_u8(u8::from(value));
}

pub fn put_len(dst: &mut BytesMut, len: usize) -> Result<()> {
    dst.put_i32(to_wire_len(len)?);
    Ok(())
}

/// `int32` byte length followed by UTF-8 bytes.
pub fn put_string(dst: &mut BytesMut, value: &str) -> Result<()> {
    put_len(dst, value.len())?;
    dst.put_slice(value.as_bytes());
    Ok(())
}

/// `int32` length followed by raw bytes.
pub fn put_bytes(dst: &mut BytesMut, value: &[u8]) -> Result<()> {
    put_len(dst, value.len())?;
    dst.put_slice(value);
    Ok(())
}

/// Checked reads over an in-memory source.
///
/// Every read verifies the remaining length first and reports
/// `TruncatedPayload` instead of panicking.
pub(crate) struct Cursor {
    buf: Bytes,
}

impl Cursor {
    pub(crate) fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(WireError::TruncatedPayload {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn bool(&mut self) -> Result<bool> {
        Ok(self.u8()? != 0)
    }

    pub(crate) fn i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.buf.get_i32())
    }

    pub(crate) fn i64(&mut self) -> Result<i64> {
        self.need(8)?;
        Ok(self.buf.get_i64())
    }

    pub(crate) fn f32(&mut self) -> Result<f32> {
        self.need(4)?;
        Ok(self.buf.get_f32())
    }

    pub(crate) fn f64(&mut self) -> Result<f64> {
        self.need(8)?;
        Ok(self.buf.get_f64())
    }

    /// A non-negative `int32` count or length.
    pub(crate) fn len(&mut self) -> Result<usize> {
        let raw = self.i32()?;
        usize::try_from(raw).map_err(|_| WireError::MalformedFrame {
            length: i64::from(raw),
        })
    }

    pub(crate) fn bytes(&mut self) -> Result<Bytes> {
        let len = self.len()?;
        self.need(len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    pub(crate) fn string(&mut self) -> Result<String> {
        let raw = self.bytes()?;
        Ok(String::from_utf8(raw.to_vec())?)
    }

    /// Snapshot of the unread input, for [`Cursor::consumed_since`].
    pub(crate) fn mark(&self) -> Bytes {
        self.buf.clone()
    }

    /// The raw bytes read since `mark` was taken.
    pub(crate) fn consumed_since(&self, mark: &Bytes) -> Bytes {
        mark.slice(..mark.len() - self.buf.len())
    }

    /// Capacity hint for `count` elements of at least `min_size` bytes each,
    /// capped by what the source can still hold.
    pub(crate) fn capacity_for(&self, count: usize, min_size: usize) -> usize {
        count.min(self.remaining() / min_size.max(1))
    }
}
