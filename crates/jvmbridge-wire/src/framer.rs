//! Reserve-then-backpatch length prefixes.
//!
//! Sequences whose element count is only known after they have been walked
//! are written as a zeroed `int32` slot, the elements, and then the count
//! patched into the slot. The destination is a growable in-memory buffer,
//! so nothing downstream has to be seekable.

use bytes::{BufMut, BytesMut};

use crate::error::Result;
use crate::primitive::to_wire_len;

const SLOT_SIZE: usize = 4;

/// Element sink handed to a framed producer.
///
/// Each successful [`Elements::push`] counts as exactly one element,
/// whatever number of bytes it wrote.
pub struct Elements<'a> {
    dst: &'a mut BytesMut,
    count: usize,
}

impl Elements<'_> {
    /// Write one element.
    pub fn push<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&mut BytesMut) -> Result<()>,
    {
        write(self.dst)?;
        self.count += 1;
        Ok(())
    }

    /// Elements written so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Write an element-count-prefixed sequence.
///
/// Returns the number of elements written. Producers may open further
/// framed sequences on the buffer they are handed.
pub fn write_counted<F>(dst: &mut BytesMut, produce: F) -> Result<usize>
where
    F: FnOnce(&mut Elements<'_>) -> Result<()>,
{
    let slot = reserve_slot(dst);
    let mut elements = Elements {
        dst: &mut *dst,
        count: 0,
    };
    produce(&mut elements)?;
    let count = elements.count;
    patch_slot(dst, slot, to_wire_len(count)?);
    Ok(count)
}

/// Write each item of `items` as one element.
pub fn write_each<I, F>(dst: &mut BytesMut, items: I, mut write: F) -> Result<usize>
where
    I: IntoIterator,
    F: FnMut(&mut BytesMut, I::Item) -> Result<()>,
{
    write_counted(dst, |elements| {
        for item in items {
            elements.push(|dst| write(dst, item))?;
        }
        Ok(())
    })
}

/// Write a byte-length-prefixed block.
///
/// The prefix holds the number of bytes `produce` appended, excluding the
/// prefix itself.
pub fn write_sized<F>(dst: &mut BytesMut, produce: F) -> Result<usize>
where
    F: FnOnce(&mut BytesMut) -> Result<()>,
{
    let slot = reserve_slot(dst);
    produce(dst)?;
    let size = dst.len() - slot - SLOT_SIZE;
    patch_slot(dst, slot, to_wire_len(size)?);
    Ok(size)
}

fn reserve_slot(dst: &mut BytesMut) -> usize {
    let slot = dst.len();
    dst.put_i32(0);
    slot
}

fn patch_slot(dst: &mut BytesMut, slot: usize, value: i32) {
    dst[slot..slot + SLOT_SIZE].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;

    fn slot_at(buf: &[u8], at: usize) -> i32 {
        i32::from_be_bytes(buf[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn count_matches_pushes_not_bytes() {
        let mut dst = BytesMut::new();
        let count = write_counted(&mut dst, |elements| {
            elements.push(|dst| {
                dst.put_slice(b"abcdef");
                Ok(())
            })?;
            elements.push(|_| Ok(()))?;
            elements.push(|dst| {
                dst.put_u8(1);
                Ok(())
            })
        })
        .unwrap();

        assert_eq!(count, 3);
        assert_eq!(slot_at(&dst, 0), 3);
        assert_eq!(dst.len(), 4 + 7);
    }

    #[test]
    fn empty_sequence_writes_zero() {
        let mut dst = BytesMut::new();
        let count = write_counted(&mut dst, |_| Ok(())).unwrap();
        assert_eq!(count, 0);
        assert_eq!(dst.as_ref(), &[0, 0, 0, 0]);
    }

    #[test]
    fn nested_frames_patch_their_own_slots() {
        let mut dst = BytesMut::new();
        dst.put_u8(0xAA);

        write_each(&mut dst, [2usize, 0, 5], |dst, inner| {
            write_each(dst, 0..inner, |dst, i| {
                dst.put_u8(i as u8);
                Ok(())
            })
            .map(|_| ())
        })
        .unwrap();

        assert_eq!(dst[0], 0xAA);
        assert_eq!(slot_at(&dst, 1), 3);
        assert_eq!(slot_at(&dst, 5), 2);
        assert_eq!(&dst[9..11], &[0, 1]);
        assert_eq!(slot_at(&dst, 11), 0);
        assert_eq!(slot_at(&dst, 15), 5);
        assert_eq!(&dst[19..], &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn sized_block_excludes_prefix() {
        let mut dst = BytesMut::new();
        let size = write_sized(&mut dst, |dst| {
            dst.put_slice(b"payload");
            Ok(())
        })
        .unwrap();
        assert_eq!(size, 7);
        assert_eq!(slot_at(&dst, 0), 7);
        assert_eq!(slot_at(&dst, 0) as usize, dst.len() - 4);
    }

    #[test]
    fn producer_error_propagates() {
        let mut dst = BytesMut::new();
        let err = write_counted(&mut dst, |elements| {
            elements.push(|_| Ok(()))?;
            elements.push(|_| Err(WireError::ConnectionClosed))
        })
        .unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }
}
