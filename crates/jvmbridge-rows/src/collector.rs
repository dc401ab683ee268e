use std::collections::VecDeque;
use std::io::Read;
use std::iter::FusedIterator;

use crate::error::{Result, RowError};
use crate::pickle::{PickleValue, Unpickler};
use crate::reader::FrameReader;
use crate::row::Row;

/// Lazily turns a framed result stream into rows.
///
/// Frames are read only as rows are demanded. The iterator is fused: after
/// the stream ends or the first error is yielded it returns `None`.
pub struct RowCollector<R, U> {
    reader: FrameReader<R>,
    unpickler: U,
    expand_nested: bool,
    pending: VecDeque<PickleValue>,
    done: bool,
}

impl<R: Read, U: Unpickler> RowCollector<R, U> {
    pub fn new(reader: FrameReader<R>, unpickler: U, expand_nested: bool) -> Self {
        Self {
            reader,
            unpickler,
            expand_nested,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Whether nested row constructors are expanded.
    pub fn expands_nested(&self) -> bool {
        self.expand_nested
    }

    /// Consume the collector and return the frame reader.
    pub fn into_reader(self) -> FrameReader<R> {
        self.reader
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(object) = self.pending.pop_front() {
                return self.finalize(object).map(Some);
            }

            let Some(frame) = self.reader.next_frame()? else {
                return Ok(None);
            };
            let objects = self.unpickler.unpickle(&frame)?;
            tracing::trace!(
                frame_len = frame.len(),
                objects = objects.len(),
                "unpickled result frame"
            );
            self.pending.extend(objects);
        }
    }

    fn finalize(&self, object: PickleValue) -> Result<Row> {
        let mut row = match object {
            PickleValue::Constructor(ctor) => ctor.into_row()?,
            PickleValue::Row(row) => row,
            other => return Err(RowError::UnexpectedObject(other.kind())),
        };
        if self.expand_nested {
            row.expand_nested()?;
        }
        Ok(row)
    }
}

impl<R: Read, U: Unpickler> Iterator for RowCollector<R, U> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "row collection failed");
                self.done = true;
                self.pending.clear();
                Some(Err(err))
            }
        }
    }
}

impl<R: Read, U: Unpickler> FusedIterator for RowCollector<R, U> {}

/// Collect rows from a framed result stream.
///
/// With `expand_nested`, constructors nested inside each row (through row
/// values, lists and tuples) are finalized into rows as well.
pub fn collect<R: Read, U: Unpickler>(
    reader: R,
    unpickler: U,
    expand_nested: bool,
) -> RowCollector<R, U> {
    RowCollector::new(FrameReader::new(reader), unpickler, expand_nested)
}
