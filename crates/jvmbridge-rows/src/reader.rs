use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::error::{Result, RowError};

/// Default maximum frame size (256 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 256 * 1024 * 1024;

const LENGTH_PREFIX: usize = 4;

/// Configuration for reading a row result stream.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Maximum accepted frame body size in bytes. Default: 256 MiB.
    pub max_frame_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Reads length-prefixed frames from a result stream.
///
/// Each frame is a big-endian `i32` length followed by that many bytes.
/// A zero length, or end of stream before a length, ends the stream.
pub struct FrameReader<R> {
    inner: R,
    config: CollectorConfig,
    finished: bool,
}

impl<R: Read> FrameReader<R> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, CollectorConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: R, config: CollectorConfig) -> Self {
        Self {
            inner,
            config,
            finished: false,
        }
    }

    /// Read the next frame body (blocking).
    ///
    /// Returns `Ok(None)` once the stream has ended; later calls keep
    /// returning `Ok(None)` without touching the stream.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX];
        let got = fill(&mut self.inner, &mut prefix)?;
        if got == 0 {
            tracing::trace!("result stream ended without terminator");
            self.finished = true;
            return Ok(None);
        }
        if got < LENGTH_PREFIX {
            return Err(RowError::TruncatedPayload {
                needed: LENGTH_PREFIX,
                got,
            });
        }

        let length = i32::from_be_bytes(prefix);
        if length < 0 {
            return Err(RowError::MalformedFrame { length });
        }
        if length == 0 {
            tracing::trace!("result stream terminator");
            self.finished = true;
            return Ok(None);
        }

        let size = length as usize;
        if size > self.config.max_frame_size {
            return Err(RowError::FrameTooLarge {
                size,
                max: self.config.max_frame_size,
            });
        }

        let mut body = BytesMut::zeroed(size);
        let got = fill(&mut self.inner, &mut body)?;
        if got < size {
            return Err(RowError::TruncatedPayload { needed: size, got });
        }

        tracing::trace!(frame_len = size, "read result frame");
        Ok(Some(body.freeze()))
    }

    /// Whether the end of the stream has been reached.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }
}

/// Read until `buf` is full or the stream ends, returning the bytes read.
fn fill<R: Read>(inner: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(RowError::Io(err)),
        }
    }
    Ok(filled)
}
