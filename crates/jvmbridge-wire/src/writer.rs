use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::decode::DEFAULT_MAX_PAYLOAD;
use crate::encode::Call;
use crate::error::{Result, WireError};
use crate::value::Value;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Configuration for [`PayloadWriter`].
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Maximum encoded payload size in bytes. Default: 64 MiB.
    pub max_payload_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Writes complete call payloads to any `Write` stream.
///
/// Each call is encoded in full before the first byte reaches the sink, so
/// an encoding error never leaves a partial payload on the stream.
pub struct PayloadWriter<T> {
    inner: T,
    buf: BytesMut,
    config: WriterConfig,
}

impl<T: Write> PayloadWriter<T> {
    /// Create a new payload writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WriterConfig::default())
    }

    /// Create a new payload writer with explicit configuration.
    pub fn with_config(inner: T, config: WriterConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and send a call (blocking).
    pub fn write_call(&mut self, call: &Call<'_>) -> Result<()> {
        self.buf.clear();
        call.encode(&mut self.buf)?;

        if self.buf.len() > self.config.max_payload_size {
            return Err(WireError::PayloadTooLarge {
                size: self.buf.len(),
                max: self.config.max_payload_size,
            });
        }

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(WireError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        self.flush()
    }

    /// Encode and send a call from its parts.
    pub fn send(
        &mut self,
        is_static: bool,
        process_id: i32,
        thread_id: i32,
        target: &str,
        method: &str,
        args: &[Value],
    ) -> Result<()> {
        self.write_call(&Call {
            is_static,
            process_id,
            thread_id,
            target,
            method,
            args,
        })
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::decode::{decode, read_payload, DecoderConfig};
    use crate::tag::TypeTag;
    use crate::value::{GenericRow, ValueMap};

    #[test]
    fn written_bytes_decode() {
        let mut writer = PayloadWriter::new(Cursor::new(Vec::<u8>::new()));
        writer
            .send(true, 1, 2, "org.Cls", "apply", &[Value::Int32(5)])
            .unwrap();

        let wire = writer.into_inner().into_inner();
        let decoded = decode(&mut Bytes::from(wire)).unwrap();
        assert_eq!(decoded.method, "apply");
        assert_eq!(decoded.args, vec![Value::Int32(5)]);
    }

    #[test]
    fn consecutive_calls_stay_framed() {
        let mut writer = PayloadWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(false, 1, 1, "3", "first", &[]).unwrap();
        writer
            .send(false, 1, 1, "3", "second", &[Value::from("x")])
            .unwrap();

        let mut wire = Cursor::new(writer.into_inner().into_inner());
        let config = DecoderConfig::default();
        assert_eq!(read_payload(&mut wire, &config).unwrap().method, "first");
        assert_eq!(read_payload(&mut wire, &config).unwrap().method, "second");
    }

    #[test]
    fn encode_failure_touches_nothing() {
        let mut map = ValueMap::new(TypeTag::String);
        map.insert(GenericRow::default(), 1i32);

        let mut writer = PayloadWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer
            .send(false, 1, 1, "3", "m", &[Value::Map(map)])
            .unwrap_err();
        assert!(matches!(err, WireError::UnsupportedArgumentType { .. }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = WriterConfig {
            max_payload_size: 8,
        };
        let mut writer = PayloadWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);
        let err = writer.send(false, 1, 1, "target", "method", &[]).unwrap_err();
        assert!(matches!(err, WireError::PayloadTooLarge { max: 8, .. }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = PayloadWriter::new(sink);

        writer.send(false, 0, 0, "t", "m", &[]).unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_and_would_block() {
        let sink = FlakyWriter {
            failures: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            data: Vec::new(),
        };
        let mut writer = PayloadWriter::new(sink);
        writer.send(false, 0, 0, "t", "m", &[]).unwrap();

        let inner = writer.into_inner();
        assert!(decode(&mut Bytes::from(inner.data)).is_ok());
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = PayloadWriter::new(ZeroWriter);
        let err = writer.send(false, 0, 0, "t", "m", &[]).unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = PayloadWriter::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(writer.config().max_payload_size, DEFAULT_MAX_PAYLOAD);
        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails with each queued error kind once, then writes a byte at a time.
    struct FlakyWriter {
        failures: Vec<ErrorKind>,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.failures.pop() {
                return Err(std::io::Error::from(kind));
            }
            self.data.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
