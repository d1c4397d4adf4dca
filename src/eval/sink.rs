//! Dual-write sink for container output
//!
//! Everything written is kept in an in-memory buffer and also forwarded to a
//! live consumer, usually the console.

use std::fmt;
use std::io::{self, Write};

use tracing::debug;

pub struct StreamSink {
    buf: Vec<u8>,
    forward: Box<dyn Write + Send>,
}

impl StreamSink {
    pub fn new(forward: Box<dyn Write + Send>) -> Self {
        Self {
            buf: Vec::new(),
            forward,
        }
    }

    /// Forward to the process's stdout
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Capture only
    pub fn capture() -> Self {
        Self::new(Box::new(io::sink()))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Write for StreamSink {
    /// The capture buffer always takes the whole chunk; a failing live
    /// consumer does not lose output.
    fn write(&mut self, p: &[u8]) -> io::Result<usize> {
        if let Err(e) = self.forward.write_all(p) {
            debug!(error = %e, "live output consumer rejected write");
        }
        self.buf.extend_from_slice(p);
        Ok(p.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Err(e) = self.forward.flush() {
            debug!(error = %e, "live output consumer failed to flush");
        }
        Ok(())
    }
}

impl fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink")
            .field("buffered", &self.buf.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Shared writer so the test can look at what was forwarded
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, p: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(p);
            Ok(p.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_sink_write() {
        let writer = Shared::default();
        let mut sink = StreamSink::new(Box::new(writer.clone()));

        let n = sink.write(b"banana banana").unwrap();
        assert_eq!(n, 13);
        assert_eq!(sink.into_bytes(), b"banana banana");
        assert_eq!(writer.0.lock().unwrap().as_slice(), b"banana banana");
    }

    #[test]
    fn test_sink_write_fmt() {
        let writer = Shared::default();
        let mut sink = StreamSink::new(Box::new(writer.clone()));

        write!(sink, "banana {}", "banana").unwrap();
        assert_eq!(sink.into_bytes(), b"banana banana");
        assert_eq!(writer.0.lock().unwrap().as_slice(), b"banana banana");
    }

    #[test]
    fn test_sink_keeps_output_when_consumer_fails() {
        let mut sink = StreamSink::new(Box::new(Broken));
        sink.write_all(b"still here").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.into_bytes(), b"still here");
    }
}
