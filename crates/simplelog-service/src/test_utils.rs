//! Test utilities for the log service
//!
//! Provides in-memory stand-ins for stdout so tests can observe exactly what
//! the writer emitted.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

use crate::sink::StdoutWriter;
use crate::writer::WriterSettings;
use simplelog_core::ServiceConfig;

/// Cloneable in-memory writer; every clone appends to the same buffer
#[derive(Debug, Clone, Default)]
pub struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl AsyncWrite for CaptureWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        buf.extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Writer whose every write fails, for exercising deferred failures
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingWriter;

impl AsyncWrite for FailingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _data: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Writer settings whose stdout lands in `capture`
pub fn capture_settings(capture: &CaptureWriter) -> WriterSettings {
    let capture = capture.clone();
    WriterSettings::from_config(
        &ServiceConfig::default(),
        Arc::new(move || -> StdoutWriter { Box::new(capture.clone()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_capture_writer_shares_buffer_between_clones() {
        let capture = CaptureWriter::new();
        let mut a = capture.clone();
        let mut b = capture.clone();

        a.write_all(b"one\n").await.unwrap();
        b.write_all(b"two\n").await.unwrap();

        assert_eq!(capture.lines(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_failing_writer_errors() {
        let mut w = FailingWriter;
        assert!(w.write_all(b"x").await.is_err());
    }
}
