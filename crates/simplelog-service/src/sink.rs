//! Output sinks owned by the writer
//!
//! A [`Target`](simplelog_core::Target) expands to one or more sinks; each
//! sink knows how to render and emit a single record line.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use simplelog_core::format::{file_line, stdout_line};
use simplelog_core::prelude::*;

/// Capacity of the file write buffer
pub const FILE_BUFFER_SIZE: usize = 16 * 1024;

/// Boxed writer used as the stdout handle
pub type StdoutWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A destination for rendered record lines
#[trait_variant::make(LineSink: Send)]
pub trait LocalLineSink {
    /// Render `payload` and write it as one line
    async fn write_line(&mut self, payload: &str) -> Result<()>;

    /// Push buffered output to the underlying handle
    async fn flush(&mut self) -> Result<()>;

    /// Replace the prefix put in front of every line
    fn set_prefix(&mut self, prefix: String);
}

/// Writes untimestamped lines to stdout (or an injected stand-in)
pub struct StdoutSink {
    out: StdoutWriter,
    prefix: String,
}

impl StdoutSink {
    pub fn new(out: StdoutWriter, prefix: impl Into<String>) -> Self {
        Self {
            out,
            prefix: prefix.into(),
        }
    }
}

impl LineSink for StdoutSink {
    async fn write_line(&mut self, payload: &str) -> Result<()> {
        let line = stdout_line(&self.prefix, payload);
        self.out.write_all(line.as_bytes()).await?;
        // Stdout records are visible as soon as they are processed
        self.out.flush().await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.out.flush().await?;
        Ok(())
    }

    fn set_prefix(&mut self, prefix: String) {
        self.prefix = prefix;
    }
}

/// Writes timestamped lines to a log file through a write buffer
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    prefix: String,
    /// A blank separator line goes out before the first record after (re)open
    separator_pending: bool,
}

impl FileSink {
    /// Open or create `path` for appending
    pub async fn open(path: &Path, prefix: impl Into<String>) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.append(true).create(true).write(true);
        #[cfg(unix)]
        options.mode(0o644);

        let file = options
            .open(path)
            .await
            .map_err(|e| Error::resource(path, e))?;

        debug!("Opened log file {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(FILE_BUFFER_SIZE, file),
            prefix: prefix.into(),
            separator_pending: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the write buffer holds data not yet handed to the file
    pub fn has_buffered(&self) -> bool {
        !self.writer.buffer().is_empty()
    }

    /// Flush everything and release the handle
    pub async fn close(mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| Error::resource(&self.path, e))?;
        let file = self.writer.into_inner();
        file.sync_all()
            .await
            .map_err(|e| Error::resource(&self.path, e))?;
        debug!("Closed log file {}", self.path.display());
        Ok(())
    }
}

impl LineSink for FileSink {
    async fn write_line(&mut self, payload: &str) -> Result<()> {
        if self.separator_pending {
            self.writer
                .write_all(b"\n")
                .await
                .map_err(|e| Error::resource(&self.path, e))?;
            self.separator_pending = false;
        }

        let line = file_line(&self.prefix, Local::now(), payload);
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::resource(&self.path, e))
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| Error::resource(&self.path, e))
    }

    fn set_prefix(&mut self, prefix: String) {
        self.prefix = prefix;
    }
}
