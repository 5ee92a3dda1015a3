//! Writer actor
//!
//! The only task that touches output handles. It owns the stdout sink and the
//! optional file sink, processes records and config requests in arrival
//! order, and reports `Running`/`Stopped` back to the controller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use simplelog_core::format::archive_path;
use simplelog_core::prelude::*;
use simplelog_core::{LogMessage, ServiceState, Sink, Target};

use crate::controller::ControllerHandle;
use crate::protocol::{ConfigKind, ConfigRequest, WriterChannels};
use crate::sink::{FileSink, LineSink, StdoutSink, StdoutWriter};

/// Creates the stdout handle for each writer lifetime
pub type MakeStdout = Arc<dyn Fn() -> StdoutWriter + Send + Sync>;

/// Settings a writer is spawned with
#[derive(Clone)]
pub struct WriterSettings {
    pub flush_interval: Duration,
    pub stdout_prefix: String,
    pub file_prefix: String,
    pub archive_on_switch: bool,
    pub make_stdout: MakeStdout,
}

impl WriterSettings {
    pub fn from_config(config: &simplelog_core::ServiceConfig, make_stdout: MakeStdout) -> Self {
        Self {
            flush_interval: config.flush_interval(),
            stdout_prefix: config.stdout_prefix.clone(),
            file_prefix: config.file_prefix.clone(),
            archive_on_switch: config.archive_on_switch,
            make_stdout,
        }
    }
}

impl std::fmt::Debug for WriterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSettings")
            .field("flush_interval", &self.flush_interval)
            .field("stdout_prefix", &self.stdout_prefix)
            .field("file_prefix", &self.file_prefix)
            .field("archive_on_switch", &self.archive_on_switch)
            .finish_non_exhaustive()
    }
}

/// State owned by one running writer task
pub(crate) struct Writer {
    stdout: StdoutSink,
    file: Option<FileSink>,
    file_prefix: String,
    flush_interval: Duration,
    controller: ControllerHandle,
    /// Lifetime tag for file readiness reports
    generation: u64,
    /// File records that arrived while no file was open
    dropped: usize,
    /// First write/flush/close failure, returned when the writer stops
    failure: Option<Error>,
}

impl Writer {
    pub fn new(settings: &WriterSettings, controller: ControllerHandle, generation: u64) -> Self {
        Self {
            stdout: StdoutSink::new((settings.make_stdout)(), settings.stdout_prefix.clone()),
            file: None,
            file_prefix: settings.file_prefix.clone(),
            flush_interval: settings.flush_interval,
            controller,
            generation,
            dropped: 0,
            failure: None,
        }
    }

    /// Service loop; returns the first deferred I/O failure, if any
    pub async fn run(mut self, mut channels: WriterChannels) -> Result<()> {
        if let Err(e) = self.controller.set_state(ServiceState::Running).await {
            warn!("Writer could not report Running: {}", e);
        }
        info!("Log writer running");

        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // A dropped stop sender also ends the loop
                _ = &mut channels.stop => {
                    debug!("Stop signal received");
                    break;
                }
                Some(message) = channels.messages.recv() => {
                    self.write_message(message).await;
                }
                Some(request) = channels.configs.recv() => {
                    self.handle_config(request, &mut channels.messages).await;
                }
                _ = ticker.tick() => {
                    self.flush_file().await;
                }
            }
        }

        self.finish(channels).await
    }

    /// Route one record to every sink of its target
    async fn write_message(&mut self, message: LogMessage) {
        for sink in message.target().sinks() {
            let result = match sink {
                Sink::Stdout => self.stdout.write_line(message.payload()).await,
                Sink::File => match self.file.as_mut() {
                    Some(file) => file.write_line(message.payload()).await,
                    None => {
                        if self.dropped == 0 {
                            warn!("Dropping {} records, no log file is open", message.target());
                        }
                        self.dropped += 1;
                        continue;
                    }
                },
            };
            if let Err(e) = result {
                self.record_failure(e);
            }
        }
    }

    async fn handle_config(
        &mut self,
        request: ConfigRequest,
        messages: &mut mpsc::Receiver<LogMessage>,
    ) {
        let ConfigRequest { kind, ack } = request;
        let affects_file = kind.affects_file();
        let result = match kind {
            ConfigKind::InitLog { path } => self.open_file(&path).await,
            ConfigKind::SwitchLog { path, archive } => {
                self.switch_file(&path, archive, messages).await
            }
            ConfigKind::SetPrefix { target, prefix } => {
                self.set_prefix(target, prefix);
                Ok(())
            }
        };

        if affects_file {
            // Lands ahead of the ack, so the caller's next write sees it
            let ready = self.file.is_some();
            if let Err(e) = self.controller.report_file(self.generation, ready).await {
                warn!("Writer could not report file state: {}", e);
            }
        }

        if ack.send(result).is_err() {
            debug!("Config requester went away before the ack");
        }
    }

    /// Open `path`, closing any file that is already open
    async fn open_file(&mut self, path: &Path) -> Result<()> {
        self.close_file().await?;
        self.file = Some(FileSink::open(path, self.file_prefix.clone()).await?);
        info!("Log file initialized: {}", path.display());
        Ok(())
    }

    /// Drain queued records into the current file, close it, open `path`
    async fn switch_file(
        &mut self,
        path: &Path,
        archive: bool,
        messages: &mut mpsc::Receiver<LogMessage>,
    ) -> Result<()> {
        self.drain_queued(messages).await;

        let old_path = self.close_file().await?;
        if archive {
            if let Some(old) = old_path {
                archive_file(&old).await?;
            }
        }

        self.file = Some(FileSink::open(path, self.file_prefix.clone()).await?);
        info!("Switched log file to {}", path.display());
        Ok(())
    }

    fn set_prefix(&mut self, target: Target, prefix: String) {
        for sink in target.sinks() {
            match sink {
                Sink::Stdout => self.stdout.set_prefix(prefix.clone()),
                Sink::File => {
                    self.file_prefix = prefix.clone();
                    if let Some(file) = self.file.as_mut() {
                        file.set_prefix(prefix.clone());
                    }
                }
            }
        }
    }

    /// Write every record currently sitting in the channel
    async fn drain_queued(&mut self, messages: &mut mpsc::Receiver<LogMessage>) {
        while let Ok(message) = messages.try_recv() {
            self.write_message(message).await;
        }
    }

    /// Flush and close the file, returning the path it was bound to
    async fn close_file(&mut self) -> Result<Option<PathBuf>> {
        match self.file.take() {
            Some(file) => {
                let path = file.path().to_path_buf();
                file.close().await?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }

    async fn flush_file(&mut self) {
        let result = match self.file.as_mut() {
            Some(file) if file.has_buffered() => file.flush().await,
            _ => return,
        };
        if let Err(e) = result {
            self.record_failure(e);
        }
    }

    fn record_failure(&mut self, err: Error) {
        error!("Log write failed: {}", err);
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    /// Drain, release handles, then report `Stopped` as the very last step
    async fn finish(mut self, mut channels: WriterChannels) -> Result<()> {
        // Senders racing the shutdown get an error instead of losing records
        channels.messages.close();
        let mut drained = 0usize;
        while let Some(message) = channels.messages.recv().await {
            self.write_message(message).await;
            drained += 1;
        }
        debug!("Drained {} pending records", drained);

        if self.dropped > 0 {
            self.record_failure(Error::RecordsDropped {
                count: self.dropped,
            });
        }

        channels.configs.close();
        while let Some(request) = channels.configs.recv().await {
            let _ = request.ack.send(Err(Error::Stopping));
        }

        if let Err(e) = self.close_file().await {
            self.record_failure(e);
        }
        if let Err(e) = self.stdout.flush().await {
            self.record_failure(e);
        }

        let outcome = match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        };

        info!("Log writer stopped");
        if let Err(e) = self.controller.set_state(ServiceState::Stopped).await {
            warn!("Writer could not report Stopped: {}", e);
        }
        outcome
    }
}

/// Rename a closed log file to `<name>_<yyyymmddHHMMSS>`
async fn archive_file(path: &Path) -> Result<()> {
    let archived = archive_path(path, Local::now());
    tokio::fs::rename(path, &archived)
        .await
        .map_err(|e| Error::resource(path, e))?;
    info!("Archived {} as {}", path.display(), archived.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_archive_file_renames_with_timestamp_suffix() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("old.log");
        std::fs::write(&path, "data\n").unwrap();

        archive_file(&path).await.unwrap();

        assert!(!path.exists());
        let archived: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(archived.len(), 1);
        assert!(archived[0].starts_with("old.log_"));
        assert_eq!(archived[0].len(), "old.log_".len() + 14);
    }

    #[tokio::test]
    async fn test_file_records_without_file_fail_the_stop() {
        use crate::controller::spawn_controller;
        use crate::protocol::writer_channels;
        use crate::test_utils::{capture_settings, CaptureWriter};

        let capture = CaptureWriter::new();
        let settings = capture_settings(&capture);
        let controller = spawn_controller(settings.clone());
        let mut writer = Writer::new(&settings, controller, 1);

        writer
            .write_message(LogMessage::new(Target::Multi, "stdout half"))
            .await;
        writer.write_message(LogMessage::new(Target::File, "lost")).await;

        let (_link, channels) = writer_channels(1);
        let err = writer.finish(channels).await.unwrap_err();
        assert!(matches!(err, Error::RecordsDropped { count: 2 }));
        assert_eq!(capture.lines(), vec!["stdout half"]);
    }

    #[tokio::test]
    async fn test_archive_missing_file_is_resource_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = archive_file(&temp.path().join("nope.log")).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
