//! Caller-facing log service handle
//!
//! A thin façade over the controller. Lifecycle guards run here, before any
//! request reaches the writer, so a call in the wrong phase never sends into
//! a channel without a receiver.

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncWrite;

use simplelog_core::prelude::*;
use simplelog_core::{LogMessage, ServiceConfig, ServiceState, Target};

use crate::controller::{spawn_controller, ControllerHandle};
use crate::protocol::Action;
use crate::sink::StdoutWriter;
use crate::writer::WriterSettings;

/// Handle to one log service instance
///
/// Cheap to clone; all clones drive the same controller. Must be created
/// inside a tokio runtime.
#[derive(Clone, Debug)]
pub struct LogService {
    controller: ControllerHandle,
}

impl LogService {
    /// Service writing to the process stdout with default settings
    pub fn new() -> Self {
        Self::with_config(&ServiceConfig::default())
    }

    /// Service writing to the process stdout
    pub fn with_config(config: &ServiceConfig) -> Self {
        Self::with_stdout(config, tokio::io::stdout)
    }

    /// Service whose stdout target is produced by `make_stdout`
    ///
    /// `make_stdout` is called once per startup.
    pub fn with_stdout<W, F>(config: &ServiceConfig, make_stdout: F) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        F: Fn() -> W + Send + Sync + 'static,
    {
        let make = Arc::new(move || -> StdoutWriter { Box::new(make_stdout()) });
        let settings = WriterSettings::from_config(config, make);
        Self {
            controller: spawn_controller(settings),
        }
    }

    /// Start a service and open the configured log file, if any
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        let service = Self::with_config(config);
        service.startup(config.buffer_capacity).await?;
        if let Some(path) = &config.log_file {
            if let Err(e) = service.init_log_file(path).await {
                // Do not leave a half-configured writer behind
                let _ = service.shutdown().await;
                return Err(e);
            }
        }
        Ok(service)
    }

    /// Start the writer; `capacity` records can queue before writers wait
    pub async fn startup(&self, capacity: usize) -> Result<()> {
        if self.controller.check_state(ServiceState::Running).await? {
            return Err(Error::AlreadyRunning);
        }
        self.controller
            .service(Action::Start { capacity })
            .await
            .context("log service startup")
    }

    /// Write all pending records, close the log file and stop the writer
    pub async fn shutdown(&self) -> Result<()> {
        if !self.controller.check_state(ServiceState::Running).await? {
            return Err(Error::NotRunning);
        }
        self.controller.service(Action::Stop).await
    }

    /// Open or create `path` for appended writes
    pub async fn init_log_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.require_running().await?;
        self.controller
            .service(Action::InitLog {
                path: path.as_ref().to_path_buf(),
            })
            .await
    }

    /// Flush and close the current log file, then continue in `path`
    ///
    /// Every record enqueued before this call lands in the old file.
    pub async fn switch_log_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.require_running().await?;
        self.controller
            .service(Action::SwitchLog {
                path: path.as_ref().to_path_buf(),
            })
            .await
    }

    /// Put `prefix` in front of every line written to `target`
    pub async fn set_prefix(&self, target: Target, prefix: impl Into<String>) -> Result<()> {
        self.require_running().await?;
        self.controller
            .service(Action::SetPrefix {
                target,
                prefix: prefix.into(),
            })
            .await
    }

    /// Enqueue one record; waits while the message channel is full
    pub async fn write(&self, target: Target, payload: impl Into<String>) -> Result<()> {
        let message = LogMessage::new(target, payload);
        let sender = self.controller.producer(target).await?;
        // The writer closes the channel when it starts draining for a stop
        sender.send(message).await.map_err(|_| Error::NotRunning)
    }

    /// Like [`write`](Self::write), but only when `condition` holds
    pub async fn write_if(
        &self,
        condition: bool,
        target: Target,
        payload: impl Into<String>,
    ) -> Result<()> {
        if !condition {
            return Ok(());
        }
        self.write(target, payload).await
    }

    pub async fn is_running(&self) -> bool {
        self.controller
            .check_state(ServiceState::Running)
            .await
            .unwrap_or(false)
    }

    pub async fn state(&self) -> Result<ServiceState> {
        self.controller.state().await
    }

    /// Lower-level handle to the controller
    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    async fn require_running(&self) -> Result<()> {
        if self.controller.check_state(ServiceState::Running).await? {
            Ok(())
        } else {
            Err(Error::NotRunning)
        }
    }
}

impl Default for LogService {
    fn default() -> Self {
        Self::new()
    }
}
