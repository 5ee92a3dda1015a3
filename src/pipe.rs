//! Pipe input lines into a running log service
//!
//! This is what the `simplelog` binary does: every line read from the input
//! becomes one record for the chosen target.

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::oneshot;

use simplelog_core::prelude::*;
use simplelog_core::{ServiceConfig, Target};
use simplelog_service::LogService;

/// What to do with the piped input
#[derive(Debug, Clone)]
pub struct PipeOptions {
    pub target: Target,
    /// Log file to switch to once the input is exhausted
    pub switch_to: Option<PathBuf>,
}

impl Default for PipeOptions {
    fn default() -> Self {
        Self {
            target: Target::Stdout,
            switch_to: None,
        }
    }
}

/// Write every line of `input` as one record; returns the number written
pub async fn pipe_lines<R>(service: &LogService, input: R, target: Target) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await? {
        service.write(target, line).await?;
        count += 1;
    }
    Ok(count)
}

/// Start `service`, pipe `input` until EOF or `quit`, then shut down
pub async fn run_pipe<R>(
    service: &LogService,
    config: &ServiceConfig,
    options: &PipeOptions,
    input: R,
    quit: oneshot::Receiver<()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    if options.target.needs_file() && config.log_file.is_none() {
        return Err(Error::LogFileNotInitialized);
    }

    service.startup(config.buffer_capacity).await?;
    if let Some(path) = &config.log_file {
        if let Err(e) = service.init_log_file(path).await {
            let _ = service.shutdown().await;
            return Err(e);
        }
    }

    let piped = tokio::select! {
        result = pipe_lines(service, input, options.target) => result,
        // A dropped sender means no signal will ever come
        Ok(()) = quit => {
            info!("Interrupted, shutting down");
            Ok(0)
        }
    };

    // Shut down even if piping failed, so queued records still land
    let switched = match (&piped, &options.switch_to) {
        (Ok(_), Some(path)) => service.switch_log_file(path).await,
        _ => Ok(()),
    };
    let stopped = service.shutdown().await;

    let count = piped?;
    switched?;
    stopped?;
    debug!("Piped {} records", count);
    Ok(())
}
