//! Messages exchanged between callers, the controller and the writer

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use simplelog_core::prelude::*;
use simplelog_core::{LogMessage, ServiceState, Target};

/// Lifecycle or structural action served by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Spawn the writer with a message channel of `capacity`
    Start { capacity: usize },
    /// Drain and stop the writer
    Stop,
    /// Open the log file
    InitLog { path: PathBuf },
    /// Flush and close the current log file, then open `path`
    SwitchLog { path: PathBuf },
    /// Change the line prefix of a target
    SetPrefix { target: Target, prefix: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start { .. } => "start",
            Action::Stop => "stop",
            Action::InitLog { .. } => "init-log",
            Action::SwitchLog { .. } => "switch-log",
            Action::SetPrefix { .. } => "set-prefix",
        }
    }
}

/// Requests served by the controller's event loop
#[derive(Debug)]
pub(crate) enum ControlRequest {
    Action {
        action: Action,
        reply: oneshot::Sender<Result<()>>,
    },
    CheckState {
        state: ServiceState,
        reply: oneshot::Sender<bool>,
    },
    GetState {
        reply: oneshot::Sender<ServiceState>,
    },
    /// Sent by the writer; no reply
    SetState { state: ServiceState },
    /// Resolves `reply` once the service reaches `state`
    WaitFor {
        state: ServiceState,
        reply: oneshot::Sender<()>,
    },
    /// Hand out the message channel after checking the target is writable
    Producer {
        target: Target,
        reply: oneshot::Sender<Result<mpsc::Sender<LogMessage>>>,
    },
    /// Whether writer `generation` holds an open file, sent before its ack
    FileReady { generation: u64, ready: bool },
}

/// Structural change applied by the writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKind {
    InitLog { path: PathBuf },
    SwitchLog { path: PathBuf, archive: bool },
    SetPrefix { target: Target, prefix: String },
}

impl ConfigKind {
    /// Whether the outcome decides if a log file is open afterwards
    pub fn affects_file(&self) -> bool {
        matches!(self, ConfigKind::InitLog { .. } | ConfigKind::SwitchLog { .. })
    }
}

/// A config change plus the channel acknowledging it exactly once
#[derive(Debug)]
pub(crate) struct ConfigRequest {
    pub kind: ConfigKind,
    pub ack: oneshot::Sender<Result<()>>,
}

impl ConfigRequest {
    pub fn new(kind: ConfigKind) -> (Self, oneshot::Receiver<Result<()>>) {
        let (ack, rx) = oneshot::channel();
        (Self { kind, ack }, rx)
    }
}

/// Receiving ends handed to a freshly spawned writer
pub(crate) struct WriterChannels {
    pub messages: mpsc::Receiver<LogMessage>,
    pub configs: mpsc::UnboundedReceiver<ConfigRequest>,
    pub stop: oneshot::Receiver<()>,
}

/// Sending ends the controller keeps while a writer is alive
pub(crate) struct WriterLink {
    pub messages: mpsc::Sender<LogMessage>,
    pub configs: mpsc::UnboundedSender<ConfigRequest>,
    pub stop: Option<oneshot::Sender<()>>,
    pub task: Option<tokio::task::JoinHandle<Result<()>>>,
}

/// Create the channel set for one writer lifetime
pub(crate) fn writer_channels(capacity: usize) -> (WriterLink, WriterChannels) {
    // A zero-capacity tokio channel panics
    let (msg_tx, msg_rx) = mpsc::channel(capacity.max(1));
    let (cfg_tx, cfg_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel();

    (
        WriterLink {
            messages: msg_tx,
            configs: cfg_tx,
            stop: Some(stop_tx),
            task: None,
        },
        WriterChannels {
            messages: msg_rx,
            configs: cfg_rx,
            stop: stop_rx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Start { capacity: 1 }.name(), "start");
        assert_eq!(Action::Stop.name(), "stop");
        assert_eq!(
            Action::SwitchLog {
                path: PathBuf::from("b.log")
            }
            .name(),
            "switch-log"
        );
    }

    #[test]
    fn test_config_kind_affects_file() {
        assert!(ConfigKind::InitLog {
            path: PathBuf::from("a.log")
        }
        .affects_file());
        assert!(ConfigKind::SwitchLog {
            path: PathBuf::from("b.log"),
            archive: false
        }
        .affects_file());
        assert!(!ConfigKind::SetPrefix {
            target: Target::Stdout,
            prefix: String::new()
        }
        .affects_file());
    }

    #[tokio::test]
    async fn test_writer_channels_zero_capacity_is_clamped() {
        let (link, mut channels) = writer_channels(0);
        link.messages
            .send(LogMessage::new(Target::Stdout, "x"))
            .await
            .unwrap();
        assert_eq!(channels.messages.recv().await.unwrap().payload(), "x");
    }

    #[tokio::test]
    async fn test_writer_channels_capacity() {
        let (link, _channels) = writer_channels(4);
        assert_eq!(link.messages.max_capacity(), 4);
    }

    #[tokio::test]
    async fn test_config_request_ack() {
        let (request, rx) = ConfigRequest::new(ConfigKind::InitLog {
            path: PathBuf::from("a.log"),
        });
        request.ack.send(Ok(())).unwrap();
        assert!(rx.await.unwrap().is_ok());
    }
}
