//! Controller actor
//!
//! Single owner of the [`ServiceState`]. Every lifecycle action, state check
//! and state change goes through one `mpsc` dispatch point, so the state is
//! never shared and never locked.
//!
//! The event loop itself never awaits anything but its own inbox. Work that
//! must wait for the writer (startup confirmation, drain on stop, config
//! acks) runs in small spawned tasks that hold the caller's reply channel and
//! a one-shot waiter fired by the loop when the awaited state is reached.

use tokio::sync::{mpsc, oneshot};

use simplelog_core::prelude::*;
use simplelog_core::{LogMessage, ServiceState, Target};

use crate::protocol::{
    writer_channels, Action, ConfigKind, ConfigRequest, ControlRequest, WriterLink,
};
use crate::writer::{Writer, WriterSettings};

/// Capacity of the controller inbox
const CONTROL_CHANNEL_CAPACITY: usize = 64;

/// Cloneable handle to a running controller
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControlRequest>,
}

impl ControllerHandle {
    /// Serve a lifecycle or config action; resolves once its effect is durable
    pub async fn service(&self, action: Action) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlRequest::Action { action, reply }).await?;
        rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// True iff the service is currently in `state`
    pub async fn check_state(&self, state: ServiceState) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlRequest::CheckState { state, reply }).await?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }

    pub async fn state(&self) -> Result<ServiceState> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlRequest::GetState { reply }).await?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Request a state change; illegal transitions are rejected by the loop
    pub async fn set_state(&self, state: ServiceState) -> Result<()> {
        self.send(ControlRequest::SetState { state }).await
    }

    /// Wait until the service reaches `state`
    pub async fn wait_for(&self, state: ServiceState) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlRequest::WaitFor { state, reply }).await?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Message channel for `target`, if the service can accept such records
    pub(crate) async fn producer(&self, target: Target) -> Result<mpsc::Sender<LogMessage>> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlRequest::Producer { target, reply }).await?;
        rx.await.map_err(|_| Error::ChannelClosed)?
    }

    pub(crate) async fn report_file(&self, generation: u64, ready: bool) -> Result<()> {
        self.send(ControlRequest::FileReady { generation, ready }).await
    }

    async fn send(&self, request: ControlRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| Error::ChannelClosed)
    }
}

/// Spawn a controller on the current tokio runtime
pub fn spawn_controller(settings: WriterSettings) -> ControllerHandle {
    let (tx, rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
    let controller = Controller {
        state: ServiceState::Stopped,
        file_ready: false,
        generation: 0,
        settings,
        link: None,
        waiters: Vec::new(),
        inbox: tx.downgrade(),
    };
    tokio::spawn(controller.run(rx));
    ControllerHandle { tx }
}

struct Controller {
    state: ServiceState,
    /// Whether the writer holds an open log file
    file_ready: bool,
    /// Bumped on every start; tags reports from one writer lifetime
    generation: u64,
    settings: WriterSettings,
    /// Sending ends of the live writer, present from Start until Stopped
    link: Option<WriterLink>,
    /// One-shot signals fired when the service reaches a state
    waiters: Vec<(ServiceState, oneshot::Sender<()>)>,
    /// Weak so that dropping every handle ends the loop
    inbox: mpsc::WeakSender<ControlRequest>,
}

impl Controller {
    async fn run(mut self, mut rx: mpsc::Receiver<ControlRequest>) {
        debug!("Controller running");
        while let Some(request) = rx.recv().await {
            self.dispatch(request);
        }
        debug!("Controller exiting, all handles dropped");
    }

    fn dispatch(&mut self, request: ControlRequest) {
        match request {
            ControlRequest::Action { action, reply } => self.handle_action(action, reply),
            ControlRequest::CheckState { state, reply } => {
                let _ = reply.send(self.state == state);
            }
            ControlRequest::GetState { reply } => {
                let _ = reply.send(self.state);
            }
            ControlRequest::SetState { state } => {
                if let Err(e) = self.apply(state) {
                    warn!("Rejected state change: {}", e);
                }
            }
            ControlRequest::WaitFor { state, reply } => self.register_waiter(state, reply),
            ControlRequest::Producer { target, reply } => {
                let _ = reply.send(self.producer(target));
            }
            ControlRequest::FileReady { generation, ready } => {
                // Reports from a previous writer lifetime are stale
                if self.state == ServiceState::Running && generation == self.generation {
                    self.file_ready = ready;
                } else {
                    debug!("Ignoring stale file report from writer {}", generation);
                }
            }
        }
    }

    fn handle_action(&mut self, action: Action, reply: oneshot::Sender<Result<()>>) {
        debug!("Controller serving {}", action.name());
        match action {
            Action::Start { capacity } => self.start(capacity, reply),
            Action::Stop => self.stop(reply),
            Action::InitLog { path } => self.forward(ConfigKind::InitLog { path }, reply),
            Action::SwitchLog { path } => {
                let archive = self.settings.archive_on_switch;
                self.forward(ConfigKind::SwitchLog { path, archive }, reply)
            }
            Action::SetPrefix { target, prefix } => {
                self.forward(ConfigKind::SetPrefix { target, prefix }, reply)
            }
        }
    }

    fn start(&mut self, capacity: usize, reply: oneshot::Sender<Result<()>>) {
        match self.state {
            ServiceState::Stopped => {}
            ServiceState::Stopping => {
                let _ = reply.send(Err(Error::Stopping));
                return;
            }
            ServiceState::Starting | ServiceState::Running => {
                let _ = reply.send(Err(Error::AlreadyRunning));
                return;
            }
        }

        let Some(handle) = self.handle() else {
            let _ = reply.send(Err(Error::ChannelClosed));
            return;
        };
        if let Err(e) = self.apply(ServiceState::Starting) {
            let _ = reply.send(Err(e));
            return;
        }
        self.file_ready = false;
        self.generation += 1;

        let (mut link, channels) = writer_channels(capacity);
        let writer = Writer::new(&self.settings, handle, self.generation);
        link.task = Some(tokio::spawn(writer.run(channels)));
        self.link = Some(link);

        let (running_tx, running_rx) = oneshot::channel();
        self.register_waiter(ServiceState::Running, running_tx);
        tokio::spawn(async move {
            let result = running_rx.await.map_err(|_| Error::ChannelClosed);
            let _ = reply.send(result);
        });
    }

    fn stop(&mut self, reply: oneshot::Sender<Result<()>>) {
        match self.state {
            ServiceState::Running => {}
            ServiceState::Stopping => {
                let _ = reply.send(Err(Error::Stopping));
                return;
            }
            ServiceState::Stopped | ServiceState::Starting => {
                let _ = reply.send(Err(Error::NotRunning));
                return;
            }
        }

        if let Err(e) = self.apply(ServiceState::Stopping) {
            let _ = reply.send(Err(e));
            return;
        }

        let (stop, task) = match self.link.as_mut() {
            Some(link) => (link.stop.take(), link.task.take()),
            None => (None, None),
        };
        if let Some(stop) = stop {
            if stop.send(()).is_err() {
                warn!("Writer was gone before the stop signal");
            }
        }

        let (stopped_tx, stopped_rx) = oneshot::channel();
        self.register_waiter(ServiceState::Stopped, stopped_tx);
        tokio::spawn(async move {
            let result = match stopped_rx.await {
                Ok(()) => match task {
                    Some(task) => task.await.unwrap_or_else(|e| {
                        error!("Log writer task failed: {}", e);
                        Err(Error::ChannelClosed)
                    }),
                    None => Ok(()),
                },
                Err(_) => Err(Error::ChannelClosed),
            };
            let _ = reply.send(result);
        });
    }

    /// Hand a config change to the writer and relay its ack
    fn forward(&mut self, kind: ConfigKind, reply: oneshot::Sender<Result<()>>) {
        let link = match (self.state, self.link.as_ref()) {
            (ServiceState::Running, Some(link)) => link,
            (ServiceState::Stopping, _) => {
                let _ = reply.send(Err(Error::Stopping));
                return;
            }
            _ => {
                let _ = reply.send(Err(Error::NotRunning));
                return;
            }
        };

        let (request, ack) = ConfigRequest::new(kind);
        if link.configs.send(request).is_err() {
            let _ = reply.send(Err(Error::ChannelClosed));
            return;
        }

        // The writer reports file readiness before it acks
        tokio::spawn(async move {
            let result = ack.await.unwrap_or(Err(Error::ChannelClosed));
            let _ = reply.send(result);
        });
    }

    fn producer(&self, target: Target) -> Result<mpsc::Sender<LogMessage>> {
        if self.state != ServiceState::Running {
            return Err(Error::NotRunning);
        }
        if target.needs_file() && !self.file_ready {
            return Err(Error::LogFileNotInitialized);
        }
        self.link
            .as_ref()
            .map(|link| link.messages.clone())
            .ok_or(Error::NotRunning)
    }

    /// Apply a transition and fire the waiters of the new state
    fn apply(&mut self, next: ServiceState) -> Result<()> {
        let prev = self.state;
        self.state = prev.transition(next)?;
        info!("Log service {} -> {}", prev, next);

        if next == ServiceState::Stopped {
            self.link = None;
            self.file_ready = false;
            if prev == ServiceState::Starting {
                // Startup aborted; Running will never come
                self.waiters.retain(|(s, _)| *s != ServiceState::Running);
            }
        }

        let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition(|(s, _)| *s == next);
        self.waiters = pending;
        for (_, tx) in ready {
            let _ = tx.send(());
        }
        Ok(())
    }

    fn register_waiter(&mut self, state: ServiceState, reply: oneshot::Sender<()>) {
        if self.state == state {
            let _ = reply.send(());
        } else {
            self.waiters.push((state, reply));
        }
    }

    fn handle(&self) -> Option<ControllerHandle> {
        self.inbox.upgrade().map(|tx| ControllerHandle { tx })
    }
}
