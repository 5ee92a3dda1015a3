//! Termination signals that end a piping session early

use tokio::sync::oneshot;

use simplelog_core::prelude::*;

/// Receiver that resolves once SIGINT or SIGTERM (Ctrl+C on Windows) arrives
///
/// If the handlers cannot be installed the sender is dropped and the
/// receiver yields `Err(RecvError)`.
pub fn shutdown_signal() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => {
                info!("Received {}, stopping input", name);
                let _ = tx.send(());
            }
            Err(e) => warn!("Signal handling unavailable: {}", e),
        }
    });
    rx
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    Ok(tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    })
}

#[cfg(windows)]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl+C")?;
    Ok("Ctrl+C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_signal_pending_without_signal() {
        let mut rx = shutdown_signal();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ));
    }
}
