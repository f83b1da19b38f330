use super::types::{AppCommand, ShutdownReason};
use super::CameraApp;
use crate::capture::PhotoResult;
use crate::error::Result;
use crate::platform::RecordEvent;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

enum Incoming {
    Command(AppCommand),
    Photo(PhotoResult),
    Record(RecordEvent),
    ScopeEnded,
}

impl CameraApp {
    /// Run the coordinator loop with signal handling until shutdown
    pub async fn run(&mut self) -> Result<i32> {
        info!("Camera session is running");

        self.setup_signal_handlers();
        let token = self.scope.token();

        let reason = loop {
            let incoming = tokio::select! {
                Some(command) = self.command_rx.recv() => Incoming::Command(command),
                Some(result) = self.channels.photo_results.recv() => Incoming::Photo(result),
                Some(event) = self.channels.record_events.recv() => Incoming::Record(event),
                _ = token.cancelled() => Incoming::ScopeEnded,
            };

            match incoming {
                Incoming::Command(AppCommand::Shutdown(reason)) => {
                    self.dispatch(AppCommand::Shutdown(reason.clone())).await;
                    break reason;
                }
                Incoming::Command(command) => {
                    self.dispatch(command).await;
                }
                Incoming::Photo(result) => self.actions.handle_photo_result(result),
                Incoming::Record(event) => self.actions.handle_record_event(event),
                Incoming::ScopeEnded => {
                    debug!("Lifecycle scope ended outside the coordinator");
                    break ShutdownReason::ScopeEnded;
                }
            }
        };

        info!("Shutdown initiated: {}", reason);
        let exit_code = self.shutdown().await?;

        info!("Camera session stopped");
        Ok(exit_code)
    }

    /// Turn SIGTERM and Ctrl+C into shutdown commands
    fn setup_signal_handlers(&self) {
        #[cfg(unix)]
        {
            let sigterm_tx = self.command_tx.clone();
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate())
                {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        error!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    request_shutdown(&sigterm_tx, "SIGTERM");
                }
            });
        }

        let sigint_tx = self.command_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                request_shutdown(&sigint_tx, "SIGINT");
            }
        });
    }
}

fn request_shutdown(sender: &mpsc::UnboundedSender<AppCommand>, signal_name: &str) {
    let reason = ShutdownReason::Signal(signal_name.to_string());
    if sender.send(AppCommand::Shutdown(reason)).is_err() {
        debug!("Coordinator already stopped, ignoring {}", signal_name);
    }
}
