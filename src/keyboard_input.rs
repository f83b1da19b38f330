use crate::app::{AppCommand, AppHandle, ShutdownReason};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Command bound to a key, if any
pub fn command_for_key(code: KeyCode) -> Option<AppCommand> {
    match code {
        KeyCode::Char('p') | KeyCode::Char('P') => Some(AppCommand::TakePhoto),
        KeyCode::Char('v') | KeyCode::Char('V') | KeyCode::Char(' ') => {
            Some(AppCommand::ToggleVideo)
        }
        KeyCode::Char('r') | KeyCode::Char('R') => Some(AppCommand::Rebind),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            Some(AppCommand::Shutdown(ShutdownReason::UserRequest))
        }
        _ => None,
    }
}

/// Raw-mode keyboard controls for the camera session
pub struct KeyboardInputHandler {
    handle: AppHandle,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(handle: AppHandle) -> Self {
        Self {
            handle,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub fn start(&self) {
        info!("Keyboard controls: p = photo, v/space = video, r = rebind, q = quit");

        let handle = self.handle.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            loop {
                if cancellation_token.is_cancelled() || handle.is_closed() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(command) = command_for_key(key_event.code) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        let quitting = matches!(command, AppCommand::Shutdown(_));
                        if let Err(e) = handle.send(command) {
                            warn!("Failed to send keyboard command: {}", e);
                            break;
                        }
                        if quitting {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
        });
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the polling task notice and restore the terminal
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(command_for_key(KeyCode::Char('p')), Some(AppCommand::TakePhoto));
        assert_eq!(command_for_key(KeyCode::Char(' ')), Some(AppCommand::ToggleVideo));
        assert_eq!(command_for_key(KeyCode::Char('V')), Some(AppCommand::ToggleVideo));
        assert_eq!(command_for_key(KeyCode::Char('r')), Some(AppCommand::Rebind));
        assert_eq!(
            command_for_key(KeyCode::Esc),
            Some(AppCommand::Shutdown(ShutdownReason::UserRequest))
        );
        assert_eq!(command_for_key(KeyCode::Char('x')), None);
        assert_eq!(command_for_key(KeyCode::Enter), None);
    }
}
