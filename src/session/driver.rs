//! Scheduling loop for a detection session.

use crate::error::{Error, Result};
use crate::session::{SessionCommand, SessionController};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Command queue depth between the front end and the driver.
const COMMAND_BUFFER: usize = 16;

/// Sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Create a handle and the receiver to pass to [`run`].
    pub fn channel() -> (Self, mpsc::Receiver<SessionCommand>) {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        (Self { commands }, rx)
    }

    /// Send a command to the session.
    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::SessionClosed)
    }
}

/// Drive `controller` until shutdown, cancellation, or the command channel
/// closes.
///
/// Commands, frame ticks and classification results are multiplexed on the
/// calling task. Frame ticks are only scheduled while the session is live.
/// Initialization (including a slow model load) is abandoned as soon as
/// `cancel` fires. The controller is returned shut down, with its stream
/// released.
pub async fn run(
    mut controller: SessionController,
    mut commands: mpsc::Receiver<SessionCommand>,
    cancel: CancellationToken,
    frame_interval: Duration,
) -> SessionController {
    if !unless_cancelled(&cancel, controller.start()).await {
        info!("Session cancelled during startup");
        controller.shutdown();
        return controller;
    }

    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let live = controller.state().is_live();

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Session cancelled");
                break;
            }
            command = commands.recv() => {
                match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => {
                        debug!("Session command: {command:?}");
                        let handled =
                            unless_cancelled(&cancel, handle_command(&mut controller, command))
                                .await;
                        if !handled {
                            info!("Session cancelled");
                            break;
                        }
                    }
                }
            }
            _ = ticker.tick(), if live => {
                controller.step();
            }
            completion = controller.next_completion() => {
                if let Some(completion) = completion {
                    controller.apply(completion);
                }
            }
        }
    }

    controller.shutdown();
    controller
}

/// Await `work` unless `cancel` fires first; `false` when cancelled.
async fn unless_cancelled(cancel: &CancellationToken, work: impl Future<Output = ()>) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = work => true,
    }
}

async fn handle_command(controller: &mut SessionController, command: SessionCommand) {
    match command {
        SessionCommand::Capture => controller.capture(),
        SessionCommand::Pause => controller.pause(),
        SessionCommand::Resume => controller.resume().await,
        SessionCommand::SwitchDevice => controller.switch_device().await,
        SessionCommand::Retry => controller.retry().await,
        SessionCommand::Shutdown => controller.shutdown(),
    }
}
