//! Driver spawns and owns the tick task for a telemetry session

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::consumer::PoseConsumer;
use crate::session::TelemetrySession;

/// Requests forwarded into the tick task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    /// Flip replay of the recorded episode
    ToggleReplay,
    /// Tear the session down and end the task
    Shutdown,
}

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Sender for replay toggles and shutdown requests
    pub commands: mpsc::UnboundedSender<DriverCommand>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Handle of the tick task
    pub task: JoinHandle<()>,
}

/// Driver plays the host timer for a [`TelemetrySession`].
///
/// The spawned task owns the session outright, so polling never needs a lock.
/// Ticks that fall behind are delayed, not bunched up.
pub struct Driver;

impl Driver {
    /// Spawn the tick task for `session`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C>(session: TelemetrySession<C>) -> DriverChannels
    where
        C: PoseConsumer + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = session.cancel_token();
        let cancel_task = cancel.clone();

        let task = tokio::spawn(async move {
            Self::tick_task(session, command_rx, cancel_task).await;
        });

        DriverChannels { commands: command_tx, cancel, task }
    }

    async fn tick_task<C>(
        mut session: TelemetrySession<C>,
        mut commands: mpsc::UnboundedReceiver<DriverCommand>,
        cancel: CancellationToken,
    ) where
        C: PoseConsumer,
    {
        info!(address = %session.local_addr(), "Tick task started");
        const MAX_ERRORS: u32 = 10;
        let mut error_count = 0u32;
        let mut ticks = 0u64;
        let mut commands_open = true;

        let mut interval = tokio::time::interval(session.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Tick task cancelled");
                    session.poll().ok();
                    break;
                }
                command = commands.recv(), if commands_open => match command {
                    Some(DriverCommand::ToggleReplay) => {
                        session.toggle_replay();
                    }
                    Some(DriverCommand::Shutdown) => {
                        info!("Shutdown requested");
                        session.shutdown();
                        break;
                    }
                    None => {
                        // Every command sender is gone; keep ticking until cancelled
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },
                _ = interval.tick() => {
                    ticks += 1;
                    match session.poll() {
                        Ok(outcome) if outcome.is_final() => {
                            info!(outcome = ?outcome, "Session ended");
                            break;
                        }
                        Ok(outcome) => {
                            error_count = 0;
                            trace!("Tick {}: {:?}", ticks, outcome);
                        }
                        Err(e) => {
                            // Poll errors are internal faults; don't crash on a single one
                            error_count += 1;
                            error!("Poll error ({}/{}): {}", error_count, MAX_ERRORS, e);

                            if error_count >= MAX_ERRORS {
                                error!("Too many poll errors, shutting down");
                                session.shutdown();
                                break;
                            }
                        }
                    }
                }
            }
        }

        info!("Tick task ended after {} ticks", ticks);
    }
}
