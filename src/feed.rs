//! Pose feed: async handle onto a driven telemetry session

use futures::Stream;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::consumer::WatchConsumer;
use crate::driver::{Driver, DriverChannels, DriverCommand};
use crate::session::TelemetrySession;
use crate::types::PoseSample;
use crate::{Result, SessionConfig, TelemetryError};

/// Live view of a telemetry session running on the tokio runtime.
///
/// Dropping the feed cancels the session: the connection and the endpoint are
/// closed on the driver's next turn.
pub struct PoseFeed {
    /// Latest-pose watch receiver
    poses: watch::Receiver<Option<Arc<PoseSample>>>,

    /// Commands into the tick task
    commands: mpsc::UnboundedSender<DriverCommand>,

    /// Address the endpoint is bound to
    local_addr: SocketAddr,

    /// Cancellation token for stopping the tick task
    cancel: CancellationToken,
}

impl PoseFeed {
    /// Bind the endpoint and start ticking.
    ///
    /// Bind failures surface here, before any task is spawned.
    pub async fn listen(config: SessionConfig) -> Result<Self> {
        let (consumer, poses) = WatchConsumer::channel();
        let session = TelemetrySession::bind(&config, consumer)?;
        let local_addr = session.local_addr();

        let DriverChannels { commands, cancel, task } = Driver::spawn(session);
        // The task ends on its own once cancelled; nothing needs to join it
        drop(task);

        info!(address = %local_addr, layout = ?config.layout, "Pose feed listening");

        Ok(Self { poses, commands, local_addr, cancel })
    }

    /// Stream of pose updates.
    ///
    /// Latest-wins: a slow subscriber skips intermediate samples instead of
    /// queueing them. The stream ends once the session shuts down. It is `Unpin`,
    /// so `next()` can be called on it directly.
    pub fn pose_updates(&self) -> impl Stream<Item = Arc<PoseSample>> + Unpin + 'static {
        tokio_stream::StreamExt::filter_map(WatchStream::new(self.poses.clone()), |opt| opt)
    }

    /// Most recent pose, if any has arrived
    pub fn current_pose(&self) -> Option<Arc<PoseSample>> {
        self.poses.borrow().clone()
    }

    /// Flip replay of the recorded episode.
    pub fn toggle_replay(&self) -> Result<()> {
        self.send(DriverCommand::ToggleReplay)
    }

    /// Stop the session. Further commands fail with [`TelemetryError::Driver`].
    pub fn shutdown(&self) -> Result<()> {
        let sent = self.send(DriverCommand::Shutdown);
        self.cancel.cancel();
        sent
    }

    /// Whether the tick task is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed() && !self.cancel.is_cancelled()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn send(&self, command: DriverCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| TelemetryError::Driver { reason: "tick task has stopped".to_string() })
    }
}

impl Drop for PoseFeed {
    fn drop(&mut self) {
        debug!("Dropping pose feed");
        // Cancel tasks on drop for clean shutdown
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::FramingMode;
    use crate::test_utils::{LOOPBACK_TIMEOUT, encode_stream, loopback_config, synthetic_ascent};
    use crate::types::RecordLayout;
    use futures::StreamExt;
    use std::io::Write;
    use std::net::TcpStream;
    use std::time::Duration;

    fn fast_config(layout: RecordLayout, framing: FramingMode) -> SessionConfig {
        loopback_config(layout, framing).with_tick_interval(Duration::from_millis(2))
    }

    #[tokio::test]
    async fn stream_yields_received_poses() {
        let layout = RecordLayout::Interleaved64;
        let feed = PoseFeed::listen(fast_config(layout, FramingMode::sentinel())).await.unwrap();
        assert!(feed.current_pose().is_none());

        let samples = synthetic_ascent(3);
        let mut client = TcpStream::connect(feed.local_addr()).unwrap();
        client.write_all(&encode_stream(layout, FramingMode::sentinel(), &samples)).unwrap();

        let mut updates = feed.pose_updates();
        let last = samples[2];
        let arrived = tokio::time::timeout(LOOPBACK_TIMEOUT, async {
            while let Some(pose) = updates.next().await {
                if pose.position == last.position {
                    return true;
                }
            }
            false
        })
        .await;

        assert_eq!(arrived, Ok(true));
        assert_eq!(feed.current_pose().map(|p| p.orientation), Some(last.orientation));
    }

    #[tokio::test]
    async fn pose_updates_can_be_polled_without_pinning() {
        fn assert_unpin<T: Unpin>(_: &T) {}

        let feed = PoseFeed::listen(fast_config(RecordLayout::Packed32, FramingMode::FixedWidth))
            .await
            .unwrap();
        let mut updates = feed.pose_updates();
        assert_unpin(&updates);

        let samples = synthetic_ascent(1);
        let mut client = TcpStream::connect(feed.local_addr()).unwrap();
        let bytes = encode_stream(RecordLayout::Packed32, FramingMode::FixedWidth, &samples);
        client.write_all(&bytes).unwrap();

        let pose = tokio::select! {
            pose = updates.next() => pose,
            _ = tokio::time::sleep(LOOPBACK_TIMEOUT) => None,
        };
        assert_eq!(pose.map(|p| p.position), Some(samples[0].position));
    }

    #[tokio::test]
    async fn bind_errors_surface_from_listen() {
        let config = SessionConfig::default().with_address("not an address").with_port(0);
        let err = PoseFeed::listen(config).await.err().expect("listen should fail");
        assert!(matches!(err, TelemetryError::Bind { .. }));
    }

    #[tokio::test]
    async fn shutdown_closes_the_endpoint() {
        let config = fast_config(RecordLayout::Packed32, FramingMode::FixedWidth);
        let feed = PoseFeed::listen(config).await.unwrap();
        let addr = feed.local_addr();

        feed.toggle_replay().unwrap();
        feed.shutdown().unwrap();
        assert!(!feed.is_running());

        let closed = tokio::time::timeout(LOOPBACK_TIMEOUT, async {
            while !feed.commands.is_closed() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await;
        assert!(closed.is_ok());
        assert!(TcpStream::connect(addr).is_err());
        assert!(matches!(feed.toggle_replay(), Err(TelemetryError::Driver { .. })));
    }
}
