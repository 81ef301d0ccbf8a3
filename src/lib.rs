//! Non-blocking TCP ingest of rocket pose telemetry for 3D visualization.
//!
//! Flightline accepts a single telemetry source (a flight simulator) on a TCP
//! endpoint, cuts its byte stream into fixed-layout binary records, decodes each
//! record into a [`PoseSample`], and hands samples to a visualization layer. Every
//! record received on the current connection is kept as an episode that can be
//! replayed once the source goes quiet.
//!
//! # Features
//!
//! - **Tick-driven**: every operation is non-blocking and bounded to one tick
//! - **Three wire layouts**: 32-bit packed, 64-bit tagged, 64-bit interleaved
//! - **Two framing modes**: fixed width, or sentinel-delimited with resynchronization
//! - **Episode replay**: re-emit the last connection's samples, preempted by live data
//!
//! # Quick Start
//!
//! Hosts with their own timer drive a [`TelemetrySession`] directly:
//!
//! ```rust,no_run
//! use flightline::{PoseSample, SessionConfig, TelemetrySession};
//!
//! fn main() -> flightline::Result<()> {
//!     let config = SessionConfig::default();
//!     let mut session = TelemetrySession::bind(&config, |pose: &PoseSample| {
//!         println!("z = {:.2}", pose.position.z);
//!     })?;
//!
//!     loop {
//!         if session.poll()?.is_final() {
//!             break;
//!         }
//!         std::thread::sleep(config.tick_interval());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Example (async feed)
//!
//! ```rust,no_run
//! use flightline::{Flightline, SessionConfig};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feed = Flightline::listen(SessionConfig::default()).await?;
//!     let mut poses = feed.pose_updates();
//!
//!     while let Some(pose) = poses.next().await {
//!         println!("Altitude: {}", pose.position.z);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod codec;
pub mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Ingest pipeline
pub mod connection;
pub mod episode;
pub mod framing;
pub mod replay;
pub mod session;

// Delivery
pub mod consumer;
pub mod driver;
pub mod feed;
pub mod sender;

// Core exports
pub use config::SessionConfig;
pub use error::*;
pub use types::*;

// Main API exports
pub use codec::RecordCodec;
pub use connection::{ConnectionManager, ReadOutcome, Teardown};
pub use consumer::{PoseConsumer, PoseLog, WatchConsumer};
pub use episode::EpisodeRecorder;
pub use feed::PoseFeed;
pub use framing::{FrameDecoder, FramingMode, FramingStats, ReceiveBuffer};
pub use replay::{ReplayController, ReplayState};
pub use sender::PoseSender;
pub use session::{PollOutcome, TelemetrySession};

/// Unified entry point for Flightline telemetry.
///
/// # Examples
///
/// ## Async feed
/// ```rust,no_run
/// use flightline::{Flightline, SessionConfig};
///
/// #[tokio::main]
/// async fn main() -> flightline::Result<()> {
///     let feed = Flightline::listen(SessionConfig::default().with_port(5000)).await?;
///     // Use feed...
///     Ok(())
/// }
/// ```
///
/// ## Simulator side
/// ```rust,no_run
/// use flightline::{Flightline, FramingMode, RecordLayout};
///
/// fn main() -> flightline::Result<()> {
///     let addr = "127.0.0.1:5000".parse().expect("valid address");
///     let _sender = Flightline::connect(addr, RecordLayout::Packed32, FramingMode::FixedWidth)?;
///     // Send samples...
///     Ok(())
/// }
/// ```
pub struct Flightline;

impl Flightline {
    /// Bind the telemetry endpoint and drive it on the tokio runtime.
    ///
    /// The returned feed publishes the latest pose; hosts that need every sample
    /// in order should build a [`TelemetrySession`] with their own consumer.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The address cannot be parsed
    /// - The port is already taken
    pub async fn listen(config: SessionConfig) -> Result<PoseFeed> {
        PoseFeed::listen(config).await
    }

    /// Connect a sender to a listening endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Connection`] when nothing is listening at `addr`.
    pub fn connect(
        addr: std::net::SocketAddr,
        layout: RecordLayout,
        framing: FramingMode,
    ) -> Result<PoseSender> {
        PoseSender::connect(addr, layout, framing)
    }
}
