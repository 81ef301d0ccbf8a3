//! Test utilities: loopback setup, synthetic trajectories, and tick helpers
//!
//! Shared by the unit tests and the benchmarks (behind the `benchmark` feature).

#![cfg(any(test, feature = "benchmark"))]

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::codec::RecordCodec;
use crate::connection::ConnectionManager;
use crate::framing::FramingMode;
use crate::types::{PoseSample, Quaternion, RecordLayout, Vector3};
use crate::SessionConfig;

/// Default upper bound for loopback round trips in tests
pub const LOOPBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration bound to an ephemeral loopback port.
pub fn loopback_config(layout: RecordLayout, framing: FramingMode) -> SessionConfig {
    SessionConfig::default().with_port(0).with_layout(layout).with_framing(framing)
}

/// A vertical ascent with a slow roll, thrust tapering off.
pub fn synthetic_ascent(count: usize) -> Vec<PoseSample> {
    (0..count)
        .map(|i| {
            let t = i as f64 * 0.05;
            let half_angle = t * 0.1;
            PoseSample::new(
                Vector3::new(0.5 * t, -0.25 * t, 4.9 * t * t),
                Quaternion::new(half_angle.cos(), 0.0, 0.0, half_angle.sin()),
            )
            .with_actuators((2000.0 - 10.0 * t).max(0.0), [0.01 * t.sin(), 0.01 * t.cos()])
        })
        .collect()
}

/// Encode samples into the exact byte stream a sender would produce.
pub fn encode_stream(
    layout: RecordLayout,
    framing: FramingMode,
    samples: &[PoseSample],
) -> Vec<u8> {
    let codec = RecordCodec::new(layout);
    let mut stream = Vec::with_capacity(samples.len() * framing.wire_size(layout.record_size()));
    for sample in samples {
        stream.extend_from_slice(codec.encode(sample).as_bytes());
        if let FramingMode::Sentinel { delimiter } = framing {
            stream.push(delimiter);
        }
    }
    stream
}

/// Spin on `condition` until it holds or `timeout` passes.
pub fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Poll `try_accept` until a peer is accepted.
pub fn accept_within(manager: &mut ConnectionManager, timeout: Duration) -> Option<SocketAddr> {
    let mut peer = None;
    wait_until(timeout, || {
        peer = manager.try_accept();
        peer.is_some()
    });
    peer
}
