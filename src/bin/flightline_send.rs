//! Telemetry sender binary.
//!
//! Streams a synthetic ascent to a listening endpoint, standing in for the
//! flight simulator.
//!
//! ## Usage
//!
//! ```bash
//! flightline-send                          # 200 samples at 20 Hz to 127.0.0.1:5000
//! flightline-send --config session.yaml    # layout, framing, and address from YAML
//! flightline-send --count 1000 --rate 60
//! ```

use anyhow::{Context, bail};
use std::time::Duration;
use tracing::info;

use flightline::{Flightline, PoseSample, Quaternion, SessionConfig, Vector3};

struct Args {
    config: SessionConfig,
    count: usize,
    rate_hz: f64,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args { config: SessionConfig::default(), count: 200, rate_hz: 20.0 };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config requires a value")?;
                parsed.config = SessionConfig::from_file(&path)
                    .with_context(|| format!("loading session configuration from {path}"))?;
            }
            "--count" | "-n" => {
                let value = args.next().context("--count requires a value")?;
                parsed.count = value.parse().with_context(|| format!("invalid count: {value}"))?;
            }
            "--rate" | "-r" => {
                let value = args.next().context("--rate requires a value")?;
                parsed.rate_hz = value.parse().with_context(|| format!("invalid rate: {value}"))?;
                if parsed.rate_hz.is_nan() || parsed.rate_hz <= 0.0 {
                    bail!("rate must be positive, got {value}");
                }
            }
            "--help" | "-h" => {
                println!("Usage: flightline-send [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>   Session configuration (YAML)");
                println!("  -n, --count <N>       Samples to send (default: 200)");
                println!("  -r, --rate <HZ>       Samples per second (default: 20)");
                return Ok(None);
            }
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(Some(parsed))
}

/// Pose `i` of a vertical ascent with a slow roll.
fn ascent(i: usize, rate_hz: f64) -> PoseSample {
    let t = i as f64 / rate_hz;
    let half_angle = 0.05 * t;
    PoseSample::new(
        Vector3::new(2.0 * t, 0.0, 0.5 * 15.0 * t * t),
        Quaternion::new(half_angle.cos(), 0.0, 0.0, half_angle.sin()),
    )
    .with_actuators((7600.0 - 40.0 * t).max(0.0), [0.02 * t.sin(), 0.02 * t.cos()])
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Some(Args { config, count, rate_hz }) = parse_args()? else {
        return Ok(());
    };

    let addr = config.socket_addr()?;
    let mut sender = Flightline::connect(addr, config.layout, config.framing)
        .with_context(|| format!("connecting to {addr}"))?;
    let period = Duration::from_secs_f64(1.0 / rate_hz);

    for i in 0..count {
        sender.send(&ascent(i, rate_hz))?;
        std::thread::sleep(period);
    }

    sender.close()?;
    info!("Sent {} samples to {}", sender.sent(), addr);
    Ok(())
}
