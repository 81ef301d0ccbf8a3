//! Telemetry listener binary.
//!
//! Binds the telemetry endpoint, prints every pose update it sees, and toggles
//! replay of the last episode when `r` is entered on stdin.
//!
//! ## Usage
//!
//! ```bash
//! flightline-listen                    # defaults: 127.0.0.1:5000, packed32, fixed width
//! flightline-listen session.yaml       # settings from a YAML file
//! RUST_LOG=flightline=debug flightline-listen
//! ```

use anyhow::Context;
use futures::StreamExt;
use std::io::BufRead;
use tokio::sync::mpsc;

use flightline::{Flightline, SessionConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1).as_deref() {
        Some("--help" | "-h") => {
            println!("Usage: flightline-listen [CONFIG.yaml]");
            println!();
            println!("Enter `r` to toggle replay, `q` to quit.");
            return Ok(());
        }
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("loading session configuration from {path}"))?,
        None => SessionConfig::default(),
    };

    let feed = Flightline::listen(config.clone())
        .await
        .with_context(|| format!("listening on {}:{}", config.address, config.port))?;
    println!("Listening on {} ({:?}, {:?})", feed.local_addr(), config.layout, config.framing);

    let mut keys = stdin_lines();
    let mut poses = feed.pose_updates();

    loop {
        tokio::select! {
            pose = poses.next() => match pose {
                Some(pose) => {
                    let p = pose.position;
                    let q = pose.orientation;
                    println!(
                        "pos ({:>10.3}, {:>10.3}, {:>10.3})  quat ({:+.4}, {:+.4}, {:+.4}, {:+.4})",
                        p.x, p.y, p.z, q.w, q.x, q.y, q.z
                    );
                }
                None => {
                    println!("Session ended");
                    break;
                }
            },
            line = keys.recv() => match line.as_deref().map(str::trim) {
                Some("r") => feed.toggle_replay().context("toggling replay")?,
                Some("q") | None => {
                    feed.shutdown().ok();
                    break;
                }
                Some(_) => {}
            },
        }
    }

    Ok(())
}

/// Forward stdin lines from a blocking reader thread.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
