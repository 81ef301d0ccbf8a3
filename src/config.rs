//! Session configuration
//!
//! Everything both ends must agree on out of band (address, record layout,
//! framing) plus the tuning knobs of the ingest loop. Every field has a default,
//! so a YAML file only needs the values it changes:
//!
//! ```rust
//! use flightline::{FramingMode, RecordLayout, SessionConfig};
//!
//! let config = SessionConfig::from_yaml_str(
//!     "port: 5001\nlayout: interleaved64\nframing:\n  sentinel: {}\n",
//! )?;
//! assert_eq!(config.port, 5001);
//! assert_eq!(config.layout, RecordLayout::Interleaved64);
//! assert_eq!(config.framing, FramingMode::sentinel());
//! assert_eq!(config.death_threshold, 10_000);
//! # Ok::<(), flightline::TelemetryError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::framing::FramingMode;
use crate::types::RecordLayout;
use crate::{Result, TelemetryError};

/// Configuration of one ingest session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Interface to listen on
    pub address: String,

    /// TCP port to listen on
    pub port: u16,

    /// Maximum bytes taken from the socket per tick
    pub read_buffer_size: usize,

    /// Wire layout of one record
    pub layout: RecordLayout,

    /// How record boundaries are found
    #[serde(with = "serde_yaml_ng::with::singleton_map")]
    pub framing: FramingMode,

    /// Orderly peer closes after which the endpoint shuts down for good
    pub death_threshold: u32,

    /// Log "waiting for connection" once per this many consecutive empty accepts
    pub accept_log_interval: u32,

    /// Poll cadence used by the tick driver, in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
            read_buffer_size: 1024,
            layout: RecordLayout::Packed32,
            framing: FramingMode::FixedWidth,
            death_threshold: 10_000,
            accept_log_interval: 20,
            tick_interval_ms: 50,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        debug!("Loaded session configuration from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    /// Check values the ingest loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(TelemetryError::invalid_config("read_buffer_size must be non-zero"));
        }
        if self.death_threshold == 0 {
            return Err(TelemetryError::invalid_config("death_threshold must be non-zero"));
        }
        if self.accept_log_interval == 0 {
            return Err(TelemetryError::invalid_config("accept_log_interval must be non-zero"));
        }
        if self.tick_interval_ms == 0 {
            return Err(TelemetryError::invalid_config("tick_interval_ms must be non-zero"));
        }
        if self.address.trim().is_empty() {
            return Err(TelemetryError::invalid_config("address must not be empty"));
        }
        Ok(())
    }

    /// Listening address as a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.address.trim().parse().map_err(|e| {
            TelemetryError::bind_error(
                format!("{}:{}", self.address, self.port),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            )
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Size in bytes of one record body.
    pub fn record_size(&self) -> usize {
        self.layout.record_size()
    }

    /// Poll cadence of the tick driver.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_death_threshold(mut self, threshold: u32) -> Self {
        self.death_threshold = threshold;
        self
    }

    pub fn with_accept_log_interval(mut self, interval: u32) -> Self {
        self.accept_log_interval = interval;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis().max(1) as u64;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_setup() {
        let config = SessionConfig::default();
        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.record_size(), 40);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_yaml_mapping_yields_defaults() {
        let config = SessionConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let yaml = "port: 6000\nlayout: tagged64\ndeath_threshold: 3\n";
        let config = SessionConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.layout, RecordLayout::Tagged64);
        assert_eq!(config.death_threshold, 3);
        assert_eq!(config.read_buffer_size, 1024);
    }

    #[test]
    fn framing_reads_as_a_nested_map() {
        let config = SessionConfig::from_yaml_str("framing:\n  sentinel: {}\n").unwrap();
        assert_eq!(config.framing, FramingMode::sentinel());

        let yaml = "framing:\n  sentinel:\n    delimiter: 35\n";
        let config = SessionConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.framing, FramingMode::Sentinel { delimiter: b'#' });

        let config = SessionConfig::from_yaml_str("framing: fixed_width\n").unwrap();
        assert_eq!(config.framing, FramingMode::FixedWidth);
    }

    #[test]
    fn framing_survives_a_yaml_round_trip() {
        let config = SessionConfig::default()
            .with_framing(FramingMode::Sentinel { delimiter: b'#' })
            .with_layout(RecordLayout::Interleaved64);
        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        assert!(yaml.contains("sentinel:"), "{yaml}");
        assert_eq!(SessionConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = SessionConfig::from_yaml_str("prot: 6000\n");
        assert!(matches!(result, Err(TelemetryError::Parse { .. })));
    }

    #[test]
    fn zero_values_fail_validation() {
        for yaml in [
            "read_buffer_size: 0",
            "death_threshold: 0",
            "accept_log_interval: 0",
            "tick_interval_ms: 0",
            "address: ''",
        ] {
            let result = SessionConfig::from_yaml_str(yaml);
            assert!(matches!(result, Err(TelemetryError::Config { .. })), "{yaml} accepted");
        }
    }

    #[test]
    fn invalid_address_is_a_bind_error() {
        let config = SessionConfig::default().with_address("not an address");
        let err = config.socket_addr().unwrap_err();
        assert!(matches!(err, TelemetryError::Bind { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn ipv6_address_is_accepted() {
        let config = SessionConfig::default().with_address("::1").with_port(5001);
        assert_eq!(config.socket_addr().unwrap(), "[::1]:5001".parse().unwrap());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SessionConfig::from_file("/nonexistent/flightline.yaml").unwrap_err();
        match err {
            TelemetryError::File { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/flightline.yaml"))
            }
            other => panic!("Expected File error, got {other:?}"),
        }
    }
}
