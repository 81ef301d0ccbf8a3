//! Core types for pose telemetry.
//!
//! ## Architecture
//!
//! - [`Record`] is one raw, exact-size telemetry sample as it arrived on the wire
//! - [`RecordLayout`] names the wire layout both ends agreed on out of band
//! - [`PoseSample`] is the decoded form handed to the visualization layer
//!
//! Records share their bytes through `Arc<[u8]>`, so the episode log and the
//! decoding path can both hold a record without copying it.
//!
//! ## Usage Example
//!
//! ```rust
//! use flightline::types::{PoseSample, Quaternion, RecordLayout, Vector3};
//!
//! let sample = PoseSample::new(Vector3::new(0.0, 0.0, 120.5), Quaternion::IDENTITY);
//! assert_eq!(RecordLayout::Tagged64.record_size(), 58);
//! assert!(sample.thrust.is_none());
//! ```

mod layout;
mod pose;
mod record;

pub use layout::{FieldWidth, RecordLayout};
pub use pose::{PoseSample, Quaternion, Vector3};
pub use record::Record;
