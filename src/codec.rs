//! Record codec: fixed-layout binary records to pose samples and back.
//!
//! ## Wire Layouts
//!
//! All fields are big-endian. Which layout is on the wire is a per-session
//! configuration constant, never inferred from content:
//!
//! ```text
//! Packed32      (40 B)  x y z qW qX qY qZ thrust gX gY          10 x f32
//! Tagged64      (58 B)  T x y z T qW qX qY qZ                   7 x f64, 2 tags
//! Interleaved64 (63 B)  'x' x 'y' y 'z' z 'X' qX 'Y' qY 'Z' qZ 'W' qW
//! ```
//!
//! Decoding is exact: f32 fields widen to f64 losslessly, and no physical
//! plausibility (such as a unit-norm quaternion) is checked here.

use crate::types::{PoseSample, Quaternion, Record, RecordLayout, Vector3};
use crate::{Result, TelemetryError};

/// Tag written before the position block of a `Tagged64` record
const POSITION_TAG: u8 = b'P';
/// Tag written before the orientation block of a `Tagged64` record
const ORIENTATION_TAG: u8 = b'Q';
/// Per-field tags of an `Interleaved64` record, in wire order
const INTERLEAVED_TAGS: [u8; 7] = *b"xyzXYZW";

/// Stateless encoder/decoder for one record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordCodec {
    layout: RecordLayout,
}

impl RecordCodec {
    pub const fn new(layout: RecordLayout) -> Self {
        Self { layout }
    }

    pub const fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Exact record size this codec accepts.
    pub const fn record_size(&self) -> usize {
        self.layout.record_size()
    }

    /// Decode one record.
    ///
    /// Records produced by the frame decoder always have the right size; a
    /// mismatched slice is reported as [`TelemetryError::RecordSize`].
    pub fn decode(&self, record: &Record) -> Result<PoseSample> {
        self.decode_bytes(record.as_bytes())
    }

    /// Decode one record from a raw slice.
    pub fn decode_bytes(&self, data: &[u8]) -> Result<PoseSample> {
        let expected = self.record_size();
        if data.len() != expected {
            return Err(TelemetryError::RecordSize { expected, found: data.len() });
        }

        let sample = match self.layout {
            RecordLayout::Packed32 => {
                let f = |index: usize| f64::from(read_f32_be(data, index * 4));
                PoseSample {
                    position: Vector3::new(f(0), f(1), f(2)),
                    orientation: Quaternion::new(f(3), f(4), f(5), f(6)),
                    thrust: Some(f(7)),
                    gimbal: Some([f(8), f(9)]),
                }
            }
            RecordLayout::Tagged64 => {
                // [tag][x y z][tag][w x y z]
                let position = Vector3::new(
                    read_f64_be(data, 1),
                    read_f64_be(data, 9),
                    read_f64_be(data, 17),
                );
                let orientation = Quaternion::new(
                    read_f64_be(data, 26),
                    read_f64_be(data, 34),
                    read_f64_be(data, 42),
                    read_f64_be(data, 50),
                );
                PoseSample::new(position, orientation)
            }
            RecordLayout::Interleaved64 => {
                // Each field is preceded by its one-byte label
                let f = |index: usize| read_f64_be(data, index * 9 + 1);
                PoseSample::new(
                    Vector3::new(f(0), f(1), f(2)),
                    Quaternion::new(f(6), f(3), f(4), f(5)),
                )
            }
        };

        Ok(sample)
    }

    /// Encode a sample into one record.
    ///
    /// `Packed32` narrows every field to f32 and writes 0.0 for absent actuator
    /// channels. The 64-bit layouts have no actuator channels and drop them.
    pub fn encode(&self, sample: &PoseSample) -> Record {
        let mut out = Vec::with_capacity(self.record_size());
        let PoseSample { position: p, orientation: q, .. } = sample;

        match self.layout {
            RecordLayout::Packed32 => {
                let [gimbal_x, gimbal_y] = sample.gimbal.unwrap_or([0.0, 0.0]);
                let fields = [
                    p.x,
                    p.y,
                    p.z,
                    q.w,
                    q.x,
                    q.y,
                    q.z,
                    sample.thrust.unwrap_or(0.0),
                    gimbal_x,
                    gimbal_y,
                ];
                for value in fields {
                    out.extend_from_slice(&(value as f32).to_be_bytes());
                }
            }
            RecordLayout::Tagged64 => {
                out.push(POSITION_TAG);
                for value in [p.x, p.y, p.z] {
                    out.extend_from_slice(&value.to_be_bytes());
                }
                out.push(ORIENTATION_TAG);
                for value in [q.w, q.x, q.y, q.z] {
                    out.extend_from_slice(&value.to_be_bytes());
                }
            }
            RecordLayout::Interleaved64 => {
                let fields = [p.x, p.y, p.z, q.x, q.y, q.z, q.w];
                for (tag, value) in INTERLEAVED_TAGS.iter().zip(fields) {
                    out.push(*tag);
                    out.extend_from_slice(&value.to_be_bytes());
                }
            }
        }

        debug_assert_eq!(out.len(), self.record_size());
        Record::from(out)
    }
}

// Callers have already checked the record length against the layout size.
fn read_f32_be(data: &[u8], offset: usize) -> f32 {
    f32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

fn read_f64_be(data: &[u8], offset: usize) -> f64 {
    f64::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
        data[offset + 4],
        data[offset + 5],
        data[offset + 6],
        data[offset + 7],
    ])
}
