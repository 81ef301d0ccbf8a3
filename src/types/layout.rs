//! Wire layouts for pose records

use serde::{Deserialize, Serialize};

/// Numeric width of each field in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FieldWidth {
    /// 4-byte IEEE 754 float
    F32,
    /// 8-byte IEEE 754 double
    F64,
}

impl FieldWidth {
    /// Size of one field in bytes.
    pub const fn size(self) -> usize {
        match self {
            FieldWidth::F32 => 4,
            FieldWidth::F64 => 8,
        }
    }
}

/// Record layout agreed on by both ends of the connection.
///
/// All layouts are big-endian. Tag bytes are reserved padding: they are written with
/// a fixed label and never inspected on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum RecordLayout {
    /// `[x, y, z, qW, qX, qY, qZ, thrust, gimbalX, gimbalY]` as f32, no tags (40 bytes)
    #[default]
    Packed32,

    /// tag, `x, y, z` f64, tag, `qW, qX, qY, qZ` f64 (58 bytes)
    Tagged64,

    /// Seven `(tag, f64)` pairs in the order `x, y, z, qX, qY, qZ, qW` (63 bytes)
    Interleaved64,
}

impl RecordLayout {
    /// Exact size of one record in bytes.
    pub const fn record_size(self) -> usize {
        self.tag_bytes() + self.field_count() * self.field_width().size()
    }

    /// Width of every numeric field.
    pub const fn field_width(self) -> FieldWidth {
        match self {
            RecordLayout::Packed32 => FieldWidth::F32,
            RecordLayout::Tagged64 | RecordLayout::Interleaved64 => FieldWidth::F64,
        }
    }

    /// Number of numeric fields.
    pub const fn field_count(self) -> usize {
        match self {
            RecordLayout::Packed32 => 10,
            RecordLayout::Tagged64 | RecordLayout::Interleaved64 => 7,
        }
    }

    /// Number of reserved tag bytes.
    pub const fn tag_bytes(self) -> usize {
        match self {
            RecordLayout::Packed32 => 0,
            RecordLayout::Tagged64 => 2,
            RecordLayout::Interleaved64 => 7,
        }
    }

    /// Whether records in this layout carry thrust and gimbal channels.
    pub const fn has_actuators(self) -> bool {
        matches!(self, RecordLayout::Packed32)
    }
}
