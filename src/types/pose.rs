//! Decoded pose samples

use serde::{Deserialize, Serialize};

/// Position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion, components in W, X, Y, Z order.
///
/// Unit norm is not enforced; decoded values are passed through exactly as received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// No rotation
    pub const IDENTITY: Quaternion = Quaternion { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Euclidean norm of the four components.
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One decoded telemetry sample, as consumed by the visualization layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PoseSample {
    pub position: Vector3,
    pub orientation: Quaternion,
    /// Main engine thrust, when the layout carries it
    pub thrust: Option<f64>,
    /// Gimbal angles about X and Y, when the layout carries them
    pub gimbal: Option<[f64; 2]>,
}

impl PoseSample {
    /// Create a sample without actuator channels.
    pub const fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self { position, orientation, thrust: None, gimbal: None }
    }

    /// Attach thrust and gimbal channels.
    pub const fn with_actuators(mut self, thrust: f64, gimbal: [f64; 2]) -> Self {
        self.thrust = Some(thrust);
        self.gimbal = Some(gimbal);
        self
    }
}
