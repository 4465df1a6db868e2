//! Core value types used throughout the Imagine engine

use std::fmt;

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an entity that survives serialization.
///
/// The in-memory entity id handed out by the ECS is transient and may differ
/// between two loads of the same scene; this one does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistentId(pub Uuid);

impl PersistentId {
    /// Create a new random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an id from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PersistentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PersistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Transform component representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Compute the model matrix for this transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Rotation around the Z axis in radians, the only rotation a planar
    /// simulation cares about.
    pub fn angle_z(&self) -> f32 {
        let (_, _, z) = self.rotation.to_euler(EulerRot::XYZ);
        z
    }

    /// Replace the Z rotation while keeping the X and Y components.
    pub fn set_angle_z(&mut self, angle: f32) {
        let (x, y, _) = self.rotation.to_euler(EulerRot::XYZ);
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, angle);
    }
}

/// RGBA color with floating point components (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    /// Create a color from RGB values (alpha = 1.0)
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from a hex value (0xRRGGBB)
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_matrix() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let matrix = transform.matrix();
        let translation = matrix.col(3).truncate();
        assert_eq!(translation, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_angle_z_roundtrip() {
        let mut transform = Transform::default();
        transform.set_angle_z(0.75);
        assert!((transform.angle_z() - 0.75).abs() < 1e-5);

        transform.set_angle_z(-1.2);
        assert!((transform.angle_z() + 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_persistent_id_unique() {
        assert_ne!(PersistentId::new(), PersistentId::new());
    }

    #[test]
    fn test_color_from_hex() {
        let color = Color::from_hex(0xFF8000);
        assert!((color.r - 1.0).abs() < 0.01);
        assert!((color.g - 0.5).abs() < 0.01);
        assert!((color.b - 0.0).abs() < 0.01);
    }
}
