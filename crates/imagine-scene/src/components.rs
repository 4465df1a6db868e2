//! Components understood by the scene runtime

use std::fmt;

use glam::Vec2;
use imagine_core::{Color, PersistentId};
use imagine_ecs::{EntityId, Resources};
use imagine_physics::{BodyHandle, BodyType, Shape, ShapeDef};
use serde::{Deserialize, Serialize};

use crate::camera::{SceneCamera, Viewport};

/// Persistent identity of a scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdComponent {
    pub id: PersistentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteRenderer {
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleRenderer {
    pub color: Color,
    pub thickness: f32,
    pub fade: f32,
}

impl Default for CircleRenderer {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            thickness: 1.0,
            fade: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub camera: SceneCamera,
    /// The first primary camera found drives runtime rendering.
    pub primary: bool,
    /// Keep the aspect ratio when the viewport resizes.
    pub fixed_aspect_ratio: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            camera: SceneCamera::default(),
            primary: true,
            fixed_aspect_ratio: false,
        }
    }
}

/// Sizes a freshly attached camera to the scene's current viewport.
pub(crate) fn on_camera_added(_entity: EntityId, camera: &mut Camera, resources: &Resources) {
    if let Some(viewport) = resources.get::<Viewport>() {
        if viewport.is_valid() {
            camera
                .camera
                .set_viewport_size(viewport.width, viewport.height);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBody2D {
    pub body_type: BodyType,
    pub fixed_rotation: bool,
    /// Body in the running session's physics world.
    #[serde(skip)]
    pub runtime_body: Option<BodyHandle>,
}

impl RigidBody2D {
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            ..Default::default()
        }
    }
}

/// Box collider. `size` holds half extents, scaled by the transform at
/// runtime start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxCollider2D {
    pub offset: Vec2,
    pub size: Vec2,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub restitution_threshold: f32,
}

impl Default for BoxCollider2D {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            size: Vec2::splat(0.5),
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            restitution_threshold: 0.5,
        }
    }
}

impl BoxCollider2D {
    pub(crate) fn shape_def(&self, scale: Vec2) -> ShapeDef {
        ShapeDef {
            shape: Shape::Box {
                half_extents: self.size * scale,
                offset: self.offset,
            },
            density: self.density,
            friction: self.friction,
            restitution: self.restitution,
            restitution_threshold: self.restitution_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleCollider2D {
    pub offset: Vec2,
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub restitution_threshold: f32,
}

impl Default for CircleCollider2D {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            radius: 0.5,
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            restitution_threshold: 0.5,
        }
    }
}

impl CircleCollider2D {
    /// The radius is used as authored; the transform's scale does not apply.
    pub(crate) fn shape_def(&self) -> ShapeDef {
        ShapeDef {
            shape: Shape::Circle {
                radius: self.radius,
                offset: self.offset,
            },
            density: self.density,
            friction: self.friction,
            restitution: self.restitution,
            restitution_threshold: self.restitution_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_shape_scales_half_extents() {
        let collider = BoxCollider2D::default();
        let def = collider.shape_def(Vec2::new(2.0, 4.0));
        assert_eq!(
            def.shape,
            Shape::Box {
                half_extents: Vec2::new(1.0, 2.0),
                offset: Vec2::ZERO
            }
        );
        assert_eq!(def.density, 1.0);
    }

    #[test]
    fn test_circle_shape_keeps_authored_radius() {
        let collider = CircleCollider2D {
            offset: Vec2::new(0.5, 0.0),
            radius: 0.75,
            ..Default::default()
        };
        match collider.shape_def().shape {
            Shape::Circle { radius, offset } => {
                assert_eq!(radius, 0.75);
                assert_eq!(offset, Vec2::new(0.5, 0.0));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_camera_hook_ignores_empty_viewport() {
        let entity = EntityId::from_raw(1).unwrap();
        let mut resources = Resources::new();
        let mut camera = Camera::default();
        on_camera_added(entity, &mut camera, &resources);
        assert_eq!(camera.camera.aspect_ratio, 1.0);

        resources.insert(Viewport::new(0, 600));
        on_camera_added(entity, &mut camera, &resources);
        assert_eq!(camera.camera.aspect_ratio, 1.0);

        resources.insert(Viewport::new(1600, 800));
        on_camera_added(entity, &mut camera, &resources);
        assert_eq!(camera.camera.aspect_ratio, 2.0);
    }

    #[test]
    fn test_runtime_body_is_not_serialized() {
        let body = RigidBody2D::new(BodyType::Dynamic);
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("runtime_body"));
        let back: RigidBody2D = serde_json::from_str(&json).unwrap();
        assert_eq!(back.body_type, BodyType::Dynamic);
        assert!(back.runtime_body.is_none());
    }
}
