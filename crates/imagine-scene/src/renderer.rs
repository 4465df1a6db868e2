use glam::Mat4;
use imagine_core::{Color, Transform};
use imagine_ecs::EntityId;

use crate::camera::SceneCamera;
use crate::components::SpriteRenderer;

/// Sink for the draw calls a scene emits each frame.
///
/// Every frame that renders at all is bracketed by one `begin_*` call and one
/// `end_scene`; sprites are submitted before circles.
pub trait Renderer2D {
    /// Start a runtime frame seen through a scene camera.
    fn begin_scene(&mut self, camera: &SceneCamera, camera_transform: &Transform);

    /// Start an editor frame with a precomputed view-projection matrix.
    fn begin_editor_scene(&mut self, view_projection: Mat4);

    fn draw_sprite(&mut self, transform: &Mat4, sprite: &SpriteRenderer, entity: EntityId);

    fn draw_circle(
        &mut self,
        transform: &Mat4,
        color: Color,
        thickness: f32,
        fade: f32,
        entity: EntityId,
    );

    fn end_scene(&mut self);
}
