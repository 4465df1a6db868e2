//! Built-in demo scene and a renderer that reports draw calls through tracing

use glam::{Mat4, Vec3};
use imagine_core::{Color, Transform};
use imagine_ecs::{Component, EntityId};
use imagine_physics::BodyType;
use imagine_scene::{
    BoxCollider2D, Camera, CircleCollider2D, CircleRenderer, Entity, NativeScript, Renderer2D,
    RigidBody2D, Scene, SceneCamera, ScriptContext, ScriptableEntity, SpriteRenderer,
};
use tracing::{debug, trace, warn};

/// Slowly rotates its entity around Z.
#[derive(Default)]
struct Spinner {
    elapsed: f32,
}

impl ScriptableEntity for Spinner {
    fn on_create(&mut self, ctx: &mut ScriptContext<'_>) {
        debug!(entity = %ctx.entity(), "spinner created");
    }

    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) {
        self.elapsed += dt;
        if let Ok(transform) = ctx.get_mut::<Transform>() {
            transform.set_angle_z(self.elapsed);
        }
    }
}

/// Ground, a falling crate, a bouncing ball, a spinning marker and a camera.
pub fn build_scene() -> Scene {
    let mut scene = Scene::new("demo");

    let ground = scene.create_entity("ground");
    if let Ok(transform) = scene.get_component_mut::<Transform>(ground) {
        transform.position = Vec3::new(0.0, -4.0, 0.0);
        transform.scale = Vec3::new(20.0, 1.0, 1.0);
    }
    attach(&mut scene, ground, SpriteRenderer { color: Color::from_hex(0x3a5f0b) });
    attach(&mut scene, ground, RigidBody2D::new(BodyType::Static));
    attach(&mut scene, ground, BoxCollider2D::default());

    let crate_entity = scene.create_entity("crate");
    if let Ok(transform) = scene.get_component_mut::<Transform>(crate_entity) {
        transform.position = Vec3::new(-1.0, 3.0, 0.0);
        transform.set_angle_z(0.3);
    }
    attach(&mut scene, crate_entity, SpriteRenderer { color: Color::from_hex(0xa0522d) });
    attach(&mut scene, crate_entity, RigidBody2D::new(BodyType::Dynamic));
    attach(&mut scene, crate_entity, BoxCollider2D::default());

    let ball = scene.create_entity("ball");
    if let Ok(transform) = scene.get_component_mut::<Transform>(ball) {
        transform.position = Vec3::new(1.5, 5.0, 0.0);
    }
    attach(&mut scene, ball, CircleRenderer { color: Color::RED, ..Default::default() });
    attach(&mut scene, ball, RigidBody2D::new(BodyType::Dynamic));
    attach(
        &mut scene,
        ball,
        CircleCollider2D {
            restitution: 0.6,
            ..Default::default()
        },
    );

    let marker = scene.create_entity("marker");
    if let Ok(transform) = scene.get_component_mut::<Transform>(marker) {
        transform.position = Vec3::new(4.0, 2.0, 0.0);
        transform.scale = Vec3::splat(0.5);
    }
    attach(&mut scene, marker, SpriteRenderer { color: Color::BLUE });
    attach(&mut scene, marker, NativeScript::bind::<Spinner>());

    let camera = scene.create_entity("camera");
    attach(&mut scene, camera, Camera::default());

    scene
}

fn attach<T: Component>(scene: &mut Scene, entity: Entity, value: T) {
    if let Err(e) = scene.add_component(entity, value) {
        warn!("Failed to build demo entity {}: {}", entity, e);
    }
}

/// Renderer that logs every draw call and keeps per-frame counts.
#[derive(Debug, Default)]
pub struct LogRenderer {
    pub frames: u64,
    sprites: usize,
    circles: usize,
}

impl Renderer2D for LogRenderer {
    fn begin_scene(&mut self, camera: &SceneCamera, camera_transform: &Transform) {
        trace!(
            aspect = camera.aspect_ratio,
            position = ?camera_transform.position,
            "begin scene"
        );
        self.sprites = 0;
        self.circles = 0;
    }

    fn begin_editor_scene(&mut self, _view_projection: Mat4) {
        trace!("begin editor scene");
        self.sprites = 0;
        self.circles = 0;
    }

    fn draw_sprite(&mut self, transform: &Mat4, sprite: &SpriteRenderer, entity: EntityId) {
        trace!(%entity, translation = ?transform.w_axis.truncate(), color = ?sprite.color, "sprite");
        self.sprites += 1;
    }

    fn draw_circle(
        &mut self,
        transform: &Mat4,
        color: Color,
        thickness: f32,
        fade: f32,
        entity: EntityId,
    ) {
        trace!(%entity, translation = ?transform.w_axis.truncate(), ?color, thickness, fade, "circle");
        self.circles += 1;
    }

    fn end_scene(&mut self) {
        self.frames += 1;
        debug!(
            frame = self.frames,
            sprites = self.sprites,
            circles = self.circles,
            "end scene"
        );
    }
}
