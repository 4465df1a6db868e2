use std::collections::HashMap;

use glam::Mat4;
use imagine_core::{PersistentId, Transform};
use imagine_ecs::{Component, EcsError, EntityId, World};
use imagine_physics::{BodyDef, PhysicsConfig, PhysicsWorld};
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::camera::Viewport;
use crate::components::{
    on_camera_added, BoxCollider2D, Camera, CircleCollider2D, CircleRenderer, IdComponent, Name,
    RigidBody2D, SpriteRenderer,
};
use crate::entity::{Entity, SceneId};
use crate::error::SceneError;
use crate::renderer::Renderer2D;
use crate::script::{NativeScript, ScriptContext};
use crate::serializer::SceneSerializer;

/// Solver iterations per physics step.
const VELOCITY_ITERATIONS: usize = 6;
const POSITION_ITERATIONS: usize = 2;

fn register_scene_components(world: &mut World) -> Result<(), EcsError> {
    world.register_component::<IdComponent>()?;
    world.register_component::<Name>()?;
    world.register_component::<Transform>()?;
    world.register_component::<SpriteRenderer>()?;
    world.register_component::<CircleRenderer>()?;
    world.register_component_with_hook::<Camera>(on_camera_added)?;
    world.register_component::<NativeScript>()?;
    world.register_component::<RigidBody2D>()?;
    world.register_component::<BoxCollider2D>()?;
    world.register_component::<CircleCollider2D>()?;
    Ok(())
}

/// A named collection of entities plus the per-frame systems that drive them.
///
/// The scene is either stopped (editing) or running a runtime session. A
/// session owns its own physics world, created by
/// [`Scene::on_runtime_start`] and dropped by [`Scene::on_runtime_stop`].
pub struct Scene {
    id: SceneId,
    name: String,
    world: World,
    fps: f32,
    physics_config: PhysicsConfig,
    physics: Option<PhysicsWorld>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        let mut world = World::new();
        register_scene_components(&mut world).expect("fresh world has no registered components");
        world.insert_resource(Viewport::default());
        Self {
            id: SceneId::next(),
            name: name.into(),
            world,
            fps: 0.0,
            physics_config: PhysicsConfig::default(),
            physics: None,
        }
    }

    /// Use a custom gravity for future runtime sessions.
    pub fn with_physics_config(mut self, config: PhysicsConfig) -> Self {
        self.physics_config = config;
        self
    }

    /// Deep copy through the serializer. Script factories are carried over,
    /// script instances are not.
    pub fn copy(other: &Scene) -> Result<Scene, SceneError> {
        let document = SceneSerializer::serialize_to_string(other)?;
        let mut scene =
            Scene::new(other.name.clone()).with_physics_config(other.physics_config.clone());
        SceneSerializer::deserialize_from_str(&mut scene, &document)?;

        let by_uuid: HashMap<PersistentId, EntityId> = scene
            .world
            .storage::<IdComponent>()
            .iter()
            .map(|(entity, id)| (id.id, entity))
            .collect();
        for (entity, script) in other.world.storage::<NativeScript>().iter() {
            let Ok(id) = other.world.get_component::<IdComponent>(entity) else {
                continue;
            };
            if let Some(&target) = by_uuid.get(&id.id) {
                scene.world.add_component(target, script.clone())?;
            }
        }

        let viewport = other.viewport();
        scene.on_viewport_resize(viewport.width, viewport.height);
        Ok(scene)
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn viewport(&self) -> Viewport {
        self.world
            .resource::<Viewport>()
            .copied()
            .unwrap_or_default()
    }

    /// Frame rate derived from the last update's delta time.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn is_running(&self) -> bool {
        self.physics.is_some()
    }

    /// The running session's physics world.
    pub fn physics(&self) -> Option<&PhysicsWorld> {
        self.physics.as_ref()
    }

    pub fn entity_count(&self) -> usize {
        self.world.entity_count()
    }

    // ---- Entities ----

    /// Create an entity with a random persistent id, a name and a default
    /// transform.
    pub fn create_entity(&mut self, name: &str) -> Entity {
        self.create_entity_with_uuid(Uuid::new_v4(), name)
    }

    pub fn create_entity_with_uuid(&mut self, uuid: Uuid, name: &str) -> Entity {
        let id = self.world.create_entity();
        self.attach_identity(id, uuid, name)
            .expect("fresh entity has no components");
        debug!(entity = %id, %uuid, name, "created entity");
        Entity::new(id, self.id)
    }

    fn attach_identity(&mut self, id: EntityId, uuid: Uuid, name: &str) -> Result<(), EcsError> {
        self.world.add_component(
            id,
            IdComponent {
                id: PersistentId::from_uuid(uuid),
            },
        )?;
        self.world.add_component(id, Name::from(name))?;
        self.world.add_component(id, Transform::default())?;
        Ok(())
    }

    /// Handle for a raw id, if it is alive in this scene.
    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.world.is_alive(id).then(|| Entity::new(id, self.id))
    }

    /// Handles for every live entity, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.world
            .live_entities()
            .map(move |id| Entity::new(id, self.id))
    }

    pub fn find_entity_by_uuid(&self, uuid: Uuid) -> Option<Entity> {
        self.world
            .storage::<IdComponent>()
            .iter()
            .find(|(_, id)| id.id.as_uuid() == uuid)
            .map(|(entity, _)| Entity::new(entity, self.id))
    }

    pub fn is_valid(&self, entity: Entity) -> bool {
        self.resolve(entity).is_ok()
    }

    fn resolve(&self, entity: Entity) -> Result<EntityId, EcsError> {
        if entity.scene_id() == self.id && self.world.is_alive(entity.id()) {
            Ok(entity.id())
        } else {
            Err(EcsError::UnknownEntity(entity.id()))
        }
    }

    /// Destroy an entity. Handles that are stale or belong to another scene
    /// are ignored.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let Ok(id) = self.resolve(entity) else {
            return false;
        };
        debug!(entity = %id, "destroyed entity");
        self.world.destroy_entity(id)
    }

    /// Create a copy of `entity` with a fresh persistent id.
    pub fn duplicate_entity(&mut self, entity: Entity) -> Result<Entity, EcsError> {
        let source = self.resolve(entity)?;
        let name = self
            .world
            .get_component::<Name>(source)
            .map(|name| name.0.clone())
            .unwrap_or_default();
        let copy = self.create_entity(&name);
        let target = copy.id();

        self.copy_component::<Transform>(source, target)?;
        self.copy_component::<SpriteRenderer>(source, target)?;
        self.copy_component::<CircleRenderer>(source, target)?;
        self.copy_component::<Camera>(source, target)?;
        self.copy_component::<NativeScript>(source, target)?;
        self.copy_component::<RigidBody2D>(source, target)?;
        self.copy_component::<BoxCollider2D>(source, target)?;
        self.copy_component::<CircleCollider2D>(source, target)?;
        if let Ok(rigid_body) = self.world.get_component_mut::<RigidBody2D>(target) {
            rigid_body.runtime_body = None;
        }
        Ok(copy)
    }

    fn copy_component<T: Component + Clone>(
        &mut self,
        source: EntityId,
        target: EntityId,
    ) -> Result<(), EcsError> {
        if !self.world.has_component::<T>(source) {
            return Ok(());
        }
        let value = self.world.get_component::<T>(source)?.clone();
        if self.world.has_component::<T>(target) {
            *self.world.get_component_mut::<T>(target)? = value;
        } else {
            self.world.add_component(target, value)?;
        }
        Ok(())
    }

    // ---- Components ----

    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<&mut T, EcsError> {
        let id = self.resolve(entity)?;
        self.world.add_component(id, component)
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        let id = self.resolve(entity)?;
        self.world.get_component(id)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        let id = self.resolve(entity)?;
        self.world.get_component_mut(id)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.resolve(entity)
            .is_ok_and(|id| self.world.has_component::<T>(id))
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T, EcsError> {
        let id = self.resolve(entity)?;
        self.world.remove_component(id)
    }

    // ---- Runtime session ----

    /// Build the session's physics world from every entity holding a
    /// transform and a rigid body.
    pub fn on_runtime_start(&mut self) -> Result<(), SceneError> {
        if self.physics.is_some() {
            return Err(SceneError::AlreadyRunning);
        }
        let mut physics = PhysicsWorld::new(self.physics_config.clone());

        let bodies = self.world.group::<(Transform, RigidBody2D)>();
        let (transforms, rigid_bodies, boxes, circles) = self
            .world
            .storages_mut::<(Transform, RigidBody2D, BoxCollider2D, CircleCollider2D)>();
        for entity in &bodies {
            let (Some(transform), Some(rigid_body)) =
                (transforms.get(entity), rigid_bodies.get_mut(entity))
            else {
                continue;
            };
            let handle = physics.create_body(&BodyDef {
                body_type: rigid_body.body_type,
                position: transform.position.truncate(),
                angle: transform.angle_z(),
                fixed_rotation: rigid_body.fixed_rotation,
            });
            rigid_body.runtime_body = Some(handle);

            if let Some(collider) = boxes.get(entity) {
                physics.attach_shape(handle, &collider.shape_def(transform.scale.truncate()));
            }
            if let Some(collider) = circles.get(entity) {
                physics.attach_shape(handle, &collider.shape_def());
            }
        }

        info!(
            scene = %self.name,
            bodies = physics.body_count(),
            colliders = physics.collider_count(),
            "runtime started"
        );
        self.physics = Some(physics);
        Ok(())
    }

    /// Drop the session's physics world. Script instances are left in place.
    pub fn on_runtime_stop(&mut self) {
        if self.physics.take().is_none() {
            return;
        }
        for (_, rigid_body) in self.world.storage_mut::<RigidBody2D>().iter_mut() {
            rigid_body.runtime_body = None;
        }
        info!(scene = %self.name, "runtime stopped");
    }

    /// Run one runtime frame: scripts, physics, then rendering through the
    /// primary camera if there is one.
    pub fn on_update_runtime(
        &mut self,
        dt: f32,
        renderer: &mut dyn Renderer2D,
    ) -> Result<(), SceneError> {
        if self.physics.is_none() {
            return Err(SceneError::NotRunning);
        }
        self.update_fps(dt);
        self.update_scripts(dt);
        self.step_physics(dt);

        let Some(camera_entity) = self.runtime_camera() else {
            trace!(scene = %self.name, "no primary camera, skipping render");
            return Ok(());
        };
        let (camera_transform, camera) = self
            .world
            .get_components::<(Transform, Camera)>(camera_entity)?;
        let camera_transform = *camera_transform;
        let camera = camera.camera.clone();

        renderer.begin_scene(&camera, &camera_transform);
        self.render_entities(renderer);
        renderer.end_scene();
        Ok(())
    }

    /// Render every drawable entity through an editor camera. Nothing is
    /// simulated.
    pub fn on_update_editor(
        &mut self,
        dt: f32,
        view_projection: Mat4,
        renderer: &mut dyn Renderer2D,
    ) -> Result<(), SceneError> {
        self.update_fps(dt);
        renderer.begin_editor_scene(view_projection);
        self.render_entities(renderer);
        renderer.end_scene();
        Ok(())
    }

    fn update_fps(&mut self, dt: f32) {
        if dt > 0.0 {
            self.fps = 1.0 / dt;
        }
    }

    fn update_scripts(&mut self, dt: f32) {
        let scripts = self.world.group::<(NativeScript,)>();
        for entity in &scripts {
            // an earlier script may have destroyed this entity
            let Ok(script) = self.world.get_component_mut::<NativeScript>(entity) else {
                continue;
            };
            let (mut instance, created) = match script.instance.take() {
                Some(instance) => (instance, false),
                None => (script.instantiate(), true),
            };

            let mut ctx = ScriptContext::new(entity, &mut self.world);
            if created {
                debug!(entity = %entity, "instantiated script");
                instance.on_create(&mut ctx);
            }
            instance.on_update(&mut ctx, dt);

            if let Ok(script) = self.world.get_component_mut::<NativeScript>(entity) {
                script.instance = Some(instance);
            }
        }
    }

    fn step_physics(&mut self, dt: f32) {
        let Some(physics) = self.physics.as_mut() else {
            return;
        };
        physics.step(dt, VELOCITY_ITERATIONS, POSITION_ITERATIONS);

        let bodies = self.world.group::<(Transform, RigidBody2D)>();
        let (transforms, rigid_bodies) = self.world.storages_mut::<(Transform, RigidBody2D)>();
        for entity in &bodies {
            let (Some(transform), Some(rigid_body)) =
                (transforms.get_mut(entity), rigid_bodies.get(entity))
            else {
                continue;
            };
            // bodies added mid-session have no simulation counterpart
            let Some(pose) = rigid_body.runtime_body.and_then(|body| physics.pose(body)) else {
                continue;
            };
            transform.position.x = pose.position.x;
            transform.position.y = pose.position.y;
            transform.set_angle_z(pose.angle);
        }
    }

    fn runtime_camera(&mut self) -> Option<EntityId> {
        let cameras = self.world.group::<(Transform, Camera)>();
        let camera_store = self.world.storage::<Camera>();
        let found = cameras
            .iter()
            .find(|&entity| camera_store.get(entity).is_some_and(|c| c.primary));
        found
    }

    /// The first camera flagged primary.
    pub fn primary_camera_entity(&mut self) -> Option<Entity> {
        let cameras = self.world.group::<(Camera,)>();
        let camera_store = self.world.storage::<Camera>();
        let found = cameras
            .iter()
            .find(|&entity| camera_store.get(entity).is_some_and(|c| c.primary));
        found.map(|entity| Entity::new(entity, self.id))
    }

    fn render_entities(&mut self, renderer: &mut dyn Renderer2D) {
        let sprites = self.world.group::<(Transform, SpriteRenderer)>();
        let circles = self.world.group::<(Transform, CircleRenderer)>();
        let (transforms, sprite_store, circle_store) = self
            .world
            .storages::<(Transform, SpriteRenderer, CircleRenderer)>();

        for entity in &sprites {
            let (Some(transform), Some(sprite)) = (transforms.get(entity), sprite_store.get(entity))
            else {
                continue;
            };
            renderer.draw_sprite(&transform.matrix(), sprite, entity);
        }

        for entity in &circles {
            let (Some(transform), Some(circle)) = (transforms.get(entity), circle_store.get(entity))
            else {
                continue;
            };
            renderer.draw_circle(
                &transform.matrix(),
                circle.color,
                circle.thickness,
                circle.fade,
                entity,
            );
        }
    }

    /// Store the new viewport and resize every camera without a fixed aspect
    /// ratio.
    pub fn on_viewport_resize(&mut self, width: u32, height: u32) {
        self.world.insert_resource(Viewport::new(width, height));
        for (_, camera) in self.world.storage_mut::<Camera>().iter_mut() {
            if !camera.fixed_aspect_ratio {
                camera.camera.set_viewport_size(width, height);
            }
        }
    }
}
