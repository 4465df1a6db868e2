//! Imagine Scene - Scene runtime built on the Imagine ECS
//!
//! Provides:
//! - The components a 2D scene understands (sprites, circles, cameras,
//!   rigid bodies and colliders)
//! - Native behavior scripts bound to entities
//! - The per-frame orchestration: scripts, physics, rendering
//! - JSON scene persistence

pub mod camera;
pub mod components;
pub mod entity;
pub mod error;
pub mod renderer;
pub mod scene;
pub mod script;
pub mod serializer;

pub use camera::{ProjectionType, SceneCamera, Viewport};
pub use components::{
    BoxCollider2D, Camera, CircleCollider2D, CircleRenderer, IdComponent, Name, RigidBody2D,
    SpriteRenderer,
};
pub use entity::{Entity, SceneId};
pub use error::SceneError;
pub use renderer::Renderer2D;
pub use scene::Scene;
pub use script::{NativeScript, ScriptContext, ScriptFactory, ScriptableEntity};
pub use serializer::SceneSerializer;

pub use imagine_core::Transform;
pub use imagine_physics::BodyType;
