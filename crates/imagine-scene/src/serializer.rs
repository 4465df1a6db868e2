//! JSON persistence for scenes
//!
//! A scene document holds the scene name and one entry per entity carrying a
//! persistent id. Transient entity ids and runtime state (physics bodies,
//! script instances) are never written.

use std::fs;
use std::path::Path;

use imagine_core::{PersistentId, Transform};
use imagine_ecs::{Component, EntityId, World};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::components::{
    BoxCollider2D, Camera, CircleCollider2D, CircleRenderer, IdComponent, Name, RigidBody2D,
    SpriteRenderer,
};
use crate::error::SceneError;
use crate::scene::Scene;

#[derive(Debug, Serialize, Deserialize)]
struct SceneDocument {
    scene: String,
    #[serde(default)]
    entities: Vec<EntityDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntityDocument {
    id: PersistentId,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sprite_renderer: Option<SpriteRenderer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    circle_renderer: Option<CircleRenderer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    camera: Option<Camera>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rigid_body_2d: Option<RigidBody2D>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    box_collider_2d: Option<BoxCollider2D>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    circle_collider_2d: Option<CircleCollider2D>,
}

fn cloned<T: Component + Clone>(world: &World, entity: EntityId) -> Option<T> {
    world.get_component::<T>(entity).ok().cloned()
}

/// Reads and writes scenes as JSON documents.
pub struct SceneSerializer;

impl SceneSerializer {
    /// Serialize every entity that has a persistent id, in creation order.
    pub fn serialize_to_string(scene: &Scene) -> Result<String, SceneError> {
        let world = scene.world();
        // dense order is shuffled by swap-remove; ids are allocated in order
        let mut identified: Vec<_> = world.storage::<IdComponent>().iter().collect();
        identified.sort_unstable_by_key(|&(entity, _)| entity);
        let entities = identified
            .into_iter()
            .map(|(entity, id)| EntityDocument {
                id: id.id,
                name: world
                    .get_component::<Name>(entity)
                    .map(|name| name.0.clone())
                    .unwrap_or_default(),
                transform: cloned(world, entity),
                sprite_renderer: cloned(world, entity),
                circle_renderer: cloned(world, entity),
                camera: cloned(world, entity),
                rigid_body_2d: cloned(world, entity),
                box_collider_2d: cloned(world, entity),
                circle_collider_2d: cloned(world, entity),
            })
            .collect();

        let document = SceneDocument {
            scene: scene.name().to_owned(),
            entities,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Load a document into `scene`, appending its entities. Returns the
    /// number of entities created.
    pub fn deserialize_from_str(scene: &mut Scene, text: &str) -> Result<usize, SceneError> {
        let document: SceneDocument = serde_json::from_str(text)?;
        scene.set_name(document.scene);

        let count = document.entities.len();
        for entry in document.entities {
            let entity = scene.create_entity_with_uuid(entry.id.as_uuid(), &entry.name);
            if let Some(transform) = entry.transform {
                *scene.get_component_mut::<Transform>(entity)? = transform;
            }
            if let Some(sprite) = entry.sprite_renderer {
                scene.add_component(entity, sprite)?;
            }
            if let Some(circle) = entry.circle_renderer {
                scene.add_component(entity, circle)?;
            }
            if let Some(camera) = entry.camera {
                scene.add_component(entity, camera)?;
            }
            if let Some(rigid_body) = entry.rigid_body_2d {
                scene.add_component(entity, rigid_body)?;
            }
            if let Some(collider) = entry.box_collider_2d {
                scene.add_component(entity, collider)?;
            }
            if let Some(collider) = entry.circle_collider_2d {
                scene.add_component(entity, collider)?;
            }
        }

        info!(scene = scene.name(), entities = count, "deserialized scene");
        Ok(count)
    }

    pub fn save(scene: &Scene, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let path = path.as_ref();
        let text = Self::serialize_to_string(scene)?;
        fs::write(path, text).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(scene = scene.name(), path = ?path, "saved scene");
        Ok(())
    }

    pub fn load(scene: &mut Scene, path: impl AsRef<Path>) -> Result<usize, SceneError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::deserialize_from_str(scene, &text)
    }
}
