use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use imagine_ecs::EntityId;

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Scene`](crate::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

impl SceneId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lightweight handle naming an entity inside one scene.
///
/// The handle does not own anything. Using it with another scene, or after
/// the entity was destroyed, yields `UnknownEntity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: EntityId,
    scene: SceneId,
}

impl Entity {
    pub(crate) fn new(id: EntityId, scene: SceneId) -> Self {
        Self { id, scene }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn scene_id(&self) -> SceneId {
        self.scene
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@scene{}", self.id, self.scene.0)
    }
}
