use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::component::TypeKey;
use crate::entity::EntityId;

/// Entities holding every component of a type tuple, as of the moment the
/// group was read.
///
/// A group is an immutable snapshot: cloning it is cheap and the world may be
/// mutated while iterating. Entities destroyed during the iteration remain in
/// the snapshot, so callers that mutate structure should re-check liveness.
#[derive(Clone, Debug)]
pub struct Group {
    entities: Arc<[EntityId]>,
}

impl Group {
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    pub fn first(&self) -> Option<EntityId> {
        self.entities.first().copied()
    }

    pub fn as_slice(&self) -> &[EntityId] {
        &self.entities
    }
}

impl<'a> IntoIterator for &'a Group {
    type Item = EntityId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, EntityId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter().copied()
    }
}

struct CachedGroup {
    entities: Group,
    dirty: bool,
}

/// Cache of computed groups keyed by the sorted set of their component types.
///
/// Writers only flag entries dirty; the intersection is recomputed on the
/// next read, so a burst of mutations within a frame costs one rebuild.
#[derive(Default)]
pub(crate) struct GroupCache {
    entries: HashMap<Vec<TypeId>, CachedGroup>,
    rebuilds: u64,
}

impl GroupCache {
    /// Flag every cached group that involves `type_id`.
    pub fn invalidate(&mut self, type_id: TypeId) {
        for (types, entry) in &mut self.entries {
            if types.contains(&type_id) {
                entry.dirty = true;
            }
        }
    }

    /// Flag every cached group that still lists one of `removed`.
    pub fn prune(&mut self, removed: &HashSet<EntityId>) {
        if removed.is_empty() {
            return;
        }
        for entry in self.entries.values_mut() {
            if !entry.dirty && entry.entities.iter().any(|e| removed.contains(&e)) {
                entry.dirty = true;
            }
        }
    }

    /// Return the cached group for `keys`, recomputing it with `build` if it
    /// is missing or dirty.
    pub fn get_or_build(
        &mut self,
        keys: &[TypeKey],
        build: impl FnOnce() -> Vec<EntityId>,
    ) -> Group {
        let mut types: Vec<TypeId> = keys.iter().map(|key| key.id).collect();
        types.sort();
        types.dedup();

        if let Some(entry) = self.entries.get(&types) {
            if !entry.dirty {
                return entry.entities.clone();
            }
        }

        self.rebuilds += 1;
        let group = Group {
            entities: build().into(),
        };
        self.entries.insert(
            types,
            CachedGroup {
                entities: group.clone(),
                dirty: false,
            },
        );
        group
    }

    /// How many times any group was computed.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
