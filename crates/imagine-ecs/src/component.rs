use std::any::{Any, TypeId};

use crate::entity::EntityId;
use crate::error::EcsError;
use crate::resource::Resources;

/// Marker trait for types that can be stored as ECS components.
pub trait Component: 'static + Send + Sync {}

/// Blanket implementation: any `'static + Send + Sync` type is a valid component.
impl<T: 'static + Send + Sync> Component for T {}

/// Hook run synchronously, exactly once, right after a component is attached.
///
/// It receives the world's resources so it can react to world-level state
/// (for example the current viewport size).
pub type OnAdd<T> = fn(EntityId, &mut T, &Resources);

/// Identifies a component type at runtime. The name only feeds diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TypeKey {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeKey {
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// Type-erased component storage interface.
///
/// Everything that does not need the concrete component type goes through
/// here: destroying an entity, membership tests for group intersection, and
/// introspection.
pub(crate) trait ComponentStorage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove(&mut self, entity: EntityId) -> bool;
    fn contains(&self, entity: EntityId) -> bool;
    fn entities(&self) -> &[EntityId];
    fn len(&self) -> usize;
    /// Size in bytes of one stored component.
    fn component_size(&self) -> usize;
    fn type_name(&self) -> &'static str;
}

/// Sparse-set storage for a single component type. Provides O(1) insert/remove/lookup
/// and dense iteration.
pub struct SparseSet<T> {
    /// Maps entity id → dense index. `None` means the entity has no component.
    sparse: Vec<Option<usize>>,
    /// Packed component values.
    dense: Vec<T>,
    /// Entity ids corresponding to each dense slot (for iteration and swap-remove).
    entities: Vec<EntityId>,
    on_add: Option<OnAdd<T>>,
}

impl<T: Component> SparseSet<T> {
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
            on_add: None,
        }
    }

    pub(crate) fn with_hook(on_add: Option<OnAdd<T>>) -> Self {
        Self {
            on_add,
            ..Self::new()
        }
    }

    pub(crate) fn on_add(&self) -> Option<OnAdd<T>> {
        self.on_add
    }

    fn dense_index(&self, entity: EntityId) -> Option<usize> {
        self.sparse.get(entity.index()).copied().flatten()
    }

    /// Insert a component for an entity that does not have one yet.
    ///
    /// On conflict the new value is dropped and the stored one is left as is.
    pub fn insert(&mut self, entity: EntityId, value: T) -> Result<&mut T, EcsError> {
        if self.dense_index(entity).is_some() {
            return Err(EcsError::already_has::<T>(entity));
        }
        let idx = entity.index();
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }
        let dense_idx = self.dense.len();
        self.sparse[idx] = Some(dense_idx);
        self.dense.push(value);
        self.entities.push(entity);
        Ok(&mut self.dense[dense_idx])
    }

    /// Get an immutable reference to the component for an entity.
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.dense_index(entity).map(|dense_idx| &self.dense[dense_idx])
    }

    /// Get a mutable reference to the component for an entity.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.dense_index(entity)
            .map(|dense_idx| &mut self.dense[dense_idx])
    }

    /// Remove and return the component of an entity.
    ///
    /// The last dense element is swapped into the freed slot and its sparse
    /// entry patched, so the operation is O(1).
    pub fn take(&mut self, entity: EntityId) -> Option<T> {
        let dense_idx = self.dense_index(entity)?;
        self.sparse[entity.index()] = None;

        let last = self.dense.len() - 1;
        if dense_idx != last {
            let moved = self.entities[last];
            self.sparse[moved.index()] = Some(dense_idx);
        }
        self.entities.swap_remove(dense_idx);
        Some(self.dense.swap_remove(dense_idx))
    }

    /// Iterate over all (entity, &component) pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterate over all (entity, &mut component) pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}

impl<T: Component> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage for SparseSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove(&mut self, entity: EntityId) -> bool {
        self.take(entity).is_some()
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.dense_index(entity).is_some()
    }

    fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn component_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
