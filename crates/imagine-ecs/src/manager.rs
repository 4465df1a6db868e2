use std::any::TypeId;
use std::collections::HashMap;

use crate::component::{Component, ComponentStorage, OnAdd, SparseSet, TypeKey};
use crate::entity::EntityId;
use crate::error::EcsError;
use crate::resource::Resources;

/// Registry of component stores, one [`SparseSet`] per registered type.
///
/// The set of component types is open at runtime: any [`Component`] can be
/// registered once, after which the typed API resolves its store through a
/// `TypeId` lookup and a single downcast.
///
/// Accessing a type that was never registered is a programmer error and
/// panics; everything else reports an [`EcsError`].
#[derive(Default)]
pub struct ComponentManager {
    indices: HashMap<TypeId, usize>,
    stores: Vec<Box<dyn ComponentStorage>>,
}

impl ComponentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type without an on-add hook.
    pub fn register<T: Component>(&mut self) -> Result<(), EcsError> {
        self.register_store::<T>(None)
    }

    /// Register a component type whose hook runs every time it is attached.
    pub fn register_with_hook<T: Component>(&mut self, on_add: OnAdd<T>) -> Result<(), EcsError> {
        self.register_store::<T>(Some(on_add))
    }

    fn register_store<T: Component>(&mut self, on_add: Option<OnAdd<T>>) -> Result<(), EcsError> {
        let key = TypeKey::of::<T>();
        if self.indices.contains_key(&key.id) {
            return Err(EcsError::DuplicateRegistration(key.name));
        }
        tracing::trace!(component = key.name, "registered component type");
        self.indices.insert(key.id, self.stores.len());
        self.stores.push(Box::new(SparseSet::<T>::with_hook(on_add)));
        Ok(())
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.indices.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered component types.
    pub fn registered_count(&self) -> usize {
        self.stores.len()
    }

    /// Name, per-component byte size and population of every registered type.
    pub fn describe(&self) -> impl Iterator<Item = (&'static str, usize, usize)> + '_ {
        self.stores
            .iter()
            .map(|store| (store.type_name(), store.component_size(), store.len()))
    }

    fn index_of(&self, key: TypeKey) -> usize {
        match self.indices.get(&key.id) {
            Some(&index) => index,
            None => panic!("component type `{}` was never registered", key.name),
        }
    }

    pub(crate) fn erased(&self, key: TypeKey) -> &dyn ComponentStorage {
        &*self.stores[self.index_of(key)]
    }

    /// The typed store for `T`.
    ///
    /// # Panics
    /// Panics if `T` was never registered.
    pub fn storage<T: Component>(&self) -> &SparseSet<T> {
        downcast_ref(self.erased(TypeKey::of::<T>()))
    }

    /// The typed store for `T`, mutably.
    ///
    /// # Panics
    /// Panics if `T` was never registered.
    pub fn storage_mut<T: Component>(&mut self) -> &mut SparseSet<T> {
        let index = self.index_of(TypeKey::of::<T>());
        downcast_mut(&mut *self.stores[index])
    }

    /// Attach `value` to `entity` and run the type's on-add hook.
    ///
    /// The returned reference borrows the manager, so it cannot outlive the
    /// next structural change of any store.
    pub fn add<T: Component>(
        &mut self,
        entity: EntityId,
        value: T,
        resources: &Resources,
    ) -> Result<&mut T, EcsError> {
        let store = self.storage_mut::<T>();
        let on_add = store.on_add();
        let component = store.insert(entity, value)?;
        if let Some(hook) = on_add {
            hook(entity, &mut *component, resources);
        }
        Ok(component)
    }

    pub fn get<T: Component>(&self, entity: EntityId) -> Result<&T, EcsError> {
        self.storage::<T>()
            .get(entity)
            .ok_or_else(|| EcsError::missing::<T>(entity))
    }

    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T, EcsError> {
        self.storage_mut::<T>()
            .get_mut(entity)
            .ok_or_else(|| EcsError::missing::<T>(entity))
    }

    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.erased(TypeKey::of::<T>()).contains(entity)
    }

    /// Detach and return the component of `entity`.
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Result<T, EcsError> {
        self.storage_mut::<T>()
            .take(entity)
            .ok_or_else(|| EcsError::missing::<T>(entity))
    }

    /// Strip every component from `entity`, returning the affected types.
    pub(crate) fn remove_all(&mut self, entity: EntityId) -> Vec<TypeId> {
        let mut touched = Vec::new();
        for (type_id, &index) in &self.indices {
            if self.stores[index].remove(entity) {
                touched.push(*type_id);
            }
        }
        touched
    }

    /// Mutable access to several distinct stores at once, in the order asked.
    ///
    /// # Panics
    /// Panics if a type is unregistered or requested twice.
    pub(crate) fn disjoint_mut(
        &mut self,
        keys: &[TypeKey],
    ) -> Vec<&mut (dyn ComponentStorage + 'static)> {
        let wanted: Vec<usize> = keys.iter().map(|&key| self.index_of(key)).collect();
        for (position, index) in wanted.iter().enumerate() {
            assert!(
                !wanted[..position].contains(index),
                "component type `{}` requested twice in one tuple",
                keys[position].name
            );
        }

        let mut slots: Vec<Option<&mut (dyn ComponentStorage + 'static)>> =
            wanted.iter().map(|_| None).collect();
        for (index, store) in self.stores.iter_mut().enumerate() {
            if let Some(position) = wanted.iter().position(|&w| w == index) {
                slots[position] = Some(&mut **store);
            }
        }
        slots.into_iter().flatten().collect()
    }

    /// Entities present in every store named by `keys`.
    ///
    /// Starts from the smallest store and keeps its dense order, filtering by
    /// membership in the others.
    pub(crate) fn intersect(&self, keys: &[TypeKey]) -> Vec<EntityId> {
        let mut stores: Vec<&dyn ComponentStorage> =
            keys.iter().map(|&key| self.erased(key)).collect();
        stores.sort_by_key(|store| store.len());

        let Some((smallest, rest)) = stores.split_first() else {
            return Vec::new();
        };
        smallest
            .entities()
            .iter()
            .copied()
            .filter(|&entity| rest.iter().all(|store| store.contains(entity)))
            .collect()
    }
}

pub(crate) fn downcast_ref<T: Component>(store: &dyn ComponentStorage) -> &SparseSet<T> {
    store
        .as_any()
        .downcast_ref::<SparseSet<T>>()
        .expect("component type mismatch")
}

pub(crate) fn downcast_mut<T: Component>(store: &mut dyn ComponentStorage) -> &mut SparseSet<T> {
    store
        .as_any_mut()
        .downcast_mut::<SparseSet<T>>()
        .expect("component type mismatch")
}
