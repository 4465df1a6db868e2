use std::any::TypeId;

use crate::component::{Component, OnAdd, SparseSet};
use crate::entity::{EntityId, EntityManager};
use crate::error::EcsError;
use crate::group::{Group, GroupCache};
use crate::manager::ComponentManager;
use crate::query::ComponentSet;
use crate::resource::Resources;

/// The central ECS container. Owns the entity allocator, the component
/// stores, the group cache and world-level resources.
///
/// Component references handed out by the world borrow it, so they cannot be
/// held across a structural change (add, remove, destroy).
#[derive(Default)]
pub struct World {
    entities: EntityManager,
    components: ComponentManager,
    groups: GroupCache,
    resources: Resources,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Registration ----

    /// Register a component type. Must happen once before the type is used.
    pub fn register_component<T: Component>(&mut self) -> Result<(), EcsError> {
        self.components.register::<T>()
    }

    /// Register a component type with a hook that runs on every attach.
    pub fn register_component_with_hook<T: Component>(
        &mut self,
        on_add: OnAdd<T>,
    ) -> Result<(), EcsError> {
        self.components.register_with_hook::<T>(on_add)
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.components.is_registered::<T>()
    }

    // ---- Entity management ----

    /// Create a new entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        self.entities.create_entity()
    }

    /// Destroy an entity and strip all of its components.
    ///
    /// Returns `false` without doing anything if the entity is not alive.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.entities.destroy_entity(entity) {
            return false;
        }
        for type_id in self.components.remove_all(entity) {
            self.groups.invalidate(type_id);
        }
        true
    }

    /// Check whether an entity is alive.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Every live entity once, in no particular order.
    pub fn live_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.live_ids()
    }

    fn ensure_alive(&self, entity: EntityId) -> Result<(), EcsError> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::UnknownEntity(entity))
        }
    }

    // ---- Component management ----

    /// Attach a component, running its on-add hook.
    pub fn add_component<T: Component>(
        &mut self,
        entity: EntityId,
        component: T,
    ) -> Result<&mut T, EcsError> {
        self.ensure_alive(entity)?;
        let added = self.components.add(entity, component, &self.resources)?;
        self.groups.invalidate(TypeId::of::<T>());
        Ok(added)
    }

    pub fn get_component<T: Component>(&self, entity: EntityId) -> Result<&T, EcsError> {
        self.ensure_alive(entity)?;
        self.components.get::<T>(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T, EcsError> {
        self.ensure_alive(entity)?;
        self.components.get_mut::<T>(entity)
    }

    /// Whether a live entity holds `T`. Dead entities hold nothing.
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity) && self.components.has::<T>(entity)
    }

    /// Detach and return a component.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<T, EcsError> {
        self.ensure_alive(entity)?;
        let removed = self.components.remove::<T>(entity)?;
        self.groups.invalidate(TypeId::of::<T>());
        Ok(removed)
    }

    /// Fetch several components of one entity at once.
    pub fn get_components<Q: ComponentSet>(&self, entity: EntityId) -> Result<Q::Refs<'_>, EcsError> {
        self.ensure_alive(entity)?;
        Q::fetch(&self.components, entity)
    }

    /// Mutable variant of [`World::get_components`]. The tuple members must
    /// be distinct types.
    pub fn get_components_mut<Q: ComponentSet>(
        &mut self,
        entity: EntityId,
    ) -> Result<Q::Muts<'_>, EcsError> {
        self.ensure_alive(entity)?;
        Q::fetch_mut(&mut self.components, entity)
    }

    /// Dense storage of one component type, for tight iteration.
    pub fn storage<T: Component>(&self) -> &SparseSet<T> {
        self.components.storage::<T>()
    }

    pub fn storage_mut<T: Component>(&mut self) -> &mut SparseSet<T> {
        self.components.storage_mut::<T>()
    }

    /// The typed stores of every member of `Q`, resolved once up front.
    pub fn storages<Q: ComponentSet>(&self) -> Q::Stores<'_> {
        Q::stores(&self.components)
    }

    /// Mutable variant of [`World::storages`]. The tuple members must be
    /// distinct types.
    pub fn storages_mut<Q: ComponentSet>(&mut self) -> Q::StoresMut<'_> {
        Q::stores_mut(&mut self.components)
    }

    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    // ---- Groups ----

    /// Entities holding every component in `Q`.
    ///
    /// The result is cached per type set and only recomputed after a
    /// structural change touched one of its types.
    ///
    /// # Example
    /// ```ignore
    /// for entity in &world.group::<(Position, Velocity)>() {
    ///     let (pos, vel) = world.get_components_mut::<(Position, Velocity)>(entity)?;
    ///     // ...
    /// }
    /// ```
    pub fn group<Q: ComponentSet>(&mut self) -> Group {
        let removed = self.entities.drain_removed();
        self.groups.prune(&removed);

        let keys = Q::keys();
        let components = &self.components;
        self.groups
            .get_or_build(&keys, || components.intersect(&keys))
    }

    /// Number of group computations so far.
    pub fn group_rebuilds(&self) -> u64 {
        self.groups.rebuilds()
    }

    /// Number of distinct type sets with a cached group.
    pub fn cached_groups(&self) -> usize {
        self.groups.len()
    }

    // ---- Resources ----

    /// Insert a singleton resource, returning the previous value.
    pub fn insert_resource<R: 'static + Send + Sync>(&mut self, value: R) -> Option<R> {
        self.resources.insert(value)
    }

    pub fn resource<R: 'static + Send + Sync>(&self) -> Option<&R> {
        self.resources.get::<R>()
    }

    pub fn resource_mut<R: 'static + Send + Sync>(&mut self) -> Option<&mut R> {
        self.resources.get_mut::<R>()
    }

    pub fn remove_resource<R: 'static + Send + Sync>(&mut self) -> Option<R> {
        self.resources.remove::<R>()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    #[derive(Debug, Clone, PartialEq)]
    struct Viewport(u32, u32);

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Lens {
        aspect: Option<f32>,
    }

    fn world() -> World {
        let mut world = World::new();
        world.register_component::<Position>().unwrap();
        world.register_component::<Velocity>().unwrap();
        world.register_component::<Name>().unwrap();
        world
    }

    #[test]
    fn create_and_destroy() {
        let mut world = world();
        let e = world.create_entity();
        assert!(world.is_alive(e));
        assert_eq!(world.entity_count(), 1);
        assert!(world.destroy_entity(e));
        assert!(!world.is_alive(e));
        assert_eq!(world.entity_count(), 0);
        assert!(!world.live_entities().any(|live| live == e));
    }

    #[test]
    fn destroy_twice_is_noop() {
        let mut world = world();
        let e = world.create_entity();
        world.add_component(e, Name("once".into())).unwrap();
        assert!(world.destroy_entity(e));
        assert!(!world.destroy_entity(e));
    }

    #[test]
    fn live_ids_unique_across_churn() {
        let mut world = world();
        let mut rng = StdRng::seed_from_u64(7);
        let mut alive = Vec::new();
        for _ in 0..500 {
            if alive.is_empty() || rng.gen_bool(0.6) {
                alive.push(world.create_entity());
            } else {
                let victim = alive.swap_remove(rng.gen_range(0..alive.len()));
                world.destroy_entity(victim);
                assert!(!world.live_entities().any(|e| e == victim));
            }
        }
        let live: HashSet<_> = world.live_entities().collect();
        assert_eq!(live.len(), world.entity_count());
        assert_eq!(live, alive.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn add_get_remove_component() {
        let mut world = world();
        let e = world.create_entity();
        world.add_component(e, Position { x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(
            world.get_component::<Position>(e),
            Ok(&Position { x: 1.0, y: 2.0 })
        );
        assert!(world.has_component::<Position>(e));
        assert_eq!(
            world.remove_component::<Position>(e),
            Ok(Position { x: 1.0, y: 2.0 })
        );
        assert!(!world.has_component::<Position>(e));
        assert!(matches!(
            world.remove_component::<Position>(e),
            Err(EcsError::MissingComponent { .. })
        ));
    }

    #[test]
    fn duplicate_add_keeps_existing_value() {
        let mut world = world();
        let e = world.create_entity();
        world.add_component(e, Name("first".into())).unwrap();
        let err = world.add_component(e, Name("second".into())).unwrap_err();
        assert!(matches!(err, EcsError::AlreadyHasComponent { .. }));
        assert_eq!(world.get_component::<Name>(e), Ok(&Name("first".into())));
    }

    #[test]
    fn component_mutation() {
        let mut world = world();
        let e = world.create_entity();
        world.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();
        world.get_component_mut::<Position>(e).unwrap().x = 5.0;
        assert_eq!(world.get_component::<Position>(e).unwrap().x, 5.0);
    }

    #[test]
    fn dead_entity_access_is_unknown() {
        let mut world = world();
        let e = world.create_entity();
        world.add_component(e, Position { x: 1.0, y: 0.0 }).unwrap();
        world.destroy_entity(e);

        assert_eq!(
            world.get_component::<Position>(e),
            Err(EcsError::UnknownEntity(e))
        );
        assert_eq!(
            world.add_component(e, Name("ghost".into())).map(|_| ()),
            Err(EcsError::UnknownEntity(e))
        );
        assert!(!world.has_component::<Position>(e));
    }

    #[test]
    fn three_entity_swap_remove() {
        let mut world = world();
        let a = world.create_entity();
        let b = world.create_entity();
        let c = world.create_entity();
        world.add_component(a, Name("a".into())).unwrap();
        world.add_component(b, Name("b".into())).unwrap();
        world.add_component(c, Name("c".into())).unwrap();

        world.remove_component::<Name>(b).unwrap();
        assert!(world.has_component::<Name>(a));
        assert!(world.has_component::<Name>(c));
        assert_eq!(world.get_component::<Name>(a), Ok(&Name("a".into())));
        assert_eq!(world.get_component::<Name>(c), Ok(&Name("c".into())));
    }

    #[test]
    fn hook_sees_resources() {
        let mut world = World::new();
        world
            .register_component_with_hook::<Lens>(|_, lens, res| {
                if let Some(Viewport(w, h)) = res.get::<Viewport>() {
                    lens.aspect = Some(*w as f32 / *h as f32);
                }
            })
            .unwrap();
        let before = world.create_entity();
        world.add_component(before, Lens::default()).unwrap();
        assert_eq!(world.get_component::<Lens>(before).unwrap().aspect, None);

        world.insert_resource(Viewport(800, 600));
        let after = world.create_entity();
        let lens = world.add_component(after, Lens::default()).unwrap();
        assert_eq!(lens.aspect, Some(800.0 / 600.0));
    }

    #[test]
    fn group_multi_component() {
        let mut world = world();
        let e1 = world.create_entity();
        let e2 = world.create_entity();
        let e3 = world.create_entity();
        world.add_component(e1, Position { x: 1.0, y: 0.0 }).unwrap();
        world.add_component(e1, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
        world.add_component(e2, Position { x: 2.0, y: 0.0 }).unwrap();
        // e2 has no velocity
        world.add_component(e3, Velocity { dx: 3.0, dy: 0.0 }).unwrap();
        // e3 has no position

        let group = world.group::<(Position, Velocity)>();
        assert_eq!(group.as_slice(), &[e1]);
    }

    #[test]
    fn group_follows_structural_changes() {
        let mut world = world();
        let e1 = world.create_entity();
        let e2 = world.create_entity();
        world.add_component(e1, Position { x: 0.0, y: 0.0 }).unwrap();
        world.add_component(e2, Position { x: 0.0, y: 0.0 }).unwrap();
        assert_eq!(world.group::<(Position,)>().len(), 2);

        world.destroy_entity(e1);
        let group = world.group::<(Position,)>();
        assert_eq!(group.as_slice(), &[e2]);

        world.remove_component::<Position>(e2).unwrap();
        assert!(world.group::<(Position,)>().is_empty());
    }

    #[test]
    fn group_rebuild_is_lazy() {
        let mut world = world();
        let e = world.create_entity();
        world.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();
        world.group::<(Position,)>();
        world.group::<(Position,)>();
        assert_eq!(world.group_rebuilds(), 1);

        for _ in 0..10 {
            let other = world.create_entity();
            world.add_component(other, Position { x: 0.0, y: 0.0 }).unwrap();
        }
        assert_eq!(world.group_rebuilds(), 1);
        assert_eq!(world.group::<(Position,)>().len(), 11);
        assert_eq!(world.group_rebuilds(), 2);

        // Unrelated types leave the cached entry alone.
        world.add_component(e, Name("n".into())).unwrap();
        world.group::<(Position,)>();
        assert_eq!(world.group_rebuilds(), 2);
    }

    #[test]
    fn group_allows_mutation_while_iterating() {
        let mut world = world();
        for i in 0..4 {
            let e = world.create_entity();
            world.add_component(e, Position { x: i as f32, y: 0.0 }).unwrap();
            world.add_component(e, Velocity { dx: 1.0, dy: 2.0 }).unwrap();
        }
        for entity in &world.group::<(Position, Velocity)>() {
            let (pos, vel) = world
                .get_components_mut::<(Position, Velocity)>(entity)
                .unwrap();
            pos.x += vel.dx;
            pos.y += vel.dy;
        }
        let ys: Vec<f32> = world.storage::<Position>().iter().map(|(_, p)| p.y).collect();
        assert_eq!(ys, vec![2.0; 4]);
    }

    #[test]
    fn group_iteration_with_resolved_stores() {
        let mut world = world();
        for i in 0..3 {
            let e = world.create_entity();
            world.add_component(e, Position { x: i as f32, y: 0.0 }).unwrap();
            world.add_component(e, Velocity { dx: 0.5, dy: -1.0 }).unwrap();
        }
        let lone = world.create_entity();
        world.add_component(lone, Position { x: 9.0, y: 9.0 }).unwrap();

        let group = world.group::<(Position, Velocity)>();
        let (positions, velocities) = world.storages_mut::<(Position, Velocity)>();
        for entity in &group {
            let (Some(pos), Some(vel)) = (positions.get_mut(entity), velocities.get(entity)) else {
                continue;
            };
            pos.x += vel.dx;
            pos.y += vel.dy;
        }

        let (positions,) = world.storages::<(Position,)>();
        assert_eq!(positions.get(lone), Some(&Position { x: 9.0, y: 9.0 }));
        let moved: Vec<f32> = group.iter().filter_map(|e| positions.get(e)).map(|p| p.y).collect();
        assert_eq!(moved, vec![-1.0; 3]);
    }

    #[test]
    fn group_matches_independent_intersection() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut world = world();
        let mut entities = Vec::new();

        for step in 0..2_000 {
            match rng.gen_range(0..10) {
                0 | 1 => entities.push(world.create_entity()),
                2 if !entities.is_empty() => {
                    let victim = entities.swap_remove(rng.gen_range(0..entities.len()));
                    world.destroy_entity(victim);
                }
                _ if !entities.is_empty() => {
                    let e = entities[rng.gen_range(0..entities.len())];
                    let add = rng.gen_bool(0.6);
                    match (rng.gen_range(0..3), add) {
                        (0, true) => drop(world.add_component(e, Position { x: 0.0, y: 0.0 })),
                        (0, false) => drop(world.remove_component::<Position>(e)),
                        (1, true) => drop(world.add_component(e, Velocity { dx: 0.0, dy: 0.0 })),
                        (1, false) => drop(world.remove_component::<Velocity>(e)),
                        (_, true) => drop(world.add_component(e, Name(String::new()))),
                        (_, false) => drop(world.remove_component::<Name>(e)),
                    }
                }
                _ => {}
            }

            if step % 50 == 0 {
                let expected: HashSet<EntityId> = world
                    .live_entities()
                    .filter(|&e| {
                        world.has_component::<Position>(e)
                            && world.has_component::<Velocity>(e)
                            && world.has_component::<Name>(e)
                    })
                    .collect();
                let group = world.group::<(Position, Velocity, Name)>();
                let actual: HashSet<EntityId> = group.iter().collect();
                assert_eq!(actual.len(), group.len(), "duplicate entity in group");
                assert_eq!(actual, expected);

                let pairs = world.group::<(Velocity, Position)>();
                let raw: HashSet<EntityId> = world
                    .storage::<Position>()
                    .iter()
                    .map(|(e, _)| e)
                    .filter(|&e| world.storage::<Velocity>().get(e).is_some())
                    .collect();
                assert_eq!(pairs.iter().collect::<HashSet<_>>(), raw);
            }
        }
    }

    #[test]
    fn resource_insert_get() {
        let mut world = World::new();
        world.insert_resource(42u32);
        assert_eq!(world.resource::<u32>(), Some(&42));
        *world.resource_mut::<u32>().unwrap() = 100;
        assert_eq!(world.resource::<u32>(), Some(&100));
        assert_eq!(world.remove_resource::<u32>(), Some(100));
    }
}
