//! Native behavior scripts attached to entities

use std::fmt;

use imagine_ecs::{Component, EcsError, EntityId, World};

/// Behavior attached to one entity through a [`NativeScript`] component.
///
/// `on_create` runs exactly once, on the first runtime tick that sees the
/// instance, immediately before its first `on_update`.
pub trait ScriptableEntity: Send + Sync {
    fn on_create(&mut self, _ctx: &mut ScriptContext<'_>) {}

    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) {}
}

/// Access to the bound entity and its world during a script callback.
pub struct ScriptContext<'w> {
    entity: EntityId,
    world: &'w mut World,
}

impl<'w> ScriptContext<'w> {
    pub(crate) fn new(entity: EntityId, world: &'w mut World) -> Self {
        Self { entity, world }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn get<T: Component>(&self) -> Result<&T, EcsError> {
        self.world.get_component::<T>(self.entity)
    }

    pub fn get_mut<T: Component>(&mut self) -> Result<&mut T, EcsError> {
        self.world.get_component_mut::<T>(self.entity)
    }

    pub fn has<T: Component>(&self) -> bool {
        self.world.has_component::<T>(self.entity)
    }

    pub fn world(&mut self) -> &mut World {
        &mut *self.world
    }
}

pub type ScriptFactory = fn() -> Box<dyn ScriptableEntity>;

fn instantiate_default<S: ScriptableEntity + Default + 'static>() -> Box<dyn ScriptableEntity> {
    Box::new(S::default())
}

/// Component holding a script factory and, once the runtime has ticked, the
/// live instance.
///
/// Cloning copies the factory only; the clone instantiates its own script.
pub struct NativeScript {
    factory: ScriptFactory,
    pub(crate) instance: Option<Box<dyn ScriptableEntity>>,
}

impl NativeScript {
    /// Bind a script type constructed through `Default`.
    pub fn bind<S: ScriptableEntity + Default + 'static>() -> Self {
        Self::from_factory(instantiate_default::<S>)
    }

    pub fn from_factory(factory: ScriptFactory) -> Self {
        Self {
            factory,
            instance: None,
        }
    }

    pub fn is_instantiated(&self) -> bool {
        self.instance.is_some()
    }

    pub(crate) fn instantiate(&self) -> Box<dyn ScriptableEntity> {
        (self.factory)()
    }
}

impl Clone for NativeScript {
    fn clone(&self) -> Self {
        Self::from_factory(self.factory)
    }
}

impl fmt::Debug for NativeScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeScript")
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter;

    impl ScriptableEntity for Counter {
        fn on_update(&mut self, ctx: &mut ScriptContext<'_>, _dt: f32) {
            if let Ok(count) = ctx.get_mut::<u32>() {
                *count += 1;
            }
        }
    }

    #[test]
    fn test_clone_drops_instance() {
        let mut script = NativeScript::bind::<Counter>();
        script.instance = Some(script.instantiate());
        let copy = script.clone();
        assert!(script.is_instantiated());
        assert!(!copy.is_instantiated());
    }

    #[test]
    fn test_context_reaches_bound_entity() {
        let mut world = World::new();
        world.register_component::<u32>().unwrap();
        let entity = world.create_entity();
        world.add_component(entity, 0u32).unwrap();

        let mut instance = NativeScript::bind::<Counter>().instantiate();
        let mut ctx = ScriptContext::new(entity, &mut world);
        assert_eq!(ctx.entity(), entity);
        instance.on_update(&mut ctx, 0.1);
        instance.on_update(&mut ctx, 0.1);
        assert!(ctx.has::<u32>());
        assert_eq!(world.get_component::<u32>(entity), Ok(&2));
    }
}
