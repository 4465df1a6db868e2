#![allow(private_interfaces)]

use crate::component::{Component, SparseSet, TypeKey};
use crate::entity::EntityId;
use crate::error::EcsError;
use crate::manager::{downcast_mut, ComponentManager};

/// A tuple of component types used for groups and multi-component access.
///
/// Implemented for tuples of one to eight [`Component`] types:
///
/// ```ignore
/// for entity in &world.group::<(Transform, SpriteRenderer)>() {
///     let (transform, sprite) = world.get_components::<(Transform, SpriteRenderer)>(entity)?;
/// }
/// ```
pub trait ComponentSet: 'static {
    /// Shared references to every member, in tuple order.
    type Refs<'w>;
    /// Mutable references to every member, in tuple order.
    type Muts<'w>;
    /// The typed store of every member, in tuple order.
    type Stores<'w>;
    /// Mutable variant of [`ComponentSet::Stores`].
    type StoresMut<'w>;

    #[doc(hidden)]
    fn keys() -> Vec<TypeKey>;

    /// Fetch every member for `entity`, failing on the first one that is absent.
    fn fetch(components: &ComponentManager, entity: EntityId) -> Result<Self::Refs<'_>, EcsError>;

    /// Resolve every member's store once, for loops over a whole group.
    fn stores(components: &ComponentManager) -> Self::Stores<'_>;

    /// Mutable variant of [`ComponentSet::stores`].
    ///
    /// # Panics
    /// Panics if the same type appears twice in the tuple.
    fn stores_mut(components: &mut ComponentManager) -> Self::StoresMut<'_>;

    /// Mutable variant of [`ComponentSet::fetch`].
    ///
    /// # Panics
    /// Panics if the same type appears twice in the tuple.
    fn fetch_mut(
        components: &mut ComponentManager,
        entity: EntityId,
    ) -> Result<Self::Muts<'_>, EcsError>;
}

macro_rules! impl_component_set {
    ($($name:ident $var:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Refs<'w> = ($(&'w $name,)+);
            type Muts<'w> = ($(&'w mut $name,)+);
            type Stores<'w> = ($(&'w SparseSet<$name>,)+);
            type StoresMut<'w> = ($(&'w mut SparseSet<$name>,)+);

            fn keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$name>()),+]
            }

            fn fetch(
                components: &ComponentManager,
                entity: EntityId,
            ) -> Result<Self::Refs<'_>, EcsError> {
                Ok(($(components.get::<$name>(entity)?,)+))
            }

            fn stores(components: &ComponentManager) -> Self::Stores<'_> {
                ($(components.storage::<$name>(),)+)
            }

            fn stores_mut(components: &mut ComponentManager) -> Self::StoresMut<'_> {
                let mut stores = components.disjoint_mut(&Self::keys()).into_iter();
                $(
                    let $var = match stores.next() {
                        Some(store) => downcast_mut::<$name>(store),
                        None => unreachable!("one store per tuple member"),
                    };
                )+
                ($($var,)+)
            }

            fn fetch_mut(
                components: &mut ComponentManager,
                entity: EntityId,
            ) -> Result<Self::Muts<'_>, EcsError> {
                let ($($var,)+) = Self::stores_mut(components);
                Ok(($(
                    $var.get_mut(entity)
                        .ok_or_else(|| EcsError::missing::<$name>(entity))?,
                )+))
            }
        }
    };
}

impl_component_set!(A a);
impl_component_set!(A a, B b);
impl_component_set!(A a, B b, C c);
impl_component_set!(A a, B b, C c, D d);
impl_component_set!(A a, B b, C c, D d, E e);
impl_component_set!(A a, B b, C c, D d, E e, F f);
impl_component_set!(A a, B b, C c, D d, E e, F f, G g);
impl_component_set!(A a, B b, C c, D d, E e, F f, G g, H h);
