use crate::entity::EntityId;

/// Recoverable errors raised by entity and component operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("component type `{0}` is already registered")]
    DuplicateRegistration(&'static str),

    #[error("entity {entity} already has a `{component}` component")]
    AlreadyHasComponent {
        entity: EntityId,
        component: &'static str,
    },

    #[error("entity {entity} has no `{component}` component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },

    #[error("entity {0} is not alive")]
    UnknownEntity(EntityId),
}

impl EcsError {
    pub(crate) fn missing<T>(entity: EntityId) -> Self {
        Self::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn already_has<T>(entity: EntityId) -> Self {
        Self::AlreadyHasComponent {
            entity,
            component: std::any::type_name::<T>(),
        }
    }
}
