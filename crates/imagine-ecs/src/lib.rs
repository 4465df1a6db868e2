//! Imagine ECS - Entity Component System
//!
//! Entities are plain 32-bit ids that are never reissued. Components live in
//! one sparse set per registered type, and multi-component groups are cached
//! per type set and rebuilt lazily after structural changes.

mod component;
mod entity;
mod error;
mod group;
mod manager;
mod query;
mod resource;
mod world;

pub use component::{Component, OnAdd, SparseSet};
pub use entity::{EntityId, EntityManager};
pub use error::EcsError;
pub use group::Group;
pub use manager::ComponentManager;
pub use query::ComponentSet;
pub use resource::Resources;
pub use world::World;
