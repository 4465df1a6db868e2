//! Imagine Core - Core types and utilities for the Imagine engine
//!
//! This crate provides the foundational types shared by the other crates:
//! - Mathematical primitives (re-exported from glam)
//! - Transform and color value types
//! - Persistent identifiers that survive a save/load cycle
//! - Frame timing for the runtime loop

pub mod time;
pub mod types;

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
pub use time::{GameTime, TimeConfig};
pub use types::{Color, PersistentId, Transform};
