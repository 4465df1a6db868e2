//! Imagine Physics - Planar rigid-body simulation using rapier3d
//!
//! Bodies live in the XY plane: translation along Z and rotation around X
//! and Y are locked, so every pose is a 2D position plus an angle around Z.

use std::num::NonZeroUsize;

use glam::Vec2;
use nalgebra::UnitQuaternion;
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

/// Half thickness given to shapes along the locked Z axis.
const SHAPE_HALF_DEPTH: f32 = 0.5;

/// Mass of a dynamic body that has no shape attached.
pub const DEFAULT_BODY_MASS: f32 = 1.0;

/// How a body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves.
    #[default]
    Static,
    /// Driven by forces and gravity.
    Dynamic,
    /// Moved by velocity only, unaffected by forces.
    Kinematic,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Physics world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity vector (default: -9.81 on Y axis)
    pub gravity: Vec2,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
        }
    }
}

/// Initial state of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    /// Rotation around Z in radians.
    pub angle: f32,
    /// Lock rotation entirely.
    pub fixed_rotation: bool,
}

/// Collision geometry relative to the body origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Box { half_extents: Vec2, offset: Vec2 },
    Circle { radius: f32, offset: Vec2 },
}

/// A shape plus its material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDef {
    pub shape: Shape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Accepted for format compatibility; rapier has no per-collider
    /// restitution threshold, so it does not influence the simulation.
    pub restitution_threshold: f32,
}

/// Position and Z rotation of a body after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub angle: f32,
}

/// Opaque handle to a body owned by a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

/// The physics world containing all simulation state for one session
pub struct PhysicsWorld {
    /// Configuration
    pub config: PhysicsConfig,

    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,

    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    /// Create an empty world with the given gravity
    pub fn new(config: PhysicsConfig) -> Self {
        tracing::debug!(gravity = ?config.gravity, "creating physics world");
        Self {
            config,
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Add a body in its initial pose
    pub fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let mut builder = RigidBodyBuilder::new(def.body_type.to_rapier())
            .translation(vector![def.position.x, def.position.y, 0.0])
            .rotation(vector![0.0, 0.0, def.angle])
            .enabled_translations(true, true, false);
        builder = if def.fixed_rotation {
            builder.lock_rotations()
        } else {
            builder.enabled_rotations(false, false, true)
        };
        if def.body_type == BodyType::Dynamic {
            // Mass until the first shape is attached
            builder = builder.additional_mass(DEFAULT_BODY_MASS);
        }
        BodyHandle(self.rigid_body_set.insert(builder.build()))
    }

    /// Attach collision geometry to a body. Returns `false` if the body does
    /// not belong to this world.
    pub fn attach_shape(&mut self, body: BodyHandle, def: &ShapeDef) -> bool {
        let Some(rigid_body) = self.rigid_body_set.get_mut(body.0) else {
            return false;
        };
        if rigid_body.colliders().is_empty() {
            // Shapes carry the mass from now on
            rigid_body.set_additional_mass(0.0, true);
        }
        let builder = match def.shape {
            Shape::Box {
                half_extents,
                offset,
            } => ColliderBuilder::cuboid(half_extents.x, half_extents.y, SHAPE_HALF_DEPTH)
                .translation(vector![offset.x, offset.y, 0.0]),
            Shape::Circle { radius, offset } => {
                ColliderBuilder::ball(radius).translation(vector![offset.x, offset.y, 0.0])
            }
        };
        let collider = builder
            .density(def.density)
            .friction(def.friction)
            .restitution(def.restitution)
            .build();
        self.collider_set
            .insert_with_parent(collider, body.0, &mut self.rigid_body_set);
        true
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// `velocity_iterations` maps to rapier's solver iterations and
    /// `position_iterations` to its stabilization iterations.
    pub fn step(&mut self, dt: f32, velocity_iterations: usize, position_iterations: usize) {
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(velocity_iterations).unwrap_or(NonZeroUsize::MIN);
        self.integration_parameters.num_internal_stabilization_iterations = position_iterations;

        let gravity = vector![self.config.gravity.x, self.config.gravity.y, 0.0];

        self.physics_pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Current pose of a body
    pub fn pose(&self, body: BodyHandle) -> Option<Pose> {
        let rigid_body = self.rigid_body_set.get(body.0)?;
        let translation = rigid_body.translation();
        let rotation: &UnitQuaternion<f32> = rigid_body.rotation();
        let (_, _, angle) = rotation.euler_angles();
        Some(Pose {
            position: Vec2::new(translation.x, translation.y),
            angle,
        })
    }

    /// Current linear velocity of a body
    pub fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.rigid_body_set
            .get(body.0)
            .map(|rigid_body| Vec2::new(rigid_body.linvel().x, rigid_body.linvel().y))
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn unit_box() -> ShapeDef {
        ShapeDef {
            shape: Shape::Box {
                half_extents: Vec2::splat(0.5),
                offset: Vec2::ZERO,
            },
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            restitution_threshold: 0.5,
        }
    }

    fn body(body_type: BodyType, position: Vec2) -> BodyDef {
        BodyDef {
            body_type,
            position,
            angle: 0.0,
            fixed_rotation: false,
        }
    }

    #[test]
    fn test_default_gravity() {
        let world = PhysicsWorld::default();
        assert_eq!(world.config.gravity, Vec2::new(0.0, -9.81));
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = PhysicsWorld::default();
        let handle = world.create_body(&body(BodyType::Dynamic, Vec2::new(0.0, 5.0)));
        assert!(world.attach_shape(handle, &unit_box()));

        world.step(DT, 6, 2);

        let pose = world.pose(handle).unwrap();
        assert!(pose.position.y < 5.0);
        assert!(world.linear_velocity(handle).unwrap().y < 0.0);
    }

    #[test]
    fn test_dynamic_body_without_shape_falls() {
        let mut world = PhysicsWorld::default();
        let handle = world.create_body(&body(BodyType::Dynamic, Vec2::new(0.0, 10.0)));
        assert_eq!(world.collider_count(), 0);

        world.step(DT, 6, 2);

        assert!(world.pose(handle).unwrap().position.y < 10.0);
    }

    #[test]
    fn test_shape_replaces_default_mass() {
        let mut world = PhysicsWorld::default();
        let handle = world.create_body(&body(BodyType::Dynamic, Vec2::ZERO));
        let heavy = ShapeDef {
            density: 2.0,
            ..unit_box()
        };
        assert!(world.attach_shape(handle, &heavy));

        world.step(DT, 6, 2);

        let mass = world.rigid_body_set.get(handle.0).unwrap().mass();
        assert!((mass - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_static_body_stays() {
        let mut world = PhysicsWorld::default();
        let handle = world.create_body(&body(BodyType::Static, Vec2::new(1.0, 2.0)));
        world.attach_shape(handle, &unit_box());
        for _ in 0..10 {
            world.step(DT, 6, 2);
        }
        assert_eq!(world.pose(handle).unwrap().position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_initial_angle_roundtrip() {
        let mut world = PhysicsWorld::default();
        let mut def = body(BodyType::Static, Vec2::ZERO);
        def.angle = 0.4;
        let handle = world.create_body(&def);
        assert!((world.pose(handle).unwrap().angle - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_circle_shape_and_counts() {
        let mut world = PhysicsWorld::default();
        let handle = world.create_body(&body(BodyType::Kinematic, Vec2::ZERO));
        let circle = ShapeDef {
            shape: Shape::Circle {
                radius: 0.5,
                offset: Vec2::new(0.1, 0.0),
            },
            ..unit_box()
        };
        assert!(world.attach_shape(handle, &circle));
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.collider_count(), 1);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut world = PhysicsWorld::default();
        let handle = world.create_body(&body(BodyType::Dynamic, Vec2::new(0.0, 3.0)));
        world.attach_shape(handle, &unit_box());
        world.step(0.0, 6, 2);
        assert_eq!(world.pose(handle).unwrap().position.y, 3.0);
    }

    #[test]
    fn test_bodies_are_world_scoped() {
        let mut first = PhysicsWorld::default();
        let handle = first.create_body(&body(BodyType::Dynamic, Vec2::ZERO));
        let mut second = PhysicsWorld::default();
        assert!(second.pose(handle).is_none());
        assert!(!second.attach_shape(handle, &unit_box()));
    }
}
