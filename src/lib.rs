//! Rigid body physics core for embedded 3D engines.
//!
//! Provides rigid body dynamics with linear and angular motion, gravity,
//! broad/narrow-phase collision detection, impulse-based response with
//! friction and positional correction, sleeping, and raycasting.
//!
//! Designed for `no_std` environments using fixed-capacity `heapless`
//! collections; the rendering layer is expected to read each body's
//! `position` and `orientation` once per display frame and never mutate
//! simulation state.
//!
//! # Shapes
//! Each body carries a [`Shape`]:
//! - [`Shape::Sphere`] and [`Shape::Box`] have exact pairwise tests
//! - [`Shape::Capsule`] and [`Shape::Mesh`] are approximated as bounding
//!   spheres by the fallback collision path
//!
//! # Example
//! ```
//! use k3d_physics::{BodyType, Material, PhysicsWorld, RigidBody, Shape};
//! use nalgebra::Vector3;
//!
//! let mut world = PhysicsWorld::<16>::new();
//!
//! let ball = RigidBody::new(
//!     Shape::Sphere { radius: 0.5 },
//!     BodyType::Dynamic,
//!     Material::default(),
//! )
//! .with_position(Vector3::new(0.0, 10.0, 0.0));
//! let id = world.add_body(ball).unwrap();
//!
//! let floor = RigidBody::new(
//!     Shape::Box { half_extents: Vector3::new(10.0, 0.5, 10.0) },
//!     BodyType::Static,
//!     Material::default(),
//! )
//! .with_position(Vector3::new(0.0, -0.5, 0.0));
//! world.add_body(floor).unwrap();
//!
//! // Advance by one display frame; collisions resolve automatically.
//! // The const generic `32` caps contacts per step.
//! world.update::<32>(1.0 / 60.0);
//!
//! // Pick the ball with a ray
//! let hit = world.raycast(
//!     Vector3::new(0.0, 10.0, -5.0),
//!     Vector3::new(0.0, 10.0, 5.0),
//! );
//! assert!(hit.is_some());
//! # let _ = id;
//! ```
#![no_std]

pub mod body;
pub mod collision;
pub mod grid;
pub mod ray;
pub mod shape;
pub mod world;

pub use body::{BodyId, BodyType, RigidBody};
pub use collision::{check_collision, Contact};
pub use grid::SpatialGrid;
pub use ray::RayHit;
pub use shape::{Material, Shape};
pub use world::{PhysicsWorld, WorldStats};
