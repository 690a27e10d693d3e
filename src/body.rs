//! Rigid body state and per-body operations.
//!
//! A [`RigidBody`] owns its transform, velocities, accumulated forces, mass
//! properties derived from its [`Shape`](crate::shape::Shape) and
//! [`Material`](crate::shape::Material), a cached world-space AABB, and its
//! sleep state. Bodies are mutated by the world during integration and
//! collision response, and by external callers through the `apply_*` methods.

use log::warn;
use nalgebra::{UnitQuaternion, Vector3};

use crate::shape::{Material, Shape};

/// Smallest mass / inertia component a dynamic body may carry. Degenerate
/// (zero-size) shapes are clamped here instead of rejected so a frame-driven
/// simulation degrades rather than halts.
const MIN_MASS: f32 = 1e-6;

/// Linear and angular speed below which a body accumulates sleep time.
const SLEEP_LINEAR_THRESHOLD: f32 = 0.01;
const SLEEP_ANGULAR_THRESHOLD: f32 = 0.01;
/// Seconds of continuous rest before a body falls asleep.
const SLEEP_TIME: f32 = 2.0;

/// Unique identifier for a rigid body within a
/// [`PhysicsWorld`](crate::world::PhysicsWorld).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyId(pub(crate) usize);

/// Determines how a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Infinite mass, never integrated, never moved.
    Static,
    /// Moved by its velocity but unaffected by forces and collisions.
    /// Useful for platforms and other externally driven geometry.
    Kinematic,
    /// Fully simulated.
    Dynamic,
    /// Overlap volume: never integrated and skipped by collision detection,
    /// exactly like a ghost material.
    Trigger,
}

/// A rigid body with linear and angular dynamics.
#[derive(Debug, Clone)]
pub struct RigidBody<'a> {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub velocity: Vector3<f32>,
    /// Angular velocity in world space (radians per second).
    pub angular_velocity: Vector3<f32>,

    /// Derived from shape volume × material density. Zero for non-dynamic
    /// bodies.
    pub mass: f32,
    /// `1 / mass`, or zero for non-dynamic bodies.
    pub inv_mass: f32,
    /// Diagonal approximation of the inertia tensor in body space.
    pub inertia: Vector3<f32>,
    /// Componentwise reciprocal of `inertia`; zero for non-dynamic bodies.
    pub inv_inertia: Vector3<f32>,

    pub shape: Shape<'a>,
    pub body_type: BodyType,
    pub material: Material,

    /// Accumulated force, consumed and cleared by integration each step.
    pub(crate) force: Vector3<f32>,
    /// Accumulated torque, consumed and cleared by integration each step.
    pub(crate) torque: Vector3<f32>,

    pub(crate) sleeping: bool,
    pub(crate) sleep_timer: f32,

    /// World-space bounds, kept consistent with `position` and `shape` by
    /// explicit recomputation after every mutation of either.
    pub aabb_min: Vector3<f32>,
    pub aabb_max: Vector3<f32>,

    /// Inactive bodies are skipped everywhere. Cleared by
    /// [`PhysicsWorld::remove_body`](crate::world::PhysicsWorld::remove_body);
    /// the slot is preserved so other [`BodyId`]s stay valid.
    pub active: bool,
}

impl<'a> RigidBody<'a> {
    /// Create a body at the origin. Mass and inertia are derived from the
    /// shape and the material's density; non-dynamic bodies get zero mass
    /// and zero inverse mass/inertia.
    ///
    /// A dynamic body whose shape yields a non-positive mass or inertia
    /// component (zero-size box, empty mesh with zero density, ...) is
    /// clamped to a small positive minimum and a warning is logged.
    pub fn new(shape: Shape<'a>, body_type: BodyType, material: Material) -> Self {
        let (mass, inertia, inv_mass, inv_inertia) = if body_type == BodyType::Dynamic {
            let (raw_mass, raw_inertia) = shape.mass_properties(material.density);
            if raw_mass <= 0.0 || raw_inertia.x <= 0.0 || raw_inertia.y <= 0.0 || raw_inertia.z <= 0.0
            {
                warn!("degenerate shape: clamping mass/inertia to minimum");
            }
            let mass = raw_mass.max(MIN_MASS);
            let inertia = raw_inertia.map(|c| c.max(MIN_MASS));
            (
                mass,
                inertia,
                1.0 / mass,
                Vector3::new(1.0 / inertia.x, 1.0 / inertia.y, 1.0 / inertia.z),
            )
        } else {
            (0.0, Vector3::zeros(), 0.0, Vector3::zeros())
        };

        let mut body = Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            mass,
            inv_mass,
            inertia,
            inv_inertia,
            shape,
            body_type,
            material,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            sleeping: false,
            sleep_timer: 0.0,
            aabb_min: Vector3::zeros(),
            aabb_max: Vector3::zeros(),
            active: true,
        };
        body.update_aabb();
        body
    }

    /// Builder: set the initial position (refreshes the AABB).
    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self.update_aabb();
        self
    }

    /// Builder: set the initial orientation.
    pub fn with_orientation(mut self, orientation: UnitQuaternion<f32>) -> Self {
        self.orientation = orientation;
        self
    }

    /// Builder: set the initial velocity.
    pub fn with_velocity(mut self, velocity: Vector3<f32>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: set the initial angular velocity (radians per second).
    pub fn with_angular_velocity(mut self, angular_velocity: Vector3<f32>) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Whether this body is skipped by collision detection: ghost material
    /// or trigger body type.
    #[inline]
    pub fn is_ghost(&self) -> bool {
        self.material.ghost || self.body_type == BodyType::Trigger
    }

    #[inline]
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Apply a force at the center of mass. Forces accumulate until the next
    /// step. Silently ignored unless the body is dynamic and awake.
    #[inline]
    pub fn apply_force(&mut self, force: Vector3<f32>) {
        if self.body_type != BodyType::Dynamic || self.sleeping {
            return;
        }
        self.force += force;
    }

    /// Apply a force at a world-space point, accumulating the induced torque
    /// `(point - position) × force`. Silently ignored unless the body is
    /// dynamic and awake.
    pub fn apply_force_at(&mut self, force: Vector3<f32>, point: Vector3<f32>) {
        if self.body_type != BodyType::Dynamic || self.sleeping {
            return;
        }
        self.force += force;
        self.torque += (point - self.position).cross(&force);
    }

    /// Apply an instantaneous impulse at the center of mass:
    /// `delta_v = impulse / mass`. Wakes the body. Silently ignored unless
    /// the body is dynamic and awake.
    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vector3<f32>) {
        if self.body_type != BodyType::Dynamic || self.sleeping {
            return;
        }
        self.velocity += impulse * self.inv_mass;
        self.wake_up();
    }

    /// Apply an instantaneous impulse at a world-space point, updating both
    /// linear and angular velocity. Wakes the body. Silently ignored unless
    /// the body is dynamic and awake.
    pub fn apply_impulse_at(&mut self, impulse: Vector3<f32>, point: Vector3<f32>) {
        if self.body_type != BodyType::Dynamic || self.sleeping {
            return;
        }
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += (point - self.position)
            .cross(&impulse)
            .component_mul(&self.inv_inertia);
        self.wake_up();
    }

    /// Clear the sleep state. Idempotent on an awake body apart from
    /// resetting the sleep timer.
    #[inline]
    pub fn wake_up(&mut self) {
        self.sleeping = false;
        self.sleep_timer = 0.0;
    }

    /// Recompute the world-space AABB from the current position and shape.
    /// Mesh bounds are the translated extrema of the vertex set; all other
    /// shapes use their symmetric extents. Orientation is ignored (the
    /// collision model is axis-aligned).
    pub fn update_aabb(&mut self) {
        match self.shape {
            Shape::Mesh { vertices } => {
                if vertices.is_empty() {
                    self.aabb_min = self.position;
                    self.aabb_max = self.position;
                    return;
                }
                let mut min = vertices[0];
                let mut max = vertices[0];
                for v in vertices.iter().skip(1) {
                    min.x = min.x.min(v.x);
                    min.y = min.y.min(v.y);
                    min.z = min.z.min(v.z);
                    max.x = max.x.max(v.x);
                    max.y = max.y.max(v.y);
                    max.z = max.z.max(v.z);
                }
                self.aabb_min = self.position + min;
                self.aabb_max = self.position + max;
            }
            _ => {
                let ext = self.shape.extents();
                self.aabb_min = self.position - ext;
                self.aabb_max = self.position + ext;
            }
        }
    }

    /// Returns the current speed (magnitude of velocity).
    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }

    /// Returns the kinetic energy of this body: `0.5 * m * v²`.
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    /// Integrate this body forward by `dt` seconds using semi-implicit
    /// Euler: velocity from the force accumulator first, then position from
    /// the updated velocity. Orientation composes a pre-multiplied delta
    /// rotation of angle `|ω|·dt` about `ω`. Accumulators are cleared, the
    /// AABB is refreshed, and the sleep timer is updated.
    ///
    /// The world only calls this for awake dynamic bodies.
    pub(crate) fn integrate(&mut self, dt: f32) {
        self.velocity += self.force * self.inv_mass * dt;
        self.angular_velocity += self.torque.component_mul(&self.inv_inertia) * dt;
        self.position += self.velocity * dt;

        let delta = UnitQuaternion::from_scaled_axis(self.angular_velocity * dt);
        self.orientation = delta * self.orientation;

        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
        self.update_aabb();

        if self.velocity.norm() < SLEEP_LINEAR_THRESHOLD
            && self.angular_velocity.norm() < SLEEP_ANGULAR_THRESHOLD
        {
            self.sleep_timer += dt;
            if self.sleep_timer > SLEEP_TIME {
                self.sleeping = true;
            }
        } else {
            self.wake_up();
        }
    }
}
