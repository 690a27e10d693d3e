//! The physics simulation world.
//!
//! Owns the body set and drives the fixed-timestep loop: gravity and
//! damping, semi-implicit Euler integration, broad phase (uniform grid or
//! brute force), narrow phase, the iterative impulse solver with Baumgarte
//! positional correction, and kinematic advancement. Also hosts raycast
//! queries and the debug statistics consumed by a host overlay.
//!
//! Everything is single-threaded and synchronous: a step runs to completion
//! inside `update` and the only external control is the `enabled` flag.
//! Given identical initial state and `update` inputs, body and pair
//! iteration orders are fixed (insertion order; grid mode:
//! bucket-first-touch then insertion order), so runs are deterministic.

use core::fmt::{self, Write};

use nalgebra::Vector3;

// ComplexField provides sqrt() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use crate::body::{BodyId, BodyType, RigidBody};
use crate::collision::{check_collision, Contact};
use crate::grid::SpatialGrid;
use crate::ray::{self, RayHit};
use crate::shape::Shape;

/// Fixed numerical drag applied to awake dynamic bodies every step; not
/// physically derived.
const LINEAR_DAMPING: f32 = 0.99;
const ANGULAR_DAMPING: f32 = 0.95;

/// Penetration tolerated before positional correction kicks in.
const PENETRATION_SLOP: f32 = 0.01;
/// Fraction of the residual penetration removed per solver pass.
const CORRECTION_PERCENT: f32 = 0.2;

const DEFAULT_FIXED_DT: f32 = 1.0 / 60.0;
const DEFAULT_ITERATIONS: u32 = 10;
const DEFAULT_GRID_CELL_SIZE: f32 = 5.0;

/// Debug counters for a host-side overlay.
#[derive(Debug, Clone, Copy)]
pub struct WorldStats {
    /// Active bodies.
    pub bodies: usize,
    /// Active dynamic bodies currently awake.
    pub awake: usize,
    /// Active bodies currently asleep.
    pub sleeping: usize,
    /// Contacts produced by the last step's narrow phase.
    pub contacts: usize,
    /// Fixed steps taken since creation.
    pub steps: u64,
    /// Simulated time accumulated in fixed steps.
    pub simulated_time: f32,
    /// Gravity magnitude.
    pub gravity: f32,
    pub enabled: bool,
}

/// The physics simulation world.
///
/// `N` is the compile-time body capacity. Per-step scratch capacity (pair
/// candidates and contacts) is set by the `C` const generic on
/// [`update`](PhysicsWorld::update) / [`step`](PhysicsWorld::step).
///
/// # Example
/// ```
/// use k3d_physics::{BodyType, Material, PhysicsWorld, RigidBody, Shape};
/// use nalgebra::Vector3;
///
/// let mut world = PhysicsWorld::<16>::new();
///
/// let ball = RigidBody::new(
///     Shape::Sphere { radius: 0.5 },
///     BodyType::Dynamic,
///     Material::default(),
/// )
/// .with_position(Vector3::new(0.0, 10.0, 0.0));
/// let id = world.add_body(ball).unwrap();
///
/// let floor = RigidBody::new(
///     Shape::Box { half_extents: Vector3::new(10.0, 0.5, 10.0) },
///     BodyType::Static,
///     Material::default(),
/// )
/// .with_position(Vector3::new(0.0, -0.5, 0.0));
/// world.add_body(floor).unwrap();
///
/// // One display frame's worth of fixed steps. `32` caps contacts per step.
/// world.update::<32>(1.0 / 60.0);
/// assert!(world.body(id).unwrap().position.y < 10.0);
/// ```
pub struct PhysicsWorld<'a, const N: usize> {
    bodies: heapless::Vec<RigidBody<'a>, N>,
    grid: SpatialGrid<N>,
    gravity: Vector3<f32>,
    fixed_dt: f32,
    grid_cell_size: f32,
    /// Number of passes the solver makes over the full contact list per step.
    pub solver_iterations: u32,
    /// When false, `update` is a complete no-op and bodies stay frozen.
    pub enabled: bool,
    /// Broad phase selection: uniform grid when true, brute force otherwise.
    pub use_spatial_grid: bool,
    last_contact_count: usize,
    step_count: u64,
    simulated_time: f32,
}

impl<'a, const N: usize> PhysicsWorld<'a, N> {
    /// Create a world with default configuration: gravity `(0, -9.81, 0)`,
    /// 1/60 s fixed timestep, 10 solver iterations, brute-force broad phase.
    pub fn new() -> Self {
        Self {
            bodies: heapless::Vec::new(),
            grid: SpatialGrid::new(),
            gravity: Vector3::new(0.0, -9.81, 0.0),
            fixed_dt: DEFAULT_FIXED_DT,
            grid_cell_size: DEFAULT_GRID_CELL_SIZE,
            solver_iterations: DEFAULT_ITERATIONS,
            enabled: true,
            use_spatial_grid: false,
            last_contact_count: 0,
            step_count: 0,
            simulated_time: 0.0,
        }
    }

    /// Set the gravity vector.
    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.gravity = gravity;
    }

    /// Returns the current gravity vector.
    pub fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    /// Set the fixed timestep. Non-positive values are ignored.
    pub fn set_fixed_timestep(&mut self, dt: f32) {
        if dt > 0.0 {
            self.fixed_dt = dt;
        }
    }

    pub fn fixed_timestep(&self) -> f32 {
        self.fixed_dt
    }

    /// Set the broad-phase grid cell size. Non-positive values are ignored.
    pub fn set_grid_cell_size(&mut self, size: f32) {
        if size > 0.0 {
            self.grid_cell_size = size;
        }
    }

    pub fn grid_cell_size(&self) -> f32 {
        self.grid_cell_size
    }

    /// Add a body to the world. Returns its [`BodyId`], or `None` if at
    /// capacity.
    pub fn add_body(&mut self, body: RigidBody<'a>) -> Option<BodyId> {
        let id = BodyId(self.bodies.len());
        self.bodies.push(body).ok()?;
        Some(id)
    }

    /// Remove a body from the simulation.
    ///
    /// The slot is deactivated rather than compacted so existing
    /// [`BodyId`]s stay valid; motion state is zeroed. Returns `true` if
    /// the body was found and active.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        if let Some(body) = self.bodies.get_mut(id.0) {
            if body.active {
                body.active = false;
                body.velocity = Vector3::zeros();
                body.angular_velocity = Vector3::zeros();
                body.force = Vector3::zeros();
                body.torque = Vector3::zeros();
                return true;
            }
        }
        false
    }

    /// Get an immutable reference to a body by its ID.
    pub fn body(&self, id: BodyId) -> Option<&RigidBody<'a>> {
        self.bodies.get(id.0)
    }

    /// Get a mutable reference to a body by its ID.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody<'a>> {
        self.bodies.get_mut(id.0)
    }

    /// Returns the total number of body slots (including inactive).
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Returns the number of active bodies.
    pub fn active_body_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.active).count()
    }

    /// Iterate over all bodies immutably.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &RigidBody<'a>)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    /// Iterate over all bodies mutably.
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BodyId, &mut RigidBody<'a>)> {
        self.bodies
            .iter_mut()
            .enumerate()
            .map(|(i, b)| (BodyId(i), b))
    }

    /// Fixed steps taken since creation.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulated time accumulated in fixed steps.
    pub fn simulated_time(&self) -> f32 {
        self.simulated_time
    }

    /// Advance the simulation by at most `floor(delta_time / fixed_dt)`
    /// fixed steps. A complete no-op while disabled.
    ///
    /// Leftover time below one fixed step is dropped rather than carried
    /// across calls, so hosts ticking slightly under the fixed rate will
    /// observe the simulation running slow. `C` caps contacts per step.
    pub fn update<const C: usize>(&mut self, delta_time: f32) {
        if !self.enabled {
            return;
        }
        let mut remaining = delta_time;
        while remaining >= self.fixed_dt {
            self.step::<C>(self.fixed_dt);
            remaining -= self.fixed_dt;
        }
    }

    /// Run one discrete simulation step.
    ///
    /// Strict phase order: gravity + damping, integration (with sleep
    /// bookkeeping), broad phase, narrow phase, iterative solve, kinematic
    /// advance.
    pub fn step<const C: usize>(&mut self, dt: f32) {
        let gravity = self.gravity;

        // 1. Gravity and velocity damping for awake dynamic bodies.
        for body in self.bodies.iter_mut() {
            if body.active && body.body_type == BodyType::Dynamic && !body.sleeping {
                body.force += gravity * body.mass;
                body.velocity *= LINEAR_DAMPING;
                body.angular_velocity *= ANGULAR_DAMPING;
            }
        }

        // 2. Integration.
        for body in self.bodies.iter_mut() {
            if body.active && body.body_type == BodyType::Dynamic && !body.sleeping {
                body.integrate(dt);
            }
        }

        // 3. Broad phase.
        let pairs: heapless::Vec<(usize, usize), C> = if self.use_spatial_grid {
            self.grid.rebuild(&self.bodies, self.grid_cell_size);
            self.grid.pairs::<C>()
        } else {
            self.brute_force_pairs::<C>()
        };

        // 4. Narrow phase. Pairs containing a ghost are skipped entirely.
        let mut contacts: heapless::Vec<Contact, C> = heapless::Vec::new();
        for &(i, j) in pairs.iter() {
            let a = &self.bodies[i];
            let b = &self.bodies[j];
            if a.is_ghost() || b.is_ghost() {
                continue;
            }
            if let Some(contact) = check_collision(a, b, BodyId(i), BodyId(j)) {
                let _ = contacts.push(contact);
            }
        }
        self.last_contact_count = contacts.len();

        // 5. Iterative impulse relaxation over the whole manifold list.
        for _ in 0..self.solver_iterations {
            for contact in contacts.iter() {
                self.resolve_contact(contact);
            }
        }

        // 6. Kinematic bodies move by their velocity, untouched by the solver.
        for body in self.bodies.iter_mut() {
            if body.active && body.body_type == BodyType::Kinematic {
                body.position += body.velocity * dt;
                body.update_aabb();
            }
        }

        self.step_count += 1;
        self.simulated_time += dt;
    }

    /// Brute-force candidate pairs: all unordered active pairs in insertion
    /// order.
    fn brute_force_pairs<const C: usize>(&self) -> heapless::Vec<(usize, usize), C> {
        let mut pairs = heapless::Vec::new();
        let len = self.bodies.len();
        for i in 0..len {
            if !self.bodies[i].active {
                continue;
            }
            for j in (i + 1)..len {
                if !self.bodies[j].active {
                    continue;
                }
                let _ = pairs.push((i, j));
            }
        }
        pairs
    }

    /// Resolve a single contact: normal impulse, friction impulse, then
    /// positional correction.
    ///
    /// Impulses are linear-only (no contact-point torque) and are applied
    /// directly to the velocities of dynamic, awake bodies; the solver path
    /// never touches sleep state. Separating contacts receive no impulse
    /// but are still positionally corrected. Pairs with zero combined
    /// inverse mass are immovable and skipped outright.
    pub(crate) fn resolve_contact(&mut self, contact: &Contact) {
        let a = contact.body_a.0;
        let b = contact.body_b.0;

        let inv_mass_a = self.bodies[a].inv_mass;
        let inv_mass_b = self.bodies[b].inv_mass;
        let inv_mass_sum = inv_mass_a + inv_mass_b;
        if inv_mass_sum == 0.0 {
            return;
        }

        let normal = contact.normal;
        let rv = self.bodies[b].velocity - self.bodies[a].velocity;
        let vel_along_normal = rv.dot(&normal);

        // Impulses only when the bodies approach each other.
        if vel_along_normal <= 0.0 {
            let j = -(1.0 + contact.restitution) * vel_along_normal / inv_mass_sum;
            let impulse = normal * j;
            if self.responds(a) {
                self.bodies[a].velocity -= impulse * inv_mass_a;
            }
            if self.responds(b) {
                self.bodies[b].velocity += impulse * inv_mass_b;
            }

            // Friction along the tangent of the post-impulse relative velocity.
            let rv = self.bodies[b].velocity - self.bodies[a].velocity;
            let tangent_vel = rv - normal * rv.dot(&normal);
            let tangent_speed = tangent_vel.norm();
            if tangent_speed > 1e-6 {
                let tangent = tangent_vel / tangent_speed;
                let jt = -rv.dot(&tangent) / inv_mass_sum * contact.friction;
                let friction_impulse = tangent * jt;
                if self.responds(a) {
                    self.bodies[a].velocity -= friction_impulse * inv_mass_a;
                }
                if self.responds(b) {
                    self.bodies[b].velocity += friction_impulse * inv_mass_b;
                }
            }
        }

        // Positional correction: remove residual penetration beyond the slop.
        let correction_mag =
            (contact.penetration - PENETRATION_SLOP).max(0.0) / inv_mass_sum * CORRECTION_PERCENT;
        if correction_mag > 0.0 {
            let correction = normal * correction_mag;
            if self.responds(a) {
                self.bodies[a].position -= correction * inv_mass_a;
                self.bodies[a].update_aabb();
            }
            if self.responds(b) {
                self.bodies[b].position += correction * inv_mass_b;
                self.bodies[b].update_aabb();
            }
        }
    }

    /// Whether the body at `index` absorbs solver output: dynamic and awake.
    #[inline]
    fn responds(&self, index: usize) -> bool {
        let body = &self.bodies[index];
        body.body_type == BodyType::Dynamic && !body.sleeping
    }

    /// Cast a ray from `from` to `to` and return the closest hit, if any.
    ///
    /// Every active body is tested: a slab check against its cached AABB
    /// first, then the exact shape intersection (box and sphere; capsule
    /// and mesh report a placeholder hit at the midpoint of the AABB span
    /// with an up normal). Hits beyond the segment are discarded.
    pub fn raycast(&self, from: Vector3<f32>, to: Vector3<f32>) -> Option<RayHit> {
        let delta = to - from;
        let length = delta.norm();
        if length <= 1e-6 {
            return None;
        }
        let dir = delta / length;

        let mut best: Option<RayHit> = None;
        for (index, body) in self.bodies.iter().enumerate() {
            if !body.active {
                continue;
            }
            let span = match ray::ray_aabb(&from, &dir, &body.aabb_min, &body.aabb_max, length) {
                Some(span) => span,
                None => continue,
            };

            let hit = match &body.shape {
                Shape::Box { half_extents } => {
                    ray::ray_box(&from, &dir, &body.position, half_extents, length)
                }
                Shape::Sphere { radius } => {
                    ray::ray_sphere(&from, &dir, &body.position, *radius, length).map(|t| {
                        let point = from + dir * t;
                        (t, (point - body.position) / *radius)
                    })
                }
                _ => {
                    // Placeholder: midpoint of the AABB-confirmed span, up normal
                    let t = 0.5 * (span.0 + span.1);
                    Some((t, Vector3::new(0.0, 1.0, 0.0)))
                }
            };

            if let Some((t, normal)) = hit {
                let closer = best.as_ref().map_or(true, |h| t < h.distance);
                if closer {
                    best = Some(RayHit {
                        body: BodyId(index),
                        point: from + dir * t,
                        normal,
                        distance: t,
                    });
                }
            }
        }
        best
    }

    /// Snapshot of the debug counters.
    pub fn debug_stats(&self) -> WorldStats {
        let mut awake = 0;
        let mut sleeping = 0;
        for body in self.bodies.iter().filter(|b| b.active) {
            if body.sleeping {
                sleeping += 1;
            } else if body.body_type == BodyType::Dynamic {
                awake += 1;
            }
        }
        WorldStats {
            bodies: self.active_body_count(),
            awake,
            sleeping,
            contacts: self.last_contact_count,
            steps: self.step_count,
            simulated_time: self.simulated_time,
            gravity: self.gravity.norm(),
            enabled: self.enabled,
        }
    }

    /// Write the overlay text: world counters plus a per-body
    /// position/velocity summary.
    pub fn write_summary<W: Write>(&self, out: &mut W) -> fmt::Result {
        let stats = self.debug_stats();
        writeln!(
            out,
            "bodies: {} ({} asleep)  contacts: {}",
            stats.bodies, stats.sleeping, stats.contacts
        )?;
        writeln!(
            out,
            "gravity: {:.2}  enabled: {}  t: {:.2}s ({} steps)",
            stats.gravity, stats.enabled, stats.simulated_time, stats.steps
        )?;
        for (id, body) in self.bodies() {
            if !body.active {
                continue;
            }
            writeln!(
                out,
                "#{} pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2})",
                id.0,
                body.position.x,
                body.position.y,
                body.position.z,
                body.velocity.x,
                body.velocity.y,
                body.velocity.z
            )?;
        }
        Ok(())
    }
}
