//! Narrow-phase collision detection.
//!
//! Stateless pairwise tests producing single-point contact manifolds. Exact
//! tests exist for box/box, sphere/sphere and box/sphere; every other shape
//! pair falls back to a bounding-sphere approximation built from each
//! shape's characteristic radius. The fallback is an approximation by
//! design, not a general solution.
//!
//! Absence of collision is represented by `None`; these functions never
//! mutate their inputs and never panic.

use nalgebra::Vector3;

// ComplexField provides sqrt() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use crate::body::{BodyId, RigidBody};
use crate::shape::Shape;

/// A contact manifold between two bodies, produced and consumed within a
/// single simulation step.
#[derive(Debug, Clone)]
pub struct Contact {
    /// ID of the first body.
    pub body_a: BodyId,
    /// ID of the second body.
    pub body_b: BodyId,
    /// Unit contact normal pointing from body A toward body B.
    pub normal: Vector3<f32>,
    /// Penetration depth (positive when overlapping).
    pub penetration: f32,
    /// World-space contact point.
    pub point: Vector3<f32>,
    /// Combined restitution: `min(restitution_a, restitution_b)`.
    pub restitution: f32,
    /// Combined friction: `sqrt(friction_a * friction_b)`.
    pub friction: f32,
}

/// Test two bodies for intersection and build a contact if they overlap.
///
/// Rejects early when the cached AABBs do not overlap on all three axes,
/// then dispatches on the shape pair. The returned normal points from A
/// toward B.
pub fn check_collision(
    a: &RigidBody<'_>,
    b: &RigidBody<'_>,
    id_a: BodyId,
    id_b: BodyId,
) -> Option<Contact> {
    if !aabbs_overlap(a, b) {
        return None;
    }

    let (normal, penetration, point) = match (&a.shape, &b.shape) {
        (Shape::Box { half_extents: ha }, Shape::Box { half_extents: hb }) => {
            collide_box_box(&a.position, ha, &b.position, hb)?
        }
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
            collide_sphere_sphere(&a.position, *ra, &b.position, *rb)?
        }
        (Shape::Box { half_extents }, Shape::Sphere { radius }) => {
            collide_box_sphere(&a.position, half_extents, &b.position, *radius)?
        }
        (Shape::Sphere { radius }, Shape::Box { half_extents }) => {
            // Flip: run box-sphere with swapped order, negate the normal
            let (normal, penetration, point) =
                collide_box_sphere(&b.position, half_extents, &a.position, *radius)?;
            (-normal, penetration, point)
        }
        // Simple collision: approximate both shapes as bounding spheres
        (sa, sb) => collide_sphere_sphere(
            &a.position,
            sa.bounding_radius(),
            &b.position,
            sb.bounding_radius(),
        )?,
    };

    Some(Contact {
        body_a: id_a,
        body_b: id_b,
        normal,
        penetration,
        point,
        restitution: a.material.restitution.min(b.material.restitution),
        friction: (a.material.friction * b.material.friction).sqrt(),
    })
}

/// Cheap broad rejection: cached AABBs must overlap on every axis.
#[inline]
pub fn aabbs_overlap(a: &RigidBody<'_>, b: &RigidBody<'_>) -> bool {
    a.aabb_min.x <= b.aabb_max.x
        && a.aabb_max.x >= b.aabb_min.x
        && a.aabb_min.y <= b.aabb_max.y
        && a.aabb_max.y >= b.aabb_min.y
        && a.aabb_min.z <= b.aabb_max.z
        && a.aabb_max.z >= b.aabb_min.z
}

/// Axis-aligned box vs box.
///
/// Per-axis penetration `(ha_i + hb_i) - |delta_i|`; a collision exists iff
/// all three are positive. The normal is the world axis of minimum
/// penetration signed toward B; exact ties resolve X, then Y, then Z. The
/// contact point is the midpoint of the two body positions, a
/// simplification rather than an exact surface point.
fn collide_box_box(
    pos_a: &Vector3<f32>,
    half_a: &Vector3<f32>,
    pos_b: &Vector3<f32>,
    half_b: &Vector3<f32>,
) -> Option<(Vector3<f32>, f32, Vector3<f32>)> {
    let delta = pos_b - pos_a;

    let pen_x = half_a.x + half_b.x - delta.x.abs();
    if pen_x <= 0.0 {
        return None;
    }
    let pen_y = half_a.y + half_b.y - delta.y.abs();
    if pen_y <= 0.0 {
        return None;
    }
    let pen_z = half_a.z + half_b.z - delta.z.abs();
    if pen_z <= 0.0 {
        return None;
    }

    let point = (pos_a + pos_b) * 0.5;

    if pen_x <= pen_y && pen_x <= pen_z {
        let sign = if delta.x >= 0.0 { 1.0 } else { -1.0 };
        Some((Vector3::new(sign, 0.0, 0.0), pen_x, point))
    } else if pen_y <= pen_z {
        let sign = if delta.y >= 0.0 { 1.0 } else { -1.0 };
        Some((Vector3::new(0.0, sign, 0.0), pen_y, point))
    } else {
        let sign = if delta.z >= 0.0 { 1.0 } else { -1.0 };
        Some((Vector3::new(0.0, 0.0, sign), pen_z, point))
    }
}

/// Sphere vs sphere.
///
/// A collision exists iff `0 < distance < r_a + r_b`; exactly coincident
/// centers have no usable normal and produce no manifold.
fn collide_sphere_sphere(
    pos_a: &Vector3<f32>,
    radius_a: f32,
    pos_b: &Vector3<f32>,
    radius_b: f32,
) -> Option<(Vector3<f32>, f32, Vector3<f32>)> {
    let diff = pos_b - pos_a;
    let dist_sq = diff.norm_squared();
    let sum_r = radius_a + radius_b;

    if dist_sq >= sum_r * sum_r {
        return None;
    }
    let dist = dist_sq.sqrt();
    if dist <= 0.0 {
        return None;
    }

    let normal = diff / dist;
    let penetration = sum_r - dist;
    let point = pos_a + normal * (radius_a - penetration * 0.5);
    Some((normal, penetration, point))
}

/// Box vs sphere.
///
/// Clamps the sphere center to the box extents for the closest surface
/// point. The normal points from the box toward the sphere; when the center
/// sits exactly on the closest point it defaults to world up to avoid a
/// degenerate normalize.
fn collide_box_sphere(
    box_pos: &Vector3<f32>,
    half: &Vector3<f32>,
    sphere_pos: &Vector3<f32>,
    radius: f32,
) -> Option<(Vector3<f32>, f32, Vector3<f32>)> {
    let min = box_pos - half;
    let max = box_pos + half;

    let closest = Vector3::new(
        sphere_pos.x.clamp(min.x, max.x),
        sphere_pos.y.clamp(min.y, max.y),
        sphere_pos.z.clamp(min.z, max.z),
    );

    let diff = sphere_pos - closest;
    let dist_sq = diff.norm_squared();
    if dist_sq >= radius * radius {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 0.0 {
        diff / dist
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    };
    Some((normal, radius - dist, closest))
}
