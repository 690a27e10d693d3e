//! Ray intersection routines for picking and queries.
//!
//! All functions take a normalized direction and a maximum parametric
//! distance, and report hits as a parametric `t` along the ray. Misses,
//! rays parallel to a slab outside its span, and negative or complex
//! intersections all come back as `None`.

use nalgebra::Vector3;

// ComplexField provides sqrt() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use crate::body::BodyId;

/// A raycast result.
#[derive(Debug, Clone)]
pub struct RayHit {
    /// The body that was hit.
    pub body: BodyId,
    /// World-space intersection point.
    pub point: Vector3<f32>,
    /// Surface normal at the intersection.
    pub normal: Vector3<f32>,
    /// Parametric distance from the ray origin.
    pub distance: f32,
}

/// Slab test against an axis-aligned box given by `min`/`max`.
///
/// Returns the entry and exit distances, clipped to `[0, t_max]`.
pub fn ray_aabb(
    origin: &Vector3<f32>,
    dir: &Vector3<f32>,
    min: &Vector3<f32>,
    max: &Vector3<f32>,
    t_max: f32,
) -> Option<(f32, f32)> {
    let mut t_enter = 0.0f32;
    let mut t_exit = t_max;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-8 {
            // Parallel to this slab: hit only if the origin lies inside it
            if o < min[axis] || o > max[axis] {
                return None;
            }
        } else {
            let inv = 1.0 / d;
            let mut t0 = (min[axis] - o) * inv;
            let mut t1 = (max[axis] - o) * inv;
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_exit < t_enter {
                return None;
            }
        }
    }

    Some((t_enter, t_exit))
}

/// Exact ray vs axis-aligned box: slab method per axis, reporting the entry
/// distance and the normal of the entered face.
///
/// An origin inside the box has no entry face and reports no hit.
pub fn ray_box(
    origin: &Vector3<f32>,
    dir: &Vector3<f32>,
    center: &Vector3<f32>,
    half: &Vector3<f32>,
    t_max: f32,
) -> Option<(f32, Vector3<f32>)> {
    let min = center - half;
    let max = center + half;

    let mut t_enter = 0.0f32;
    let mut t_exit = t_max;
    let mut enter_axis: Option<usize> = None;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-8 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
        } else {
            let inv = 1.0 / d;
            let mut t0 = (min[axis] - o) * inv;
            let mut t1 = (max[axis] - o) * inv;
            if t0 > t1 {
                core::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_enter {
                t_enter = t0;
                enter_axis = Some(axis);
            }
            t_exit = t_exit.min(t1);
            if t_exit < t_enter {
                return None;
            }
        }
    }

    let axis = enter_axis?;
    let mut normal = Vector3::zeros();
    normal[axis] = if dir[axis] > 0.0 { -1.0 } else { 1.0 };
    Some((t_enter, normal))
}

/// Exact ray vs sphere via the quadratic formula, taking the smaller
/// positive root (the exit root when the origin is inside the sphere).
pub fn ray_sphere(
    origin: &Vector3<f32>,
    dir: &Vector3<f32>,
    center: &Vector3<f32>,
    radius: f32,
    t_max: f32,
) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.norm_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }

    let sqrt_disc = disc.sqrt();
    let t_near = -b - sqrt_disc;
    let t_far = -b + sqrt_disc;
    let t = if t_near > 1e-6 { t_near } else { t_far };
    if t < 0.0 || t > t_max {
        return None;
    }
    Some(t)
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_ray_aabb_hit() {
        let (t_enter, t_exit) = ray_aabb(
            &Vector3::new(-5.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::new(-1.0, -1.0, -1.0),
            &Vector3::new(1.0, 1.0, 1.0),
            100.0,
        )
        .unwrap();
        assert!(approx_eq(t_enter, 4.0));
        assert!(approx_eq(t_exit, 6.0));
    }

    #[test]
    fn test_ray_aabb_miss() {
        let result = ray_aabb(
            &Vector3::new(-5.0, 5.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::new(-1.0, -1.0, -1.0),
            &Vector3::new(1.0, 1.0, 1.0),
            100.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_aabb_parallel_outside_slab() {
        // Travelling along X at y = 2, box spans y in [-1, 1]
        let result = ray_aabb(
            &Vector3::new(-5.0, 2.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::new(-1.0, -1.0, -1.0),
            &Vector3::new(1.0, 1.0, 1.0),
            100.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_aabb_behind_origin() {
        let result = ray_aabb(
            &Vector3::new(5.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::new(-1.0, -1.0, -1.0),
            &Vector3::new(1.0, 1.0, 1.0),
            100.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_aabb_respects_t_max() {
        let result = ray_aabb(
            &Vector3::new(-5.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::new(-1.0, -1.0, -1.0),
            &Vector3::new(1.0, 1.0, 1.0),
            3.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_box_entry_face_normal() {
        let (t, normal) = ray_box(
            &Vector3::new(-5.0, 0.0, 0.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::zeros(),
            &Vector3::new(1.0, 1.0, 1.0),
            100.0,
        )
        .unwrap();
        assert!(approx_eq(t, 4.0));
        assert!(approx_eq(normal.x, -1.0));
        assert!(approx_eq(normal.y, 0.0));
    }

    #[test]
    fn test_ray_box_from_above() {
        let (t, normal) = ray_box(
            &Vector3::new(0.0, 10.0, 0.0),
            &Vector3::new(0.0, -1.0, 0.0),
            &Vector3::zeros(),
            &Vector3::new(2.0, 1.0, 2.0),
            100.0,
        )
        .unwrap();
        assert!(approx_eq(t, 9.0));
        assert!(approx_eq(normal.y, 1.0));
    }

    #[test]
    fn test_ray_box_origin_inside_reports_none() {
        let result = ray_box(
            &Vector3::zeros(),
            &Vector3::new(1.0, 0.0, 0.0),
            &Vector3::zeros(),
            &Vector3::new(1.0, 1.0, 1.0),
            100.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_sphere_smaller_positive_root() {
        let t = ray_sphere(
            &Vector3::new(0.0, 0.0, -10.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::zeros(),
            1.0,
            100.0,
        )
        .unwrap();
        assert!(approx_eq(t, 9.0));
    }

    #[test]
    fn test_ray_sphere_miss() {
        let result = ray_sphere(
            &Vector3::new(0.0, 5.0, -10.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::zeros(),
            1.0,
            100.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_sphere_behind_origin() {
        let result = ray_sphere(
            &Vector3::new(0.0, 0.0, 10.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::zeros(),
            1.0,
            100.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_ray_sphere_origin_inside_takes_exit_root() {
        let t = ray_sphere(
            &Vector3::zeros(),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::zeros(),
            1.0,
            100.0,
        )
        .unwrap();
        assert!(approx_eq(t, 1.0));
    }

    #[test]
    fn test_ray_sphere_respects_t_max() {
        let result = ray_sphere(
            &Vector3::new(0.0, 0.0, -10.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::zeros(),
            1.0,
            5.0,
        );
        assert!(result.is_none());
    }
}
