//! Collision shapes and surface materials.
//!
//! A [`Shape`] describes the collision geometry attached to a body and is
//! immutable once the body is constructed. Mass and inertia are derived
//! analytically from the shape and the material's density.
//!
//! Mesh shapes borrow their vertex slice, so geometry can live in flash or
//! in a host-owned buffer without copies.

use log::warn;
use nalgebra::Vector3;

/// Collision geometry for a rigid body.
///
/// All shapes are centered on the body's position. The capsule axis is the
/// body-local Y axis; `height` is the length of the cylindrical section
/// (total capsule height is `height + 2 * radius`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    /// A box defined by half-extents along each axis.
    Box { half_extents: Vector3<f32> },
    /// A sphere defined by its radius.
    Sphere { radius: f32 },
    /// A capsule: cylinder of `height` capped by two hemispheres of `radius`.
    Capsule { radius: f32, height: f32 },
    /// An arbitrary vertex cloud. Collision treats it as a bounding sphere;
    /// mass properties are a unit placeholder (see [`Shape::mass_properties`]).
    Mesh { vertices: &'a [Vector3<f32>] },
}

impl Shape<'_> {
    /// Half-size of the axis-aligned bound around the shape at identity
    /// orientation. For meshes this is the componentwise maximum absolute
    /// coordinate (a symmetric bound; the per-body AABB uses the true
    /// vertex extrema instead).
    pub fn extents(&self) -> Vector3<f32> {
        match self {
            Shape::Box { half_extents } => *half_extents,
            Shape::Sphere { radius } => Vector3::new(*radius, *radius, *radius),
            Shape::Capsule { radius, height } => {
                Vector3::new(*radius, 0.5 * height + radius, *radius)
            }
            Shape::Mesh { vertices } => {
                let mut ext: Vector3<f32> = Vector3::zeros();
                for v in vertices.iter() {
                    ext.x = ext.x.max(v.x.abs());
                    ext.y = ext.y.max(v.y.abs());
                    ext.z = ext.z.max(v.z.abs());
                }
                ext
            }
        }
    }

    /// Characteristic radius used by the bounding-sphere fallback collision
    /// path: the smallest sphere around the shape's center containing it.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Shape::Box { half_extents } => half_extents.norm(),
            Shape::Sphere { radius } => *radius,
            Shape::Capsule { radius, height } => 0.5 * height + radius,
            Shape::Mesh { vertices } => {
                let mut r = 0.0f32;
                for v in vertices.iter() {
                    r = r.max(v.norm());
                }
                r
            }
        }
    }

    /// Analytic mass and diagonal inertia for the given density.
    ///
    /// - Box: volume × density, standard box inertia per axis.
    /// - Sphere: volume × density, `I = 0.4·m·r²` per axis.
    /// - Capsule: cylinder + two hemispheres volume, isotropic `0.4·m·r²`
    ///   (rotational response treats the capsule as a sphere of its radius).
    /// - Mesh: constant unit mass and unit inertia. Meshes are not
    ///   volumetrically integrated; convex-hull mass properties are out of
    ///   scope for this core.
    pub fn mass_properties(&self, density: f32) -> (f32, Vector3<f32>) {
        match self {
            Shape::Box { half_extents: h } => {
                let volume = 8.0 * h.x * h.y * h.z;
                let mass = volume * density;
                let hx2 = 4.0 * h.x * h.x;
                let hy2 = 4.0 * h.y * h.y;
                let hz2 = 4.0 * h.z * h.z;
                let k = mass / 12.0;
                (mass, Vector3::new(k * (hy2 + hz2), k * (hx2 + hz2), k * (hx2 + hy2)))
            }
            Shape::Sphere { radius } => {
                let volume = 4.0 / 3.0 * core::f32::consts::PI * radius * radius * radius;
                let mass = volume * density;
                let i = 0.4 * mass * radius * radius;
                (mass, Vector3::new(i, i, i))
            }
            Shape::Capsule { radius, height } => {
                let r2 = radius * radius;
                let volume = core::f32::consts::PI * r2 * height
                    + 4.0 / 3.0 * core::f32::consts::PI * r2 * radius;
                let mass = volume * density;
                let i = 0.4 * mass * r2;
                (mass, Vector3::new(i, i, i))
            }
            Shape::Mesh { .. } => (1.0, Vector3::new(1.0, 1.0, 1.0)),
        }
    }
}

/// Surface properties combined per contact during collision response.
///
/// Ghost materials take part in integration but are skipped by collision
/// detection for any pair containing one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Mass per unit volume (kg/m³ if positions are meters).
    pub density: f32,
    /// Friction coefficient. Contacts combine both bodies' coefficients as
    /// `sqrt(mu_a * mu_b)`.
    pub friction: f32,
    /// Bounciness. Contacts use the minimum of both bodies' values.
    pub restitution: f32,
    /// Excluded from collision detection entirely when set.
    pub ghost: bool,
}

impl Material {
    /// Create a material. Negative inputs are clamped to zero.
    pub fn new(density: f32, friction: f32, restitution: f32) -> Self {
        if density < 0.0 || friction < 0.0 || restitution < 0.0 {
            warn!("negative material parameter clamped to zero");
        }
        Self {
            density: density.max(0.0),
            friction: friction.max(0.0),
            restitution: restitution.max(0.0),
            ghost: false,
        }
    }

    /// Builder: mark this material as a ghost (no collision response).
    pub fn with_ghost(mut self, ghost: bool) -> Self {
        self.ghost = ghost;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.5,
            restitution: 0.3,
            ghost: false,
        }
    }
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
    fn test_box_mass_properties() {
        // Unit cube, density 1 => volume 1, mass 1
        let shape = Shape::Box {
            half_extents: Vector3::new(0.5, 0.5, 0.5),
        };
        let (mass, inertia) = shape.mass_properties(1.0);
        assert!(approx_eq(mass, 1.0));
        // I = (1/12) * m * (1² + 1²) = 1/6 per axis for a unit cube
        assert!(approx_eq(inertia.x, 1.0 / 6.0));
        assert!(approx_eq(inertia.y, 1.0 / 6.0));
        assert!(approx_eq(inertia.z, 1.0 / 6.0));
    }

    #[test]
    fn test_sphere_mass_properties() {
        let shape = Shape::Sphere { radius: 1.0 };
        let (mass, inertia) = shape.mass_properties(1.0);
        let expected_mass = 4.0 / 3.0 * core::f32::consts::PI;
        assert!(approx_eq(mass, expected_mass));
        assert!(approx_eq(inertia.x, 0.4 * expected_mass));
        assert!(approx_eq(inertia.y, inertia.x));
        assert!(approx_eq(inertia.z, inertia.x));
    }

    #[test]
    fn test_capsule_mass_is_cylinder_plus_sphere() {
        let shape = Shape::Capsule {
            radius: 1.0,
            height: 2.0,
        };
        let (mass, inertia) = shape.mass_properties(1.0);
        let expected = core::f32::consts::PI * 2.0 + 4.0 / 3.0 * core::f32::consts::PI;
        assert!(approx_eq(mass, expected));
        // Isotropic inertia
        assert!(approx_eq(inertia.x, inertia.y));
        assert!(approx_eq(inertia.y, inertia.z));
    }

    #[test]
    fn test_mesh_mass_is_unit_placeholder() {
        let vertices = [
            Vector3::new(-10.0, 0.0, 0.0),
            Vector3::new(10.0, 5.0, 2.0),
        ];
        let shape = Shape::Mesh {
            vertices: &vertices,
        };
        let (mass, inertia) = shape.mass_properties(100.0);
        assert!(approx_eq(mass, 1.0));
        assert!(approx_eq(inertia.x, 1.0));
    }

    #[test]
    fn test_extents_capsule() {
        let shape = Shape::Capsule {
            radius: 0.5,
            height: 2.0,
        };
        let ext = shape.extents();
        assert!(approx_eq(ext.x, 0.5));
        assert!(approx_eq(ext.y, 1.5));
        assert!(approx_eq(ext.z, 0.5));
    }

    #[test]
    fn test_extents_mesh_symmetric_bound() {
        let vertices = [Vector3::new(-2.0, 1.0, 0.0), Vector3::new(1.0, -3.0, 0.5)];
        let shape = Shape::Mesh {
            vertices: &vertices,
        };
        let ext = shape.extents();
        assert!(approx_eq(ext.x, 2.0));
        assert!(approx_eq(ext.y, 3.0));
        assert!(approx_eq(ext.z, 0.5));
    }

    #[test]
    fn test_bounding_radius_box_is_half_diagonal() {
        let shape = Shape::Box {
            half_extents: Vector3::new(1.0, 1.0, 1.0),
        };
        assert!(approx_eq(shape.bounding_radius(), 3.0f32.sqrt()));
    }

    #[test]
    fn test_bounding_radius_capsule() {
        let shape = Shape::Capsule {
            radius: 0.5,
            height: 2.0,
        };
        assert!(approx_eq(shape.bounding_radius(), 1.5));
    }

    #[test]
    fn test_bounding_radius_empty_mesh_is_zero() {
        let shape = Shape::Mesh { vertices: &[] };
        assert_eq!(shape.bounding_radius(), 0.0);
    }

    #[test]
    fn test_material_clamps_negative() {
        let material = Material::new(-1.0, -0.5, -0.1);
        assert_eq!(material.density, 0.0);
        assert_eq!(material.friction, 0.0);
        assert_eq!(material.restitution, 0.0);
    }

    #[test]
    fn test_material_ghost_builder() {
        let material = Material::default().with_ghost(true);
        assert!(material.ghost);
    }
}
