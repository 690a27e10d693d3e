//! Uniform-grid broad phase.
//!
//! Bodies are bucketed by the cell containing their centroid, one cell per
//! body. This is an approximation rather than a conservative cover: a body
//! whose AABB straddles a cell boundary can miss a neighbor sitting in the
//! adjacent cell. The grid is rebuilt from scratch once per step.
//!
//! Buckets are kept in first-touch order and members are chained in
//! insertion order, so pair enumeration is deterministic:
//! bucket-first-touch, then insertion order within the bucket. Candidate
//! pairs are ordered index pairs `(i, j)` with `i < j`, so each unordered
//! pair appears at most once.

use nalgebra::Vector3;

// ComplexField provides floor() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use crate::body::RigidBody;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    key: [i32; 3],
    head: usize,
    tail: usize,
}

/// Spatial index bucketing bodies by quantized centroid position.
///
/// `N` is the maximum number of bodies (matching the world capacity).
#[derive(Debug)]
pub struct SpatialGrid<const N: usize> {
    buckets: heapless::Vec<Bucket, N>,
    /// Per-body chain link to the next member of the same bucket.
    next: heapless::Vec<Option<usize>, N>,
}

impl<const N: usize> SpatialGrid<N> {
    pub fn new() -> Self {
        Self {
            buckets: heapless::Vec::new(),
            next: heapless::Vec::new(),
        }
    }

    /// Quantize a position to its integer cell key.
    fn cell_key(position: &Vector3<f32>, cell_size: f32) -> [i32; 3] {
        [
            (position.x / cell_size).floor() as i32,
            (position.y / cell_size).floor() as i32,
            (position.z / cell_size).floor() as i32,
        ]
    }

    /// Clear and re-bucket every active body by its centroid cell.
    pub fn rebuild(&mut self, bodies: &[RigidBody<'_>], cell_size: f32) {
        self.buckets.clear();
        self.next.clear();
        for _ in 0..bodies.len() {
            let _ = self.next.push(None);
        }

        for (index, body) in bodies.iter().enumerate() {
            if !body.active {
                continue;
            }
            let key = Self::cell_key(&body.position, cell_size);
            if let Some(bucket) = self.buckets.iter_mut().find(|b| b.key == key) {
                self.next[bucket.tail] = Some(index);
                bucket.tail = index;
            } else {
                let _ = self.buckets.push(Bucket {
                    key,
                    head: index,
                    tail: index,
                });
            }
        }
    }

    /// Number of occupied cells after the last rebuild.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Enumerate same-cell candidate pairs.
    ///
    /// `C` caps the number of pairs; excess candidates are dropped.
    pub fn pairs<const C: usize>(&self) -> heapless::Vec<(usize, usize), C> {
        let mut out = heapless::Vec::new();
        for bucket in &self.buckets {
            let mut a = Some(bucket.head);
            while let Some(i) = a {
                let mut b = self.next[i];
                while let Some(j) = b {
                    let pair = if i < j { (i, j) } else { (j, i) };
                    let _ = out.push(pair);
                    b = self.next[j];
                }
                a = self.next[i];
            }
        }
        out
    }
}

impl<const N: usize> Default for SpatialGrid<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::body::BodyType;
    use crate::shape::{Material, Shape};

    fn sphere_at(x: f32, y: f32, z: f32) -> RigidBody<'static> {
        RigidBody::new(
            Shape::Sphere { radius: 0.5 },
            BodyType::Dynamic,
            Material::default(),
        )
        .with_position(Vector3::new(x, y, z))
    }

    #[test]
    fn test_same_cell_yields_pair() {
        let bodies = [sphere_at(1.0, 1.0, 1.0), sphere_at(2.0, 2.0, 2.0)];
        let mut grid = SpatialGrid::<8>::new();
        grid.rebuild(&bodies, 5.0);
        let pairs = grid.pairs::<8>();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0], (0, 1));
    }

    #[test]
    fn test_negative_coordinates_quantize_with_floor() {
        // floor(-0.1 / 5) = -1, floor(0.1 / 5) = 0: different cells
        let bodies = [sphere_at(-0.1, 0.0, 0.0), sphere_at(0.1, 0.0, 0.0)];
        let mut grid = SpatialGrid::<8>::new();
        grid.rebuild(&bodies, 5.0);
        assert_eq!(grid.bucket_count(), 2);
        assert!(grid.pairs::<8>().is_empty());
    }

    #[test]
    fn test_straddling_pair_is_missed() {
        // Overlapping spheres on either side of a cell boundary: the
        // single-cell assignment misses this pair.
        let bodies = [sphere_at(4.9, 0.0, 0.0), sphere_at(5.1, 0.0, 0.0)];
        let mut grid = SpatialGrid::<8>::new();
        grid.rebuild(&bodies, 5.0);
        assert!(grid.pairs::<8>().is_empty());
    }

    #[test]
    fn test_bucket_then_insertion_order() {
        // Bodies 0 and 3 share a cell, 1 and 2 share another. Bucket order
        // is first-touch (body 0's cell first), members in insertion order.
        let bodies = [
            sphere_at(1.0, 0.0, 0.0),
            sphere_at(11.0, 0.0, 0.0),
            sphere_at(12.0, 0.0, 0.0),
            sphere_at(2.0, 0.0, 0.0),
        ];
        let mut grid = SpatialGrid::<8>::new();
        grid.rebuild(&bodies, 5.0);
        let pairs = grid.pairs::<8>();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], (0, 3));
        assert_eq!(pairs[1], (1, 2));
    }

    #[test]
    fn test_three_members_enumerate_all_pairs_once() {
        let bodies = [
            sphere_at(1.0, 0.0, 0.0),
            sphere_at(2.0, 0.0, 0.0),
            sphere_at(3.0, 0.0, 0.0),
        ];
        let mut grid = SpatialGrid::<8>::new();
        grid.rebuild(&bodies, 5.0);
        let pairs = grid.pairs::<8>();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], (0, 1));
        assert_eq!(pairs[1], (0, 2));
        assert_eq!(pairs[2], (1, 2));
    }

    #[test]
    fn test_inactive_bodies_are_skipped() {
        let mut bodies = [sphere_at(1.0, 0.0, 0.0), sphere_at(2.0, 0.0, 0.0)];
        bodies[1].active = false;
        let mut grid = SpatialGrid::<8>::new();
        grid.rebuild(&bodies, 5.0);
        assert!(grid.pairs::<8>().is_empty());
    }

    #[test]
    fn test_rebuild_clears_previous_state() {
        let bodies = [sphere_at(1.0, 0.0, 0.0), sphere_at(2.0, 0.0, 0.0)];
        let mut grid = SpatialGrid::<8>::new();
        grid.rebuild(&bodies, 5.0);
        assert_eq!(grid.pairs::<8>().len(), 1);

        let moved = [sphere_at(1.0, 0.0, 0.0), sphere_at(20.0, 0.0, 0.0)];
        grid.rebuild(&moved, 5.0);
        assert!(grid.pairs::<8>().is_empty());
        assert_eq!(grid.bucket_count(), 2);
    }
}
