//! Uniform bucket grid over a fixed reference point cloud.
//!
//! Partitions the cloud's bounding box into 8 cells per axis. A sphere query
//! only visits the cells overlapped by the sphere's bounding cube and tests
//! the points inside them by exact distance, so fingerprinting a molecule
//! touches a small fraction of the reference points.
//!
//! The index is immutable once built. Share it between workers with `Arc`.
//!
//! Author: Moroya Sakamoto

use bitvec::prelude::*;

use crate::error::{Result, ShapeError};
use crate::fingerprint::Fingerprint;
use crate::geometry::{bounding_box, dist_sq, mean_center, Atom, Point3D, PointCloud, Sphere};

/// Number of grid cells along each non-degenerate axis.
pub const SUBDIVISIONS: usize = 8;

/// Bucketed reference point cloud for sphere-containment queries.
#[derive(Debug, Clone)]
pub struct SpatialBucketIndex {
    /// Reference points. Index = fingerprint bit.
    points: PointCloud,
    /// Multiplier applied to every query sphere's radius.
    sphere_scale: f64,
    /// Minimum corner of the bounding box.
    min: Point3D,
    /// Maximum corner of the bounding box.
    max: Point3D,
    /// Cell edge length per axis (0 on a degenerate axis).
    cell_size: [f64; 3],
    /// Number of cells in each dimension.
    dims: [usize; 3],
    /// For each cell, the indices of the points it holds.
    cells: Vec<Vec<usize>>,
}

impl SpatialBucketIndex {
    /// Bucket `points` into the grid. `sphere_scale` scales all query radii.
    pub fn new(points: PointCloud, sphere_scale: f64) -> Self {
        let (min, max) = bounding_box(&points).unwrap_or(([0.0; 3], [0.0; 3]));

        let mut cell_size = [0.0; 3];
        let mut dims = [1usize; 3];
        for axis in 0..3 {
            let extent = max[axis] - min[axis];
            if extent > 0.0 {
                cell_size[axis] = extent / SUBDIVISIONS as f64;
                dims[axis] = SUBDIVISIONS;
            }
        }

        let mut index = Self {
            points: Vec::new(),
            sphere_scale,
            min,
            max,
            cell_size,
            dims,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
        };

        for (idx, p) in points.iter().enumerate() {
            let cell = index.cell_index(
                index.axis_cell(0, p[0]),
                index.axis_cell(1, p[1]),
                index.axis_cell(2, p[2]),
            );
            index.cells[cell].push(idx);
        }
        index.points = points;

        tracing::debug!(
            points = index.points.len(),
            dims = ?index.dims,
            sphere_scale,
            "built spatial bucket index"
        );
        index
    }

    /// Number of reference points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The reference points, in bit order.
    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    pub fn sphere_scale(&self) -> f64 {
        self.sphere_scale
    }

    /// Grid dimensions.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Bounding box `(min, max)` of the reference points.
    pub fn bounds(&self) -> (Point3D, Point3D) {
        (self.min, self.max)
    }

    /// Number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Length of a fingerprint folded `fold` times.
    ///
    /// Folding a non-empty cloud down to zero bits is rejected.
    pub fn folded_len(&self, fold: u32) -> Result<usize> {
        if fold >= usize::BITS {
            return Err(ShapeError::InvalidArgument(format!(
                "fold factor {fold} exceeds the bit width of a point index"
            )));
        }
        let folded = self.points.len() >> fold;
        if folded == 0 && !self.points.is_empty() {
            return Err(ShapeError::InvalidArgument(format!(
                "fold factor {fold} leaves no bits for {} points",
                self.points.len()
            )));
        }
        Ok(folded)
    }

    /// Fingerprint of the points lying inside the union of `spheres`.
    ///
    /// The result holds `(len() >> fold) + offset` bits. Point `i` sets bit
    /// `i % (len() >> fold) + offset`.
    pub fn contained_by(&self, spheres: &[Sphere], fold: u32, offset: usize) -> Result<Fingerprint> {
        let folded = self.folded_len(fold)?;
        let mut bits = bitvec![u64, Lsb0; 0; folded + offset];
        self.set_bits_unchecked(spheres, &mut bits, folded, offset);
        Ok(bits)
    }

    /// OR the containment bits for `spheres` into an existing bit vector.
    ///
    /// `bits` must hold at least `(len() >> fold) + offset` bits; bits already
    /// set are preserved.
    pub fn set_bits_for_spheres(
        &self,
        spheres: &[Sphere],
        bits: &mut BitSlice<u64, Lsb0>,
        fold: u32,
        offset: usize,
    ) -> Result<()> {
        let folded = self.folded_len(fold)?;
        let needed = folded + offset;
        if bits.len() < needed {
            return Err(ShapeError::InvalidArgument(format!(
                "not enough bits ({}). Need at least {needed} bits",
                bits.len()
            )));
        }
        self.set_bits_unchecked(spheres, bits, folded, offset);
        Ok(())
    }

    /// Coordinates of the reference points inside the union of `spheres`.
    pub fn points_within(&self, spheres: &[Sphere]) -> PointCloud {
        let n = self.points.len();
        let mut bits = bitvec![u64, Lsb0; 0; n];
        self.set_bits_unchecked(spheres, &mut bits, n, 0);
        bits.iter_ones().map(|i| self.points[i]).collect()
    }

    /// Share of the reference points inside the union of `spheres`.
    /// An empty index covers nothing.
    pub fn volume_fraction(&self, spheres: &[Sphere]) -> f64 {
        let n = self.points.len();
        if n == 0 {
            return 0.0;
        }
        let mut bits = bitvec![u64, Lsb0; 0; n];
        self.set_bits_unchecked(spheres, &mut bits, n, 0);
        bits.count_ones() as f64 / n as f64
    }

    /// Quasi-Monte Carlo volume of the union of `spheres`.
    ///
    /// `region_volume` is the volume of the region the reference points fill
    /// evenly, e.g. [`sphere_volume`](crate::geometry::sphere_volume) of the
    /// sampling radius.
    pub fn shape_volume(&self, spheres: &[Sphere], region_volume: f64) -> f64 {
        region_volume * self.volume_fraction(spheres)
    }

    /// Volume of a conformer's heavy atoms after mean-centering them.
    pub fn molecule_volume(&self, atoms: &[Atom], region_volume: f64) -> f64 {
        let mut spheres: Vec<Sphere> = atoms
            .iter()
            .filter(|a| !a.is_hydrogen())
            .map(Atom::sphere)
            .collect();
        let mean = mean_center(spheres.iter().map(|s| &s.center));
        for s in spheres.iter_mut() {
            for axis in 0..3 {
                s.center[axis] -= mean[axis];
            }
        }
        self.shape_volume(&spheres, region_volume)
    }

    fn set_bits_unchecked(
        &self,
        spheres: &[Sphere],
        bits: &mut BitSlice<u64, Lsb0>,
        folded: usize,
        offset: usize,
    ) {
        if folded == 0 {
            return;
        }
        for sphere in spheres {
            let radius = sphere.radius * self.sphere_scale;
            let r_sq = radius * radius;
            let [x, y, z] = sphere.center;
            let (x0, xf) = (self.axis_cell(0, x - radius), self.axis_cell(0, x + radius));
            let (y0, yf) = (self.axis_cell(1, y - radius), self.axis_cell(1, y + radius));
            let (z0, zf) = (self.axis_cell(2, z - radius), self.axis_cell(2, z + radius));

            for ix in x0..=xf {
                for iy in y0..=yf {
                    for iz in z0..=zf {
                        for &point_idx in &self.cells[self.cell_index(ix, iy, iz)] {
                            let bit = point_idx % folded + offset;
                            // Already covered by an earlier sphere.
                            if bits[bit] {
                                continue;
                            }
                            if dist_sq(&self.points[point_idx], &sphere.center) <= r_sq {
                                bits.set(bit, true);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Clamped cell coordinate of `value` along `axis`.
    #[inline]
    fn axis_cell(&self, axis: usize, value: f64) -> usize {
        let n = self.dims[axis];
        if n == 1 {
            return 0;
        }
        let f = ((value - self.min[axis]) / self.cell_size[axis]).floor();
        if f.is_nan() || f <= 0.0 {
            0
        } else {
            (f as usize).min(n - 1)
        }
    }

    #[inline]
    fn cell_index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        let [_, ny, nz] = self.dims;
        (ix * ny + iy) * nz + iz
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
