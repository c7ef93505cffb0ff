//! Hammersley low-discrepancy point sets.
//!
//! The Hammersley sequence of dimension `d` pairs the uniform sequence `i/n`
//! with van der Corput sequences in distinct prime bases: base 2 for the
//! second coordinate, then 3, 5, 7, ... for the rest. Points fill the unit
//! hypercube far more evenly than pseudo-random samples, which keeps the
//! reference clouds used for shape fingerprints small.
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShapeError};
use crate::geometry::{Point3D, PointCloud};

/// Prime bases for coordinates 2 and up. Base 2 is handled separately.
const PRIMES: [u64; 28] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47,
    53, 59, 61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107, 109,
];

/// Highest dimension `generate` supports: `i/n`, base 2, then every prime in the table.
pub const MAX_DIMENSION: usize = PRIMES.len() + 2;

/// Base-2 van der Corput value: the bits of `index` mirrored about the binary point.
#[inline]
fn van_der_corput_2(index: u64) -> f64 {
    let mut result = 0.0;
    let mut weight = 0.5;
    let mut bits = index;
    while bits != 0 {
        if bits & 1 == 1 {
            result += weight;
        }
        bits >>= 1;
        weight *= 0.5;
    }
    result
}

/// Radical inverse of `index` in `base`: Σ digitₖ / baseᵏ⁺¹.
#[inline]
fn radical_inverse(index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut result = 0.0;
    let mut weight = inv_base;
    let mut n = index;
    while n != 0 {
        result += (n % base) as f64 * weight;
        n /= base;
        weight *= inv_base;
    }
    result
}

/// Coordinate `dimension` of Hammersley point `index` (1-based) out of `count`.
#[inline]
fn coordinate(dimension: usize, index: u64, count: u64) -> f64 {
    match dimension {
        0 => index as f64 / count as f64,
        1 => van_der_corput_2(index),
        d => radical_inverse(index, PRIMES[d - 2]),
    }
}

/// Generate `count` Hammersley points of dimension `dim` in the unit hypercube.
///
/// Point indices run from 1 to `count`, so the first coordinate of the last
/// point is exactly 1.0.
pub fn generate(dim: usize, count: usize) -> Result<Vec<Vec<f64>>> {
    if dim == 0 || dim > MAX_DIMENSION {
        return Err(ShapeError::InvalidArgument(format!(
            "dimension ({dim}) must be in the range 1..={MAX_DIMENSION}"
        )));
    }
    let n = count as u64;
    Ok((1..=n)
        .map(|i| (0..dim).map(|d| coordinate(d, i, n)).collect())
        .collect())
}

/// Bounded iterator over 3D Hammersley points in the unit cube.
#[derive(Debug, Clone)]
pub struct Hammersley {
    num_points: u64,
    index: u64,
}

impl Hammersley {
    pub fn new(num_points: usize) -> Self {
        Self { num_points: num_points as u64, index: 0 }
    }
}

impl Iterator for Hammersley {
    type Item = Point3D;

    fn next(&mut self) -> Option<Point3D> {
        if self.index >= self.num_points {
            return None;
        }
        self.index += 1;
        Some([
            coordinate(0, self.index, self.num_points),
            coordinate(1, self.index, self.num_points),
            coordinate(2, self.index, self.num_points),
        ])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.num_points - self.index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Hammersley {}

/// Ellipsoid point set parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipsoidParams {
    /// Maximum number of points to keep.
    pub num_points: usize,
    /// Extent of the largest ellipsoid axis.
    pub scale: f64,
    /// Ellipsoid x axis scale (squared semi-axis, relative to `scale`).
    pub a: f64,
    /// Ellipsoid y axis scale.
    pub b: f64,
    /// Ellipsoid z axis scale.
    pub c: f64,
}

impl EllipsoidParams {
    /// A sphere of radius `scale`.
    pub fn sphere(num_points: usize, scale: f64) -> Self {
        Self { num_points, scale, a: 1.0, b: 1.0, c: 1.0 }
    }
}

/// Cuboid point set parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuboidParams {
    /// Maximum number of points to keep.
    pub num_points: usize,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
}

/// Most unit-cube points generated per requested point. Regions thinner
/// than this share of the cube come back under-filled.
pub const MAX_OVERSAMPLE: usize = 4096;

/// Number of unit-cube points to generate so that roughly `wanted` of them
/// land in a sub-volume covering `fraction` of the cube.
///
/// Capped at `wanted * MAX_OVERSAMPLE` and at `u32::MAX`.
#[inline]
fn oversampled(wanted: usize, fraction: f64) -> usize {
    let ceiling = wanted.saturating_mul(MAX_OVERSAMPLE).min(u32::MAX as usize);
    let total = (wanted as f64 / fraction).ceil();
    if total.is_finite() && total < ceiling as f64 {
        total as usize
    } else {
        ceiling
    }
}

/// Hammersley points inside an ellipsoid centered at the origin.
///
/// Unit-cube points are mapped onto `[-scale, scale]³` and kept when
/// `x²/a + y²/b + z²/c < scale²`. The generator is oversampled by the
/// ellipsoid's share of the cube, which is an estimate: the result may hold
/// slightly fewer than `num_points` points.
pub fn sample_ellipsoid(params: &EllipsoidParams) -> PointCloud {
    let EllipsoidParams { num_points, scale, a, b, c } = *params;
    let mut result = Vec::with_capacity(num_points);

    // An ellipsoid with squared semi-axes a, b, c (as fractions of the
    // cube half-width) fills π/6·√a·√b·√c of the cube.
    let fraction = a.sqrt() * b.sqrt() * c.sqrt() * std::f64::consts::PI / 6.0;
    if num_points == 0 || !(fraction > 0.0) || !(scale > 0.0) {
        return result;
    }
    let total = oversampled(num_points, fraction);
    let scale_2 = scale * 2.0;
    let scale_sq = scale * scale;

    for raw in Hammersley::new(total) {
        if result.len() >= num_points {
            break;
        }
        let x = scale - scale_2 * raw[0];
        let y = scale - scale_2 * raw[1];
        let z = scale - scale_2 * raw[2];
        if x * x / a + y * y / b + z * z / c < scale_sq {
            result.push([x, y, z]);
        }
    }

    tracing::debug!(
        requested = num_points,
        filled = result.len(),
        generated = total,
        "sampled ellipsoid"
    );
    result
}

/// Hammersley points inside a sphere of radius `scale` centered at the origin.
pub fn sample_sphere(num_points: usize, scale: f64) -> PointCloud {
    sample_ellipsoid(&EllipsoidParams::sphere(num_points, scale))
}

/// Hammersley points inside an axis-aligned box.
///
/// The box is normalized by its largest extent into a sub-cube of the unit
/// cube; unit points inside the sub-cube are scaled back and shifted to the
/// box's minimum corner. A box with any zero-extent axis yields no points.
pub fn sample_cuboid(params: &CuboidParams) -> PointCloud {
    let mut result = Vec::with_capacity(params.num_points);

    let dxw = params.xmax - params.xmin;
    let dyw = params.ymax - params.ymin;
    let dzw = params.zmax - params.zmin;
    let dw_max = dxw.max(dyw).max(dzw);
    if params.num_points == 0 || !(dw_max > 0.0) {
        return result;
    }

    let (dx, dy, dz) = (dxw / dw_max, dyw / dw_max, dzw / dw_max);
    let fraction = dx * dy * dz;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return result;
    }
    let total = oversampled(params.num_points, fraction);

    for [x, y, z] in Hammersley::new(total) {
        if result.len() >= params.num_points {
            break;
        }
        if x <= dx && y <= dy && z <= dz {
            result.push([
                x * dw_max + params.xmin,
                y * dw_max + params.ymin,
                z * dw_max + params.zmin,
            ]);
        }
    }

    tracing::debug!(
        requested = params.num_points,
        filled = result.len(),
        generated = total,
        "sampled cuboid"
    );
    result
}

// ── Tests ──────────────────────────────────────────────────────────────
