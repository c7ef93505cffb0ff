//! PCA axis alignment of conformers.
//!
//! Strategy:
//! 1. Mean-center the heavy-atom centers.
//! 2. Build a PCA cloud: either the centers themselves, or the reference
//!    points that fall inside the atom spheres (a volume-weighted sample).
//! 3. The right-singular vectors of the cloud give the principal axes,
//!    largest variance first.
//! 4. SVD is free to return an improper rotation; negate one axis when the
//!    frame comes out left-handed.
//! 5. Mean-center and rotate every atom into the new frame.

use std::cmp::Ordering;
use std::sync::Arc;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShapeError};
use crate::geometry::{mean_center, untranslate, Atom, Point3D, Sphere};
use crate::spatial_index::SpatialBucketIndex;

/// Rotation taking a mean-centered conformer into its principal-axis frame.
/// Rows are the principal axes, largest variance first.
pub type Transform = Matrix3<f64>;

/// Handedness tolerance for the mirror check.
const MIRROR_EPS: f64 = 1.0e-6;

/// Axis alignment configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    /// Run PCA on heavy-atom centers instead of the reference points inside
    /// the atom spheres. Default false.
    pub atom_centers_only: bool,
    /// Move hydrogens into the aligned frame too. When false their
    /// coordinates are left as they were. Default true.
    pub include_hydrogens: bool,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            atom_centers_only: false,
            include_hydrogens: true,
        }
    }
}

/// Rotates conformers into a canonical principal-axis frame.
#[derive(Debug, Clone)]
pub struct AxisAligner {
    index: Arc<SpatialBucketIndex>,
    config: AlignerConfig,
}

impl AxisAligner {
    pub fn new(index: Arc<SpatialBucketIndex>, config: AlignerConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Principal-axis rotation for `atoms`, without moving them.
    pub fn find_transform(&self, atoms: &[Atom]) -> Result<Transform> {
        self.frame(atoms).map(|(_, transform)| transform)
    }

    /// Rewrite `atoms` in place into the mean-centered principal-axis frame.
    ///
    /// Returns the rotation that was applied. An empty slice is left alone.
    pub fn align(&self, atoms: &mut [Atom]) -> Result<Transform> {
        if atoms.is_empty() {
            return Ok(Transform::identity());
        }
        let (mean, transform) = self.frame(atoms)?;

        let mut centers: Vec<Point3D> = atoms.iter().map(|a| a.pos).collect();
        untranslate(&mut centers, &mean);
        for (center, atom) in centers.iter_mut().zip(atoms.iter()) {
            if atom.is_hydrogen() && !self.config.include_hydrogens {
                *center = atom.pos;
            } else {
                *center = rotate(&transform, center);
            }
        }
        write_back(atoms, &centers)?;
        Ok(transform)
    }

    /// Heavy-atom mean and principal-axis rotation.
    fn frame(&self, atoms: &[Atom]) -> Result<(Point3D, Transform)> {
        let mut spheres: Vec<Sphere> = atoms
            .iter()
            .filter(|a| !a.is_hydrogen())
            .map(Atom::sphere)
            .collect();
        let mean = mean_center(spheres.iter().map(|s| &s.center));
        for s in spheres.iter_mut() {
            s.center[0] -= mean[0];
            s.center[1] -= mean[1];
            s.center[2] -= mean[2];
        }

        let cloud = if self.config.atom_centers_only {
            // Already mean-centered.
            spheres.iter().map(|s| s.center).collect()
        } else {
            let mut cloud = self.index.points_within(&spheres);
            let cloud_mean = mean_center(&cloud);
            untranslate(&mut cloud, &cloud_mean);
            cloud
        };

        Ok((mean, axis_align_transform(&cloud)?))
    }
}

/// Principal axes of a mean-centered cloud, as a proper rotation.
///
/// The right-singular vectors of the N×3 cloud matrix X are the eigenvectors
/// of the 3×3 scatter matrix XᵀX, so the decomposition runs on the latter.
pub fn axis_align_transform(cloud: &[Point3D]) -> Result<Transform> {
    if cloud.is_empty() {
        return Err(ShapeError::InvalidArgument(
            "Can't find alignment for empty cloud".into(),
        ));
    }

    let mut scatter = Matrix3::zeros();
    for p in cloud {
        let v = Vector3::new(p[0], p[1], p[2]);
        scatter += v * v.transpose();
    }

    let svd = scatter.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| ShapeError::InvalidArgument("PCA failed".into()))?;

    let sv = svd.singular_values;
    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| sv[j].partial_cmp(&sv[i]).unwrap_or(Ordering::Equal));

    let mut transform = Transform::zeros();
    for (row, &src) in order.iter().enumerate() {
        transform.set_row(row, &v_t.row(src));
    }

    if is_mirrored(&transform) {
        unmirror_axes(&mut transform);
        tracing::debug!("corrected mirrored PCA axes");
    }
    Ok(transform)
}

/// True if the transform does not map e1 × e2 onto e3.
fn is_mirrored(t: &Transform) -> bool {
    let a: Vector3<f64> = t.column(0).into_owned();
    let b: Vector3<f64> = t.column(1).into_owned();
    let c: Vector3<f64> = t.column(2).into_owned();
    let xp = a.cross(&b);
    (0..3).any(|i| (c[i] - xp[i]).abs() >= MIRROR_EPS)
}

/// Negate axis rows, first to last, until the frame is right-handed.
/// A negation that leaves the frame mirrored is reverted.
fn unmirror_axes(t: &mut Transform) {
    for axis in 0..3 {
        if !is_mirrored(t) {
            break;
        }
        negate_row(t, axis);
        if is_mirrored(t) {
            negate_row(t, axis);
        }
    }
}

#[inline]
fn negate_row(t: &mut Transform, row: usize) {
    for col in 0..3 {
        t[(row, col)] = -t[(row, col)];
    }
}

#[inline]
fn rotate(t: &Transform, p: &Point3D) -> Point3D {
    let v = t * Vector3::new(p[0], p[1], p[2]);
    [v[0], v[1], v[2]]
}

/// Copy aligned coordinates back onto their atoms.
///
/// The two slices must be the same length; nothing is written otherwise.
pub fn write_back(atoms: &mut [Atom], centers: &[Point3D]) -> Result<()> {
    if atoms.len() != centers.len() {
        return Err(ShapeError::LengthMismatch {
            atoms: atoms.len(),
            centers: centers.len(),
        });
    }
    for (atom, center) in atoms.iter_mut().zip(centers) {
        atom.pos = *center;
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────
