//! Shape fingerprints of axis-aligned conformers.
//!
//! A PCA-aligned molecule still has a fourfold ambiguity: each principal axis
//! may point either way. The fingerprinter removes it by fingerprinting the
//! molecule in all four proper orientations obtained by negating an even
//! number of axes. Comparing a reference orientation against all four of
//! another molecule's orientations then finds the best overlay.

use std::sync::Arc;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShapeError};
use crate::geometry::{Atom, Sphere};
use crate::spatial_index::SpatialBucketIndex;

/// Bit vector over a reference point cloud. Bit `i` is set when point `i`
/// lies inside the molecule.
pub type Fingerprint = BitVec<u64, Lsb0>;

/// Number of orientations in a [`ShapeFingerprint`].
pub const NUM_FLIPS: usize = 4;

/// Axis sign triples, identity first. Each negates an even number of axes,
/// so every flip is a 180° rotation, never a reflection.
pub const FLIPS: [[f64; 3]; NUM_FLIPS] = [
    [1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
];

/// The four fingerprints of one conformer, in [`FLIPS`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeFingerprint {
    fingerprints: [Fingerprint; NUM_FLIPS],
}

impl ShapeFingerprint {
    pub fn new(fingerprints: [Fingerprint; NUM_FLIPS]) -> Self {
        Self { fingerprints }
    }

    /// Fingerprint of the unflipped orientation.
    pub fn reference(&self) -> &Fingerprint {
        &self.fingerprints[0]
    }

    pub fn get(&self, flip: usize) -> Option<&Fingerprint> {
        self.fingerprints.get(flip)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fingerprint> {
        self.fingerprints.iter()
    }

    pub fn as_slice(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    pub fn into_inner(self) -> [Fingerprint; NUM_FLIPS] {
        self.fingerprints
    }
}

impl std::ops::Index<usize> for ShapeFingerprint {
    type Output = Fingerprint;

    fn index(&self, flip: usize) -> &Fingerprint {
        &self.fingerprints[flip]
    }
}

/// Fingerprinter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Fold each fingerprint this many times (length N → N >> fold). Default 0.
    pub fold: u32,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self { fold: 0 }
    }
}

/// Computes shape fingerprints against a shared reference index.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    index: Arc<SpatialBucketIndex>,
    config: FingerprintConfig,
}

impl Fingerprinter {
    pub fn new(index: Arc<SpatialBucketIndex>, config: FingerprintConfig) -> Self {
        Self { index, config }
    }

    pub fn index(&self) -> &SpatialBucketIndex {
        &self.index
    }

    /// Fingerprint the heavy atoms of an aligned conformer in all four flips.
    pub fn compute(&self, atoms: &[Atom]) -> Result<ShapeFingerprint> {
        let spheres: Vec<Sphere> = atoms
            .iter()
            .filter(|a| !a.is_hydrogen())
            .map(Atom::sphere)
            .collect();
        self.compute_spheres(&spheres)
    }

    /// Fingerprint a set of already-aligned spheres in all four flips.
    pub fn compute_spheres(&self, spheres: &[Sphere]) -> Result<ShapeFingerprint> {
        Ok(ShapeFingerprint::new([
            self.compute_for_flip(spheres, &FLIPS[0])?,
            self.compute_for_flip(spheres, &FLIPS[1])?,
            self.compute_for_flip(spheres, &FLIPS[2])?,
            self.compute_for_flip(spheres, &FLIPS[3])?,
        ]))
    }

    fn compute_for_flip(&self, spheres: &[Sphere], flip: &[f64; 3]) -> Result<Fingerprint> {
        let flipped: Vec<Sphere> = spheres
            .iter()
            .map(|s| {
                let [x, y, z] = s.center;
                Sphere::new([x * flip[0], y * flip[1], z * flip[2]], s.radius)
            })
            .collect();
        self.index.contained_by(&flipped, self.config.fold, 0)
    }
}

/// OR-fold an unfolded fingerprint `k` times: bit `i` moves to `i % (len >> k)`.
pub fn fold(fp: &BitSlice<u64, Lsb0>, k: u32) -> Fingerprint {
    let len = fp.len().checked_shr(k).unwrap_or(0);
    let mut folded = bitvec![u64, Lsb0; 0; len];
    if len == 0 {
        return folded;
    }
    for i in fp.iter_ones() {
        folded.set(i % len, true);
    }
    folded
}

/// Render a fingerprint as ASCII `0`/`1` characters, bit 0 first.
pub fn to_bit_string(fp: &BitSlice<u64, Lsb0>) -> String {
    fp.iter().by_vals().map(|b| if b { '1' } else { '0' }).collect()
}

/// Parse the ASCII `0`/`1` form produced by [`to_bit_string`].
pub fn parse_bit_string(s: &str) -> Result<Fingerprint> {
    let s = s.trim_end();
    let mut fp = Fingerprint::with_capacity(s.len());
    for (col, ch) in s.chars().enumerate() {
        match ch {
            '0' => fp.push(false),
            '1' => fp.push(true),
            other => {
                return Err(ShapeError::Parse {
                    line: 1,
                    message: format!("unexpected character {other:?} at column {}", col + 1),
                })
            }
        }
    }
    Ok(fp)
}

// ── Tests ──────────────────────────────────────────────────────────────
