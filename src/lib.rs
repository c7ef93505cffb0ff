//! ALICE-Shape — Molecular Shape Fingerprints over Quasi-Random Point Clouds
//!
//! Represents a conformer's volume as the set of reference points it covers.
//! A fixed Hammersley cloud is bucketed once into a spatial index; each
//! conformer is rotated into its principal-axis frame and fingerprinted in
//! four proper orientations, and fingerprints are compared with bit-vector
//! similarity measures.
//!
//! ```
//! use std::sync::Arc;
//! use alice_shape::{
//!     sample_sphere, AlignerConfig, Atom, AxisAligner, FingerprintConfig, Fingerprinter,
//!     Measure, SpatialBucketIndex,
//! };
//!
//! let index = Arc::new(SpatialBucketIndex::new(sample_sphere(4096, 6.0), 1.0));
//! let aligner = AxisAligner::new(Arc::clone(&index), AlignerConfig::default());
//! let fingerprinter = Fingerprinter::new(index, FingerprintConfig::default());
//!
//! let mut atoms = vec![
//!     Atom::new(6, [0.0, 0.0, 0.0], 1.7),
//!     Atom::new(6, [1.5, 0.2, 0.0], 1.7),
//!     Atom::new(8, [2.4, 1.1, 0.3], 1.52),
//! ];
//! aligner.align(&mut atoms).unwrap();
//! let sfp = fingerprinter.compute(&atoms).unwrap();
//! assert_eq!(sfp.reference().len(), fingerprinter.index().len());
//! let s = Measure::Tanimoto.shape_similarity(&sfp, &sfp);
//! assert!((s - 1.0).abs() < 1e-12);
//! ```

pub mod aligner;
pub mod error;
pub mod fingerprint;
pub mod geometry;
pub mod hammersley;
pub mod measures;
pub mod points;
pub mod spatial_index;

pub use aligner::{axis_align_transform, write_back, AlignerConfig, AxisAligner, Transform};
pub use error::{Result, ShapeError};
pub use fingerprint::{
    fold, parse_bit_string, to_bit_string, Fingerprint, FingerprintConfig, Fingerprinter,
    ShapeFingerprint, FLIPS, NUM_FLIPS,
};
pub use geometry::{sphere_volume, Atom, Point3D, PointCloud, Sphere};
pub use hammersley::{
    generate, sample_cuboid, sample_ellipsoid, sample_sphere, CuboidParams, EllipsoidParams,
    Hammersley, MAX_OVERSAMPLE,
};
pub use measures::{diverse, pairwise, pairwise_band, BitCounts, MatrixMode, Measure};
pub use points::{read_points, write_points};
pub use spatial_index::SpatialBucketIndex;
