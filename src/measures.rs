//! Similarity and distance measures over fingerprint pairs.
//!
//! Every measure is a function of the four bit-count statistics of a pair
//! of equal-length vectors:
//!
//! | count | meaning             |
//! |-------|---------------------|
//! | `a`   | set in both         |
//! | `b`   | set only in the first  |
//! | `c`   | set only in the second |
//! | `d`   | set in neither      |
//!
//! Distances are `1 - similarity`. Hamann similarity ranges over [-1, 1], so
//! its distance ranges over [0, 2].

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShapeError};
use crate::fingerprint::{Fingerprint, ShapeFingerprint, NUM_FLIPS};

/// Bit-count statistics of a fingerprint pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitCounts {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
}

impl BitCounts {
    /// Count agreements and disagreements between two vectors.
    ///
    /// Vectors of different lengths are compared over the shorter length;
    /// trailing bits of the longer one are ignored.
    pub fn of(v1: &BitSlice<u64, Lsb0>, v2: &BitSlice<u64, Lsb0>) -> Self {
        let n = v1.len().min(v2.len());
        let (v1, v2) = (&v1[..n], &v2[..n]);
        let ones1 = v1.count_ones();
        let ones2 = v2.count_ones();
        let a = v1.iter_ones().filter(|&i| v2[i]).count();
        let b = ones1 - a;
        let c = ones2 - a;
        Self { a, b, c, d: n - a - b - c }
    }

    /// Total bit count.
    #[inline]
    pub fn n(&self) -> usize {
        self.a + self.b + self.c + self.d
    }
}

/// A similarity measure, selected once and applied to many pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Measure {
    Tanimoto,
    Cosine,
    /// `1 - sqrt((b + c) / n)`: one minus the normalized Euclidean distance.
    Euclidean,
    Hamann,
    /// Asymmetric Tversky with `beta = 2 - alpha`.
    Tversky { alpha: f64 },
    /// Baroni-Urbani/Buser.
    Bub,
}

impl Default for Measure {
    fn default() -> Self {
        Self::Tanimoto
    }
}

impl Measure {
    /// Tversky measure. An `alpha` outside [0, 2] is accepted with a warning.
    pub fn tversky(alpha: f64) -> Self {
        if !(0.0..=2.0).contains(&alpha) {
            tracing::warn!(alpha, "Tversky alpha is not in the range 0 to 2");
        }
        Self::Tversky { alpha }
    }

    /// Measure for a one-letter code: B, C, E, H, T or V (Tversky, using `tversky_alpha`).
    pub fn from_code(code: char, tversky_alpha: f64) -> Result<Self> {
        match code {
            'B' => Ok(Self::Bub),
            'C' => Ok(Self::Cosine),
            'E' => Ok(Self::Euclidean),
            'H' => Ok(Self::Hamann),
            'T' => Ok(Self::Tanimoto),
            'V' => Ok(Self::tversky(tversky_alpha)),
            other => Err(ShapeError::InvalidArgument(format!(
                "Unsupported measure -{other}"
            ))),
        }
    }

    pub fn code(&self) -> char {
        match self {
            Self::Bub => 'B',
            Self::Cosine => 'C',
            Self::Euclidean => 'E',
            Self::Hamann => 'H',
            Self::Tanimoto => 'T',
            Self::Tversky { .. } => 'V',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tanimoto => "Tanimoto",
            Self::Cosine => "Cosine",
            Self::Euclidean => "Euclidean",
            Self::Hamann => "Hamann",
            Self::Tversky { .. } => "Tversky",
            Self::Bub => "BUB",
        }
    }

    pub fn similarity(&self, v1: &BitSlice<u64, Lsb0>, v2: &BitSlice<u64, Lsb0>) -> f64 {
        self.similarity_from_counts(&BitCounts::of(v1, v2))
    }

    pub fn distance(&self, v1: &BitSlice<u64, Lsb0>, v2: &BitSlice<u64, Lsb0>) -> f64 {
        1.0 - self.similarity(v1, v2)
    }

    pub fn similarity_from_counts(&self, counts: &BitCounts) -> f64 {
        let a = counts.a as f64;
        let b = counts.b as f64;
        let c = counts.c as f64;
        let d = counts.d as f64;
        let n = counts.n() as f64;

        match *self {
            Self::Tanimoto => ratio(a, a + b + c),
            Self::Cosine => ratio(a, ((a + b) * (a + c)).sqrt()),
            Self::Euclidean => {
                if n > 0.0 {
                    1.0 - ((b + c) / n).sqrt()
                } else {
                    0.0
                }
            }
            Self::Hamann => ratio((a + d) - (b + c), n),
            Self::Tversky { alpha } => {
                let beta = 2.0 - alpha;
                let denom = a + alpha * b + beta * c;
                // Both vectors empty: identical.
                if denom != 0.0 {
                    a / denom
                } else {
                    1.0
                }
            }
            Self::Bub => {
                let s = (a * d).sqrt();
                ratio(s + a, s + a + b + c)
            }
        }
    }

    /// Best similarity of `sfp1`'s reference orientation against every
    /// orientation of `sfp2`.
    pub fn shape_similarity(&self, sfp1: &ShapeFingerprint, sfp2: &ShapeFingerprint) -> f64 {
        self.best_flip(sfp1, sfp2).1
    }

    /// `1 -` [`shape_similarity`](Self::shape_similarity): the least distance.
    pub fn shape_distance(&self, sfp1: &ShapeFingerprint, sfp2: &ShapeFingerprint) -> f64 {
        1.0 - self.shape_similarity(sfp1, sfp2)
    }

    /// Flip of `candidate` most similar to `reference`'s unflipped
    /// orientation, with its similarity. Ties go to the lowest flip.
    pub fn best_flip(&self, reference: &ShapeFingerprint, candidate: &ShapeFingerprint) -> (usize, f64) {
        let query = reference.reference();
        let mut best = (0, self.similarity(query, &candidate[0]));
        for k in 1..NUM_FLIPS {
            let value = self.similarity(query, &candidate[k]);
            if value > best.1 {
                best = (k, value);
            }
        }
        best
    }
}

/// `num / denom`, or 0 when the denominator vanishes.
#[inline]
fn ratio(num: f64, denom: f64) -> f64 {
    if denom > 0.0 {
        num / denom
    } else {
        0.0
    }
}

/// Whether pairwise matrices hold similarities or distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixMode {
    Similarity,
    Distance,
}

/// N×N matrix of best-flip shape measures. The diagonal is 1 for
/// similarities and 0 for distances.
pub fn pairwise(fingerprints: &[ShapeFingerprint], measure: &Measure, mode: MatrixMode) -> Vec<Vec<f64>> {
    let n = fingerprints.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = match (i == j, mode) {
                (true, MatrixMode::Similarity) => 1.0,
                (true, MatrixMode::Distance) => 0.0,
                (false, MatrixMode::Similarity) => {
                    measure.shape_similarity(&fingerprints[i], &fingerprints[j])
                }
                (false, MatrixMode::Distance) => {
                    measure.shape_distance(&fingerprints[i], &fingerprints[j])
                }
            };
        }
    }
    matrix
}

/// Sparse rows of the pairwise matrix: for each fingerprint, the
/// `(column, value)` entries within `threshold`, diagonal excluded.
///
/// Similarities are kept when `value >= threshold`, distances when
/// `value <= threshold`.
pub fn pairwise_band(
    fingerprints: &[ShapeFingerprint],
    measure: &Measure,
    mode: MatrixMode,
    threshold: f64,
) -> Vec<Vec<(usize, f64)>> {
    fingerprints
        .iter()
        .enumerate()
        .map(|(i, row_fp)| {
            fingerprints
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .filter_map(|(j, col_fp)| {
                    let (value, keep) = match mode {
                        MatrixMode::Similarity => {
                            let v = measure.shape_similarity(row_fp, col_fp);
                            (v, v >= threshold)
                        }
                        MatrixMode::Distance => {
                            let v = measure.shape_distance(row_fp, col_fp);
                            (v, v <= threshold)
                        }
                    };
                    keep.then_some((j, value))
                })
                .collect()
        })
        .collect()
}

/// Indices of the `targets` that are not similar to anything in `database`:
/// every similarity against the database is below `threshold`.
pub fn diverse(
    targets: &[Fingerprint],
    database: &[Fingerprint],
    measure: &Measure,
    threshold: f64,
) -> Vec<usize> {
    targets
        .iter()
        .enumerate()
        .filter(|(_, target)| {
            database
                .iter()
                .all(|entry| measure.similarity(target, entry) < threshold)
        })
        .map(|(i, _)| i)
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::fingerprint::parse_bit_string;

    const ALL: [Measure; 6] = [
        Measure::Tanimoto,
        Measure::Cosine,
        Measure::Euclidean,
        Measure::Hamann,
        Measure::Tversky { alpha: 0.9 },
        Measure::Bub,
    ];

    fn bits(s: &str) -> Fingerprint {
        parse_bit_string(s).unwrap()
    }

    fn not(fp: &Fingerprint) -> Fingerprint {
        !fp.clone()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn bit_counts() {
        let counts = BitCounts::of(&bits("110010"), &bits("100110"));
        assert_eq!(counts, BitCounts { a: 2, b: 1, c: 1, d: 2 });
        assert_eq!(counts.n(), 6);
    }

    #[test]
    fn self_similarity_is_one() {
        let v = bits("0110100111010001");
        for m in [Measure::Tanimoto, Measure::Cosine, Measure::Hamann, Measure::Tversky { alpha: 1.3 }] {
            assert!(close(m.similarity(&v, &v), 1.0), "{}", m.name());
            assert!(close(m.distance(&v, &v), 0.0), "{}", m.name());
        }
        assert!(close(Measure::Euclidean.similarity(&v, &v), 1.0));
        assert!(close(Measure::Bub.similarity(&v, &v), 1.0));
    }

    #[test]
    fn zero_vectors() {
        let z = bits("00000000");
        assert_eq!(Measure::Tversky { alpha: 1.0 }.similarity(&z, &z), 1.0);
        assert_eq!(Measure::Tanimoto.similarity(&z, &z), 0.0);
        assert_eq!(Measure::Cosine.similarity(&z, &z), 0.0);
        assert_eq!(Measure::Bub.similarity(&z, &z), 0.0);
    }

    #[test]
    fn complement_is_maximally_dissimilar() {
        let v = bits("0110100111010001");
        let nv = not(&v);
        assert_eq!(Measure::Tanimoto.similarity(&v, &nv), 0.0);
        assert_eq!(Measure::Hamann.similarity(&v, &nv), -1.0);
        assert_eq!(Measure::Hamann.distance(&v, &nv), 2.0);
        assert_eq!(Measure::Euclidean.similarity(&v, &nv), 0.0);
        assert_eq!(Measure::Cosine.similarity(&v, &nv), 0.0);
        assert_eq!(Measure::Bub.similarity(&v, &nv), 0.0);
    }

    #[test]
    fn known_values() {
        // a = 2, b = 1, c = 1, d = 2, n = 6
        let v1 = bits("110010");
        let v2 = bits("100110");
        assert!(close(Measure::Tanimoto.similarity(&v1, &v2), 0.5));
        assert!(close(Measure::Cosine.similarity(&v1, &v2), 2.0 / 3.0));
        assert!(close(Measure::Euclidean.similarity(&v1, &v2), 1.0 - (2.0f64 / 6.0).sqrt()));
        assert!(close(Measure::Hamann.similarity(&v1, &v2), 2.0 / 6.0));
        assert!(close(Measure::Tversky { alpha: 0.5 }.similarity(&v1, &v2), 2.0 / 4.0));
        assert!(close(Measure::Bub.similarity(&v1, &v2), 4.0 / 6.0));
    }

    #[test]
    fn tversky_is_asymmetric() {
        // a = 1, b = 2, c = 0
        let v1 = bits("1110");
        let v2 = bits("1000");
        let m = Measure::Tversky { alpha: 0.1 };
        assert!(close(m.similarity(&v1, &v2), 1.0 / 1.2));
        assert!(close(m.similarity(&v2, &v1), 1.0 / 4.8));
    }

    #[test]
    fn out_of_range_alpha_is_kept() {
        assert_eq!(Measure::tversky(3.0), Measure::Tversky { alpha: 3.0 });
        assert_eq!(Measure::tversky(-1.0), Measure::Tversky { alpha: -1.0 });
    }

    /// Counts WARN events emitted while it is the thread's default subscriber.
    struct WarnCounter(Arc<AtomicUsize>);

    impl tracing::Subscriber for WarnCounter {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }
        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}
        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}
        fn event(&self, event: &tracing::Event<'_>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        fn enter(&self, _: &tracing::span::Id) {}
        fn exit(&self, _: &tracing::span::Id) {}
    }

    fn warnings_during(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        tracing::subscriber::with_default(WarnCounter(Arc::clone(&count)), f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn out_of_range_alpha_warns() {
        assert_eq!(warnings_during(|| { Measure::tversky(3.0); }), 1);
        assert_eq!(warnings_during(|| { Measure::from_code('V', -0.5).unwrap(); }), 1);
        assert_eq!(warnings_during(|| { Measure::tversky(0.0); Measure::tversky(2.0); }), 0);
    }

    #[test]
    fn unequal_lengths_use_shorter_vector() {
        let long = bits("1100");
        let short = bits("11");
        assert_eq!(BitCounts::of(&long, &short), BitCounts { a: 2, b: 0, c: 0, d: 0 });
        assert_eq!(Measure::Tanimoto.similarity(&long, &short), 1.0);
        assert_eq!(Measure::Tanimoto.similarity(&short, &long), 1.0);
    }

    #[test]
    fn codes_round_trip() {
        for m in ALL {
            let alpha = match m {
                Measure::Tversky { alpha } => alpha,
                _ => 0.0,
            };
            assert_eq!(Measure::from_code(m.code(), alpha).unwrap(), m);
        }
        assert!(Measure::from_code('X', 1.0).is_err());
    }

    #[test]
    fn measure_from_config() {
        let m: Measure = serde_json::from_str(r#"{"kind":"tversky","alpha":0.7}"#).unwrap();
        assert_eq!(m, Measure::Tversky { alpha: 0.7 });
        let m: Measure = serde_json::from_str(r#"{"kind":"bub"}"#).unwrap();
        assert_eq!(m, Measure::Bub);
    }

    fn shape(fps: [&str; 4]) -> ShapeFingerprint {
        ShapeFingerprint::new(fps.map(bits))
    }

    #[test]
    fn best_flip_search() {
        let reference = shape(["11110000", "00001111", "11000011", "00111100"]);
        let candidate = shape(["00001111", "11000000", "11110000", "11110001"]);
        let (flip, value) = Measure::Tanimoto.best_flip(&reference, &candidate);
        assert_eq!(flip, 2);
        assert!(close(value, 1.0));
        assert!(close(Measure::Tanimoto.shape_distance(&reference, &candidate), 0.0));
    }

    #[test]
    fn pairwise_matrix() {
        let fps = three_shapes();
        let sim = pairwise(&fps, &Measure::Tanimoto, MatrixMode::Similarity);
        let dist = pairwise(&fps, &Measure::Tanimoto, MatrixMode::Distance);
        for i in 0..3 {
            assert_eq!(sim[i][i], 1.0);
            assert_eq!(dist[i][i], 0.0);
            for j in 0..3 {
                if i != j {
                    assert!(close(sim[i][j] + dist[i][j], 1.0));
                }
            }
        }
        assert!(close(sim[0][1], 0.75));
        assert!(close(sim[0][2], 0.5));
    }

    fn three_shapes() -> Vec<ShapeFingerprint> {
        vec![
            shape(["11110000", "00001111", "11000011", "00111100"]),
            shape(["11100000", "00000111", "11000001", "00111000"]),
            shape(["00000011", "11000000", "00000011", "00000011"]),
        ]
    }

    fn assert_row(row: &[(usize, f64)], expected: &[(usize, f64)]) {
        assert_eq!(row.len(), expected.len(), "{row:?}");
        for (&(j, v), &(ej, ev)) in row.iter().zip(expected) {
            assert_eq!(j, ej);
            assert!(close(v, ev), "{v} != {ev}");
        }
    }

    #[test]
    fn similarity_band() {
        let band = pairwise_band(&three_shapes(), &Measure::Tanimoto, MatrixMode::Similarity, 0.6);
        assert_eq!(band.len(), 3);
        assert_row(&band[0], &[(1, 0.75)]);
        assert_row(&band[1], &[(0, 0.75), (2, 2.0 / 3.0)]);
        assert_row(&band[2], &[(1, 2.0 / 3.0)]);
    }

    #[test]
    fn distance_band() {
        let band = pairwise_band(&three_shapes(), &Measure::Tanimoto, MatrixMode::Distance, 0.4);
        assert_row(&band[0], &[(1, 0.25)]);
        assert_row(&band[1], &[(0, 0.25), (2, 1.0 / 3.0)]);
        assert_row(&band[2], &[(1, 1.0 / 3.0)]);
        // Threshold is inclusive.
        let band = pairwise_band(&three_shapes(), &Measure::Tanimoto, MatrixMode::Distance, 0.5);
        assert_row(&band[0], &[(1, 0.25), (2, 0.5)]);
    }

    #[test]
    fn band_matches_full_matrix() {
        let fps = three_shapes();
        let full = pairwise(&fps, &Measure::Cosine, MatrixMode::Similarity);
        let band = pairwise_band(&fps, &Measure::Cosine, MatrixMode::Similarity, 0.0);
        for (i, row) in band.iter().enumerate() {
            assert_eq!(row.len(), 2);
            for &(j, v) in row {
                assert_ne!(i, j);
                assert_eq!(v, full[i][j]);
            }
        }
    }

    #[test]
    fn diverse_targets() {
        let database = vec![bits("11110000"), bits("00001111")];
        let targets = vec![bits("11110000"), bits("11000000"), bits("00110011")];
        // Target 1 scores exactly 0.5 against entry 0, which is not below
        // the threshold.
        assert_eq!(diverse(&targets, &database, &Measure::Tanimoto, 0.5), vec![2]);
        assert_eq!(diverse(&targets, &database, &Measure::Tanimoto, 1.01), vec![0, 1, 2]);
        assert_eq!(diverse(&targets, &[], &Measure::Tanimoto, 0.0), vec![0, 1, 2]);
    }

    #[test]
    fn shape_self_similarity() {
        let sfp = shape(["10110000", "00001101", "11000001", "00100100"]);
        for m in [Measure::Tanimoto, Measure::Cosine, Measure::Hamann] {
            assert!(close(m.shape_similarity(&sfp, &sfp), 1.0));
        }
    }
}
