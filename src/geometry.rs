//! Point, sphere and atom primitives shared by the shape pipeline.

/// A location in 3-space: `[x, y, z]`.
pub type Point3D = [f64; 3];

/// Ordered, index-stable point sequence. A point's index is its fingerprint bit.
pub type PointCloud = Vec<Point3D>;

/// Atomic number of hydrogen.
const HYDROGEN: u8 = 1;

/// A sphere given by its center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Point3D,
    pub radius: f64,
}

impl Sphere {
    #[inline]
    pub fn new(center: Point3D, radius: f64) -> Self {
        Self { center, radius }
    }

    /// True if `p` lies inside or on the sphere scaled by `scale`.
    #[inline]
    pub fn contains(&self, p: &Point3D, scale: f64) -> bool {
        let r = self.radius * scale;
        dist_sq(&self.center, p) <= r * r
    }
}

/// One atom of a conformer, as supplied by a geometry reader.
///
/// Radii come from the caller's element table; `atomic_num` is only used to
/// tell hydrogens apart from heavy atoms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    pub pos: Point3D,
    pub radius: f64,
    pub atomic_num: u8,
}

impl Atom {
    pub fn new(atomic_num: u8, pos: Point3D, radius: f64) -> Self {
        Self { pos, radius, atomic_num }
    }

    #[inline]
    pub fn is_hydrogen(&self) -> bool {
        self.atomic_num == HYDROGEN
    }

    #[inline]
    pub fn sphere(&self) -> Sphere {
        Sphere::new(self.pos, self.radius)
    }
}

/// Squared Euclidean distance.
#[inline]
pub fn dist_sq(a: &Point3D, b: &Point3D) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Volume of a sphere of radius `r`.
#[inline]
pub fn sphere_volume(r: f64) -> f64 {
    4.0 / 3.0 * std::f64::consts::PI * r * r * r
}

/// Arithmetic mean of a set of points. The mean of nothing is the origin.
pub fn mean_center<'a, I>(points: I) -> Point3D
where
    I: IntoIterator<Item = &'a Point3D>,
{
    let mut sum = [0.0; 3];
    let mut n = 0usize;
    for p in points {
        sum[0] += p[0];
        sum[1] += p[1];
        sum[2] += p[2];
        n += 1;
    }
    if n == 0 {
        return [0.0; 3];
    }
    let inv_n = 1.0 / n as f64;
    [sum[0] * inv_n, sum[1] * inv_n, sum[2] * inv_n]
}

/// Subtract `offset` from every point in place.
pub fn untranslate(points: &mut [Point3D], offset: &Point3D) {
    for p in points.iter_mut() {
        p[0] -= offset[0];
        p[1] -= offset[1];
        p[2] -= offset[2];
    }
}

/// Axis-aligned bounds `(min, max)` of a point set, or `None` when empty.
pub fn bounding_box(points: &[Point3D]) -> Option<(Point3D, Point3D)> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        for i in 0..3 {
            if p[i] < min[i] { min[i] = p[i]; }
            if p[i] > max[i] { max[i] = p[i]; }
        }
    }
    Some((min, max))
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hydrogen_detection() {
        assert!(Atom::new(1, [0.0; 3], 1.1).is_hydrogen());
        assert!(!Atom::new(6, [0.0; 3], 1.7).is_hydrogen());
    }

    #[test]
    fn sphere_contains_boundary() {
        let s = Sphere::new([0.0; 3], 2.0);
        assert!(s.contains(&[2.0, 0.0, 0.0], 1.0));
        assert!(!s.contains(&[2.0, 0.0, 0.0], 0.5));
    }

    #[test]
    fn unit_sphere_volume() {
        assert!((sphere_volume(1.0) - 4.18879020478639).abs() < 1e-12);
        assert!((sphere_volume(2.0) / sphere_volume(1.0) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn mean_of_empty_is_origin() {
        let pts: Vec<Point3D> = Vec::new();
        assert_eq!(mean_center(&pts), [0.0; 3]);
    }

    #[test]
    fn mean_and_untranslate() {
        let mut pts = vec![[1.0, 2.0, 3.0], [3.0, 4.0, 5.0]];
        let m = mean_center(&pts);
        assert_eq!(m, [2.0, 3.0, 4.0]);
        untranslate(&mut pts, &m);
        assert_eq!(pts, vec![[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]]);
    }

    #[test]
    fn bounds_of_points() {
        assert!(bounding_box(&[]).is_none());
        let (min, max) = bounding_box(&[[1.0, -2.0, 0.0], [-1.0, 5.0, 3.0]]).unwrap();
        assert_eq!(min, [-1.0, -2.0, 0.0]);
        assert_eq!(max, [1.0, 5.0, 3.0]);
    }
}
