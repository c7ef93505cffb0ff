//! Plain-text reference point files: one `x y z` triple per line.

use std::io::{BufRead, Write};

use crate::error::{Result, ShapeError};
use crate::geometry::{Point3D, PointCloud};

/// Read whitespace-separated float triples, one point per line.
/// Blank lines are skipped.
pub fn read_points<R: BufRead>(reader: R) -> Result<PointCloud> {
    let mut points = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(ShapeError::Parse {
                line: line_no,
                message: format!("expected 3 coordinates, found {}", fields.len()),
            });
        }
        let mut p = [0.0; 3];
        for (slot, field) in p.iter_mut().zip(&fields) {
            *slot = field.parse::<f64>().map_err(|e| ShapeError::Parse {
                line: line_no,
                message: format!("bad coordinate {field:?}: {e}"),
            })?;
        }
        points.push(p);
    }
    Ok(points)
}

/// Write points in the form [`read_points`] accepts.
pub fn write_points<W: Write>(mut writer: W, points: &[Point3D]) -> Result<()> {
    for [x, y, z] in points {
        writeln!(writer, "{x} {y} {z}")?;
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hammersley::sample_sphere;

    #[test]
    fn reads_triples() {
        let text = "0 0 0\n\n1.5 -2 3e-1\n  4\t5   6  \n";
        let pts = read_points(text.as_bytes()).unwrap();
        assert_eq!(pts, vec![[0.0, 0.0, 0.0], [1.5, -2.0, 0.3], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = read_points("1 2 3\n1 2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ShapeError::Parse { line: 2, .. }));
    }

    #[test]
    fn rejects_bad_float() {
        let err = read_points("1 two 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ShapeError::Parse { line: 1, .. }));
    }

    #[test]
    fn write_then_read() {
        let pts = sample_sphere(200, 2.5);
        let mut buf = Vec::new();
        write_points(&mut buf, &pts).unwrap();
        assert_eq!(read_points(buf.as_slice()).unwrap(), pts);
    }
}
