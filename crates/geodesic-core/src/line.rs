// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Riemannian Line Integrals
// ─────────────────────────────────────────────────────────────────────
//! Midpoint-rule arc length shared by every backend, and the cheap
//! straight-segment distance (`line` mode).

use geodesic_types::{Vector4, DIM};

use crate::linalg::{midpoint, quad_form, sub};
use crate::metric::MetricModel;

/// Floor applied to each segment's quadratic form before the square
/// root, so rounding noise cannot produce a negative argument.
pub const QUAD_FLOOR: f64 = 1e-12;

/// Length of the chord `a → b` under the metric at its midpoint.
#[inline]
pub fn segment_length<M: MetricModel + ?Sized>(model: &M, a: &Vector4, b: &Vector4) -> f64 {
    let g = model.metric(&midpoint(a, b));
    quad_form(&g, &sub(b, a)).max(QUAD_FLOOR).sqrt()
}

/// Length of a polyline, segment by segment.
pub fn polyline_length<M: MetricModel + ?Sized>(model: &M, points: &[Vector4]) -> f64 {
    points
        .windows(2)
        .map(|w| segment_length(model, &w[0], &w[1]))
        .sum()
}

/// Riemannian length of the straight embedded segment `a → b`, split
/// into `segments` equal pieces. Ignores curvature entirely.
pub fn line_length<M: MetricModel + ?Sized>(
    model: &M,
    a: &Vector4,
    b: &Vector4,
    segments: usize,
) -> f64 {
    let n = segments.max(1);
    let mut dv = [0.0; DIM];
    for i in 0..DIM {
        dv[i] = (b[i] - a[i]) / n as f64;
    }

    let mut acc = 0.0;
    let mut p = *a;
    for _ in 0..n {
        let mut mid = p;
        for i in 0..DIM {
            mid[i] += 0.5 * dv[i];
        }
        let g = model.metric(&mid);
        acc += quad_form(&g, &dv).max(QUAD_FLOOR).sqrt();
        for i in 0..DIM {
            p[i] += dv[i];
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::identity;
    use crate::metric::StateMetric;
    use geodesic_types::Matrix4;

    struct Scaled(f64);

    impl MetricModel for Scaled {
        fn metric(&self, _x: &Vector4) -> Matrix4 {
            let mut g = identity();
            for (i, row) in g.iter_mut().enumerate() {
                row[i] = self.0;
            }
            g
        }
    }

    #[test]
    fn test_constant_metric_gives_scaled_euclidean_length() {
        let a = [0.1, 0.2, 0.3, 0.4];
        let b = [0.9, 0.5, 0.1, 0.4];
        let euclid = crate::linalg::norm(&sub(&b, &a));
        let l = line_length(&Scaled(4.0), &a, &b, 48);
        assert!((l - 2.0 * euclid).abs() < 1e-12);
    }

    #[test]
    fn test_line_length_converges_with_segments() {
        let a = [0.0; DIM];
        let b = [1.0; DIM];
        let coarse = line_length(&StateMetric, &a, &b, 48);
        let fine = line_length(&StateMetric, &a, &b, 400);
        assert!((coarse - fine).abs() / fine < 1e-3);
    }

    #[test]
    fn test_polyline_matches_line_on_straight_points() {
        let a = [0.2, 0.3, 0.4, 0.5];
        let b = [0.6, 0.1, 0.9, 0.5];
        let n = 16;
        let points: Vec<Vector4> = (0..=n)
            .map(|k| {
                let t = k as f64 / n as f64;
                let mut p = [0.0; DIM];
                for i in 0..DIM {
                    p[i] = a[i] + t * (b[i] - a[i]);
                }
                p
            })
            .collect();
        let l1 = polyline_length(&StateMetric, &points);
        let l2 = line_length(&StateMetric, &a, &b, n);
        assert!((l1 - l2).abs() < 1e-9);
    }

    #[test]
    fn test_segment_floor_applies_to_zero_chord() {
        let a = [0.5; DIM];
        let l = segment_length(&StateMetric, &a, &a);
        assert!((l - QUAD_FLOOR.sqrt()).abs() < 1e-18);
    }
}
