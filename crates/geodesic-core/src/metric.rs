// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Metric Model
// ─────────────────────────────────────────────────────────────────────
//! Position-dependent metric tensor on the embedded state space.
//!
//! The metric is built from an upper-triangular factor `A` whose
//! diagonal carries per-axis stiffness and whose upper entries carry the
//! coupling between axes:
//!
//!   g(x) = A(x)ᵀ A(x) + 1e-3 · I
//!
//! which is symmetric positive definite for every `A`. This is the only
//! metric formula in the crate; every backend goes through it.

use geodesic_types::{clamp_embedded, Matrix4, StatePoint, Vector4, DIM};

/// Diagonal regulariser added to every metric.
pub const METRIC_REGULARISER: f64 = 1e-3;

/// Floor for Gershgorin lower bounds in [`curvature_heuristic`].
const GERSHGORIN_FLOOR: f64 = 1e-6;

/// A source of metric tensors over embedded coordinates.
///
/// The engine only ever uses [`StateMetric`]; the trait is the seam the
/// Christoffel evaluator and the backends are written against.
pub trait MetricModel: Send + Sync {
    /// Metric at an embedded point. Coordinates outside `[0, 1]` must be
    /// clamped by the implementation.
    fn metric(&self, x: &Vector4) -> Matrix4;
}

/// The domain metric over (success, trust, 1 - stress, reality).
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMetric;

impl StateMetric {
    /// Upper-triangular factor `A(x)`.
    ///
    /// Lower success likelihood and higher stress stiffen their axes
    /// the most; trust and reality stiffen as they grow.
    pub fn factor(x: &Vector4) -> Matrix4 {
        let [ps, tr, is, re] = clamp_embedded(x);
        [
            [
                1.0 + 0.6 * (1.0 - ps),
                0.15 * (tr - 0.5),
                0.10 * (0.5 - is),
                0.06 * (re - 0.5),
            ],
            [0.0, 1.0 + 0.5 * tr, 0.12 * (tr - 0.5), 0.05 * (re - 0.5)],
            [0.0, 0.0, 1.0 + 0.7 * (1.0 - is), 0.04 * (0.5 - is)],
            [0.0, 0.0, 0.0, 1.0 + 0.4 * re],
        ]
    }
}

impl MetricModel for StateMetric {
    fn metric(&self, x: &Vector4) -> Matrix4 {
        let a = Self::factor(x);
        let mut g = [[0.0; DIM]; DIM];
        for i in 0..DIM {
            for j in i..DIM {
                let s: f64 = (0..DIM).map(|k| a[k][i] * a[k][j]).sum();
                g[i][j] = s;
                g[j][i] = s;
            }
            g[i][i] += METRIC_REGULARISER;
        }
        g
    }
}

/// Metric at a state point.
pub fn metric(point: &StatePoint) -> Matrix4 {
    StateMetric.metric(&point.embed())
}

/// Cheap explanatory scalar: ½·trace(g) plus ½ of a Gershgorin
/// anisotropy ratio (largest upper disc bound over smallest lower disc
/// bound).
///
/// Not a curvature invariant. Intended for debug output only.
pub fn curvature_heuristic(point: &StatePoint) -> f64 {
    let g = metric(point);
    let mut upper = f64::NEG_INFINITY;
    let mut lower = f64::INFINITY;
    let mut trace = 0.0;
    for i in 0..DIM {
        let radius: f64 = (0..DIM).filter(|&j| j != i).map(|j| g[i][j].abs()).sum();
        upper = upper.max(g[i][i] + radius);
        lower = lower.min((g[i][i] - radius).max(GERSHGORIN_FLOOR));
        trace += g[i][i];
    }
    let kappa = upper / lower.max(GERSHGORIN_FLOOR);
    0.5 * trace + 0.5 * kappa
}
