// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Bezier Geodesic Approximator ("geo")
// ─────────────────────────────────────────────────────────────────────
//! Approximates the geodesic between two embedded points by a quadratic
//! Bezier curve `B(t) = (1−t)²A + 2(1−t)t·C + t²B` with one free control
//! point `C`, starting at the chord midpoint (the straight line).
//!
//! Search, per round with shrinking jitter:
//!   - `candidates_per_round` seeded random perturbations of `C`,
//!     each kept only if it strictly shortens the curve;
//!   - one forward-difference gradient step on `C`, kept likewise.
//!
//! Only metric evaluations are needed, no Christoffel symbols. Output is
//! deterministic for a fixed seed and configuration.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use geodesic_types::{clamp_embedded, clamp_unit, GeoConfig, GeoStats, Vector4, DIM};

use crate::line::segment_length;
use crate::linalg::midpoint;
use crate::metric::{MetricModel, StateMetric};

/// Result of the Bezier search.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierOutcome {
    pub length: f64,
    pub stats: GeoStats,
}

/// Point on the quadratic Bezier curve at parameter `t`.
#[inline]
pub fn bezier_point(a: &Vector4, c: &Vector4, b: &Vector4, t: f64) -> Vector4 {
    let it = 1.0 - t;
    let mut p = [0.0; DIM];
    for k in 0..DIM {
        p[k] = it * it * a[k] + 2.0 * it * t * c[k] + t * t * b[k];
    }
    p
}

/// Riemannian length of the Bezier curve, `segments` midpoint chords.
pub fn bezier_length<M: MetricModel + ?Sized>(
    model: &M,
    a: &Vector4,
    c: &Vector4,
    b: &Vector4,
    segments: usize,
) -> f64 {
    let n = segments.max(1);
    let mut acc = 0.0;
    let mut prev = *a;
    for i in 1..=n {
        let cur = bezier_point(a, c, b, i as f64 / n as f64);
        acc += segment_length(model, &prev, &cur);
        prev = cur;
    }
    acc
}

/// Randomised local search over the Bezier control point.
#[derive(Debug, Clone)]
pub struct BezierApproximator<M = StateMetric> {
    model: M,
    config: GeoConfig,
}

impl<M: MetricModel> BezierApproximator<M> {
    pub fn new(model: M, config: GeoConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &GeoConfig {
        &self.config
    }

    /// Forward-difference gradient of curve length with respect to `C`.
    ///
    /// Base and shifted lengths are both measured at
    /// `gradient_segments` so discretisation error cancels.
    fn gradient(&self, a: &Vector4, c: &Vector4, b: &Vector4) -> Vector4 {
        let eps = self.config.gradient_eps;
        let segs = self.config.gradient_segments;
        let base = bezier_length(&self.model, a, c, b, segs);
        let mut grad = [0.0; DIM];
        for k in 0..DIM {
            let mut shifted = *c;
            shifted[k] = clamp_unit(shifted[k] + eps);
            let step = shifted[k] - c[k];
            if step == 0.0 {
                continue;
            }
            grad[k] = (bezier_length(&self.model, a, &shifted, b, segs) - base) / step;
        }
        grad
    }

    /// Search for a short Bezier curve between two embedded points.
    pub fn approximate(&self, a: &Vector4, b: &Vector4) -> BezierOutcome {
        let cfg = &self.config;
        let segs = cfg.segments;

        let mut c = midpoint(a, b);
        let mut best = bezier_length(&self.model, a, &c, b, segs);
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let mut jitter = cfg.jitter;
        let mut improved = 0;
        let mut moves = 0;

        for _ in 0..cfg.rounds {
            for _ in 0..cfg.candidates_per_round {
                let mut cand = c;
                for v in cand.iter_mut() {
                    *v = clamp_unit(*v + jitter * (rng.gen::<f64>() - 0.5));
                }
                let len = bezier_length(&self.model, a, &cand, b, segs);
                moves += 1;
                if len < best {
                    c = cand;
                    best = len;
                    improved += 1;
                }
            }

            let grad = self.gradient(a, &c, b);
            let lr = jitter * cfg.gradient_lr_scale;
            let mut stepped = c;
            for k in 0..DIM {
                stepped[k] -= lr * grad[k];
            }
            let stepped = clamp_embedded(&stepped);
            let len = bezier_length(&self.model, a, &stepped, b, segs);
            if len < best {
                c = stepped;
                best = len;
                improved += 1;
            }

            jitter *= cfg.jitter_decay;
        }

        BezierOutcome {
            length: best,
            stats: GeoStats {
                improved,
                moves,
                rounds: cfg.rounds,
                control_point: c,
            },
        }
    }
}

impl Default for BezierApproximator<StateMetric> {
    fn default() -> Self {
        Self::new(StateMetric, GeoConfig::default())
    }
}
