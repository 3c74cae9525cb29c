// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Core Engine
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Riemannian distance between points of the four-dimensional state
//! manifold (success probability, trust, stress, reality).
//!
//! Three fidelity levels share one metric:
//!
//! | mode     | backend                               | cost      |
//! |----------|---------------------------------------|-----------|
//! | `line`   | straight segment, midpoint rule       | cheapest  |
//! | `geo`    | optimised quadratic Bezier curve      | moderate  |
//! | `strict` | shooting-method geodesic (RK4)        | expensive |
//!
//! # Invariants
//!
//! 1. **The metric is SPD everywhere**: it is built as `AᵀA + 1e-3·I`
//!    with `A` upper-triangular and a positive diagonal, at clamped
//!    coordinates, so every quadratic form is strictly positive.
//!
//! 2. **Distances are total**: every backend returns a finite,
//!    non-negative length for any pair of unit-box points. Iteration
//!    budgets running out is not an error.
//!
//! 3. **Mode substitution is explicit**: `distance()` fails on an
//!    unavailable `strict`; only `distance_normalized()` falls back, and
//!    it marks the result.
//!
//! 4. **Deterministic output**: the `geo` search is seeded, so identical
//!    inputs and configuration give identical lengths.

pub mod approx;
pub mod christoffel;
pub mod engine;
pub mod integrator;
pub mod line;
pub mod linalg;
pub mod metric;
#[cfg(feature = "strict")]
pub mod shooter;
pub mod validator;

pub use approx::{BezierApproximator, BezierOutcome};
pub use christoffel::{
    christoffel, CacheStats, ChristoffelCache, ChristoffelEvaluator, ConnectionField,
};
pub use engine::{reference_pair, DistanceEngine, ReferenceCache, GEO_VS_STRICT_TOLERANCE};
pub use integrator::{Euler, GeodesicStepper, PhaseState, Rk4};
pub use line::line_length;
pub use metric::{curvature_heuristic, metric, MetricModel, StateMetric};
#[cfg(feature = "strict")]
pub use shooter::{GeodesicShooter, ShootOutcome};
pub use validator::{DistanceValidator, ValidationOutcome};
