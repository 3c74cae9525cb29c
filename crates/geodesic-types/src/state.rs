// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — State Points and Embedding
// ─────────────────────────────────────────────────────────────────────
//! The four-coordinate state space and its embedding into `[0, 1]^4`.
//!
//! Embedded order is `(project_success_prob, trust_level,
//! 1 - stress_level, reality)`: stress is a "badness" measure and is
//! flipped into a "goodness" axis before any geometry happens.

use serde::{Deserialize, Serialize};

/// Dimension of the state manifold.
pub const DIM: usize = 4;

/// A point or tangent vector in embedded coordinates.
pub type Vector4 = [f64; DIM];

/// A 4×4 matrix, row-major.
pub type Matrix4 = [[f64; DIM]; DIM];

/// Christoffel tensor `Γ[k][i][j]`, symmetric in `i` and `j`.
pub type Christoffel = [[[f64; DIM]; DIM]; DIM];

/// Neutral value used for coordinates missing from serialized input.
pub const NEUTRAL: f64 = 0.5;

fn neutral() -> f64 {
    NEUTRAL
}

/// Clamp a value to [0, 1], mapping NaN to 0 and Inf to the nearest bound.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_unit: NaN coordinate, clamping to 0.0");
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Raw state coordinates as supplied by collaborators.
///
/// Values outside `[0, 1]` are accepted and clamped during embedding,
/// never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatePoint {
    #[serde(default = "neutral")]
    pub project_success_prob: f64,
    #[serde(default = "neutral")]
    pub trust_level: f64,
    #[serde(default = "neutral")]
    pub stress_level: f64,
    #[serde(default = "neutral")]
    pub reality: f64,
}

impl Default for StatePoint {
    fn default() -> Self {
        Self::new(NEUTRAL, NEUTRAL, NEUTRAL, NEUTRAL)
    }
}

impl StatePoint {
    pub const fn new(
        project_success_prob: f64,
        trust_level: f64,
        stress_level: f64,
        reality: f64,
    ) -> Self {
        Self {
            project_success_prob,
            trust_level,
            stress_level,
            reality,
        }
    }

    /// Every "goodness" coordinate at its minimum (stress at its maximum).
    pub const fn low_extreme() -> Self {
        Self::new(0.0, 0.0, 1.0, 0.0)
    }

    /// Every "goodness" coordinate at its maximum (stress at its minimum).
    pub const fn high_extreme() -> Self {
        Self::new(1.0, 1.0, 0.0, 1.0)
    }

    /// Map into embedded coordinates, clamping into `[0, 1]^4`.
    pub fn embed(&self) -> Vector4 {
        [
            clamp_unit(self.project_success_prob),
            clamp_unit(self.trust_level),
            1.0 - clamp_unit(self.stress_level),
            clamp_unit(self.reality),
        ]
    }

    /// Inverse of [`embed`](Self::embed), clamping each coordinate first.
    pub fn unembed(v: &Vector4) -> Self {
        Self::new(
            clamp_unit(v[0]),
            clamp_unit(v[1]),
            clamp_unit(1.0 - clamp_unit(v[2])),
            clamp_unit(v[3]),
        )
    }
}

/// Clamp an embedded vector into the unit hypercube.
#[inline]
pub fn clamp_embedded(v: &Vector4) -> Vector4 {
    [
        clamp_unit(v[0]),
        clamp_unit(v[1]),
        clamp_unit(v[2]),
        clamp_unit(v[3]),
    ]
}
