// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Normalized-Distance Validator
// ─────────────────────────────────────────────────────────────────────
//! Accept/reject an observed state by its normalized distance from a
//! target state.

use std::sync::Arc;

use geodesic_types::{Diagnostics, DistanceMode, GeodesicError, GeodesicResult, StatePoint};

use crate::engine::DistanceEngine;

/// Default acceptance threshold on the normalized distance.
pub const DEFAULT_THRESHOLD: f64 = 0.25;

/// Outcome of one validation check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub length: f64,
    pub normalized: f64,
    pub diagnostics: Diagnostics,
}

/// Threshold check on top of [`DistanceEngine::distance_normalized`].
///
/// Inherits the engine's fallback: a `strict` validator on an engine
/// without strict support measures in `geo` and tags the diagnostics.
pub struct DistanceValidator {
    engine: Arc<DistanceEngine>,
    threshold: f64,
    mode: DistanceMode,
}

impl DistanceValidator {
    /// Validator with the default threshold in `geo` mode.
    pub fn new(engine: Arc<DistanceEngine>) -> Self {
        Self {
            engine,
            threshold: DEFAULT_THRESHOLD,
            mode: DistanceMode::Geo,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> GeodesicResult<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(GeodesicError::Config(format!(
                "validator threshold must be finite and non-negative, got {threshold}"
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn with_mode(mut self, mode: DistanceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn mode(&self) -> DistanceMode {
        self.mode
    }

    pub fn engine(&self) -> &Arc<DistanceEngine> {
        &self.engine
    }

    /// Accepted when `normalized ≤ threshold`.
    pub fn check(&self, target: &StatePoint, observed: &StatePoint) -> ValidationOutcome {
        let n = self.engine.distance_normalized(target, observed, self.mode);
        let accepted = n.normalized <= self.threshold;
        if !accepted {
            log::debug!(
                "rejected: normalized distance {:.4} > threshold {:.4} ({})",
                n.normalized,
                self.threshold,
                n.diagnostics.mode_label()
            );
        }
        ValidationOutcome {
            accepted,
            length: n.length,
            normalized: n.normalized,
            diagnostics: n.diagnostics,
        }
    }
}
