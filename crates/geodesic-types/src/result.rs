// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Distance Modes and Results
// ─────────────────────────────────────────────────────────────────────

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeodesicError;
use crate::state::Vector4;

/// Fidelity level of a distance query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    /// Straight embedded segment under the locally sampled metric.
    Line,
    /// Optimised quadratic Bezier curve.
    Geo,
    /// Shooting-method geodesic.
    Strict,
}

impl DistanceMode {
    pub const ALL: [DistanceMode; 3] = [DistanceMode::Line, DistanceMode::Geo, DistanceMode::Strict];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMode::Line => "line",
            DistanceMode::Geo => "geo",
            DistanceMode::Strict => "strict",
        }
    }
}

impl fmt::Display for DistanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMode {
    type Err = GeodesicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(DistanceMode::Line),
            "geo" => Ok(DistanceMode::Geo),
            "strict" => Ok(DistanceMode::Strict),
            other => Err(GeodesicError::Validation(format!(
                "unknown distance mode '{other}', expected line|geo|strict"
            ))),
        }
    }
}

/// Ordered embedded points from start to end of a computed curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeodesicPath {
    pub points: Vec<Vector4>,
}

impl GeodesicPath {
    pub fn new(points: Vec<Vector4>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Vector4> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Vector4> {
        self.points.last()
    }
}

/// Line-integral statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStats {
    pub segments: usize,
}

/// Bezier search statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoStats {
    /// Accepted improvements (random and gradient moves).
    pub improved: usize,
    /// Random candidate control points evaluated.
    pub moves: usize,
    /// Outer rounds executed.
    pub rounds: usize,
    /// Final control point in embedded coordinates.
    pub control_point: Vector4,
}

/// Shooting-method statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootStats {
    /// Shooting iterations executed.
    pub iterations: usize,
    /// Whether the terminal error dropped below tolerance.
    pub converged: bool,
    /// Euclidean terminal error of the last integrated trajectory.
    pub terminal_error: f64,
    /// Best path, present only when path recording is enabled.
    pub path: Option<GeodesicPath>,
}

/// Backend-specific part of the diagnostics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendStats {
    Line(LineStats),
    Geo(GeoStats),
    Strict(ShootStats),
    /// Endpoints coincide; no backend ran.
    Degenerate,
}

/// Diagnostics accompanying every distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Mode that actually produced the length.
    pub mode: DistanceMode,
    /// True when the requested mode failed and `geo` was substituted.
    pub fallback: bool,
    pub stats: BackendStats,
}

impl Diagnostics {
    pub fn new(mode: DistanceMode, stats: BackendStats) -> Self {
        Self {
            mode,
            fallback: false,
            stats,
        }
    }

    /// Mode label, tagged when a fallback happened (e.g. `geo(fallback)`).
    pub fn mode_label(&self) -> String {
        if self.fallback {
            format!("{}(fallback)", self.mode)
        } else {
            self.mode.to_string()
        }
    }
}

/// Result of a distance query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    /// Riemannian length, always ≥ 0.
    pub length: f64,
    pub diagnostics: Diagnostics,
}

/// Result of a normalised distance query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDistance {
    pub length: f64,
    /// `length / reference_length` for the mode in `diagnostics.mode`.
    pub normalized: f64,
    pub reference_length: f64,
    pub diagnostics: Diagnostics,
}
