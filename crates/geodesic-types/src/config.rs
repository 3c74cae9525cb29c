// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Engine Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{GeodesicError, GeodesicResult};

/// How metric partial derivatives are taken near the domain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeScheme {
    /// Central difference with both shifts clamped into [0, 1], divided
    /// by `2·eps` regardless of clamping. Saturates toward zero at the
    /// boundary.
    ClampedCentral,
    /// Same clamped shifts, divided by the actual clamped span. Degrades
    /// to a one-sided difference at the boundary.
    SpanAdjusted,
}

/// Straight-line integral parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Midpoint-rule segments. Default: 48.
    pub segments: usize,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self { segments: 48 }
    }
}

/// Bezier approximator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Segments used to measure a candidate curve. Default: 64.
    pub segments: usize,
    /// Segments used for the finite-difference gradient. Default: 48.
    pub gradient_segments: usize,
    /// Outer search rounds. Default: 5.
    pub rounds: usize,
    /// Initial perturbation width. Default: 0.15.
    pub jitter: f64,
    /// Per-round jitter multiplier. Default: 0.6.
    pub jitter_decay: f64,
    /// Random candidates per round. Default: 10.
    pub candidates_per_round: usize,
    /// Forward-difference step on the control point. Default: 1e-3.
    pub gradient_eps: f64,
    /// Descent step as a fraction of the current jitter. Default: 0.3.
    pub gradient_lr_scale: f64,
    /// Seed of the candidate generator. Default: 42.
    pub seed: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            segments: 64,
            gradient_segments: 48,
            rounds: 5,
            jitter: 0.15,
            jitter_decay: 0.6,
            candidates_per_round: 10,
            gradient_eps: 1e-3,
            gradient_lr_scale: 0.3,
            seed: 42,
        }
    }
}

/// Shooting solver parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrictConfig {
    /// Runtime switch for the strict backend. Default: true.
    pub enabled: bool,
    /// RK4 steps over t ∈ [0, 1]. Default: 200.
    pub steps: usize,
    /// Shooting iterations. Default: 12.
    pub max_iterations: usize,
    /// Initial velocity correction rate. Default: 0.2.
    pub learning_rate: f64,
    /// Per-iteration learning-rate multiplier. Default: 0.9.
    pub lr_decay: f64,
    /// Terminal Euclidean error accepted as converged. Default: 1e-4.
    pub tolerance: f64,
    /// Attach the best path to the diagnostics. Default: false.
    pub record_path: bool,
}

impl Default for StrictConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            steps: 200,
            max_iterations: 12,
            learning_rate: 0.2,
            lr_decay: 0.9,
            tolerance: 1e-4,
            record_path: false,
        }
    }
}

/// Christoffel evaluation and memoisation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChristoffelConfig {
    /// Finite-difference step. Default: 1e-4.
    pub fd_eps: f64,
    /// Default: clamped central differences.
    pub scheme: DerivativeScheme,
    /// Memoise symbols on a quantised grid. Results become approximate
    /// by up to `cache_quantum`. Default: false.
    pub cache_enabled: bool,
    /// Grid resolution for the cache key. Default: 1e-3.
    pub cache_quantum: f64,
    /// Hard cap on cached entries. Default: 10_000.
    pub cache_capacity: usize,
}

impl Default for ChristoffelConfig {
    fn default() -> Self {
        Self {
            fd_eps: 1e-4,
            scheme: DerivativeScheme::ClampedCentral,
            cache_enabled: false,
            cache_quantum: 1e-3,
            cache_capacity: 10_000,
        }
    }
}

/// Runtime configuration for the distance engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub line: LineConfig,
    pub geo: GeoConfig,
    pub strict: StrictConfig,
    pub christoffel: ChristoffelConfig,
    /// Lower bound on any cached reference length. Default: 1e-6.
    pub reference_floor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            line: LineConfig::default(),
            geo: GeoConfig::default(),
            strict: StrictConfig::default(),
            christoffel: ChristoffelConfig::default(),
            reference_floor: 1e-6,
        }
    }
}

fn require_count(name: &str, value: usize) -> GeodesicResult<()> {
    if value == 0 {
        return Err(GeodesicError::Config(format!("{name} must be > 0")));
    }
    Ok(())
}

fn require_positive(name: &str, value: f64) -> GeodesicResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GeodesicError::Config(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn require_decay(name: &str, value: f64) -> GeodesicResult<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(GeodesicError::Config(format!(
            "{name} must be in (0, 1], got {value}"
        )));
    }
    Ok(())
}

impl EngineConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> GeodesicResult<()> {
        require_count("line.segments", self.line.segments)?;

        require_count("geo.segments", self.geo.segments)?;
        require_count("geo.gradient_segments", self.geo.gradient_segments)?;
        require_positive("geo.jitter", self.geo.jitter)?;
        require_decay("geo.jitter_decay", self.geo.jitter_decay)?;
        require_positive("geo.gradient_eps", self.geo.gradient_eps)?;
        require_positive("geo.gradient_lr_scale", self.geo.gradient_lr_scale)?;

        require_count("strict.steps", self.strict.steps)?;
        require_count("strict.max_iterations", self.strict.max_iterations)?;
        require_positive("strict.learning_rate", self.strict.learning_rate)?;
        require_decay("strict.lr_decay", self.strict.lr_decay)?;
        require_positive("strict.tolerance", self.strict.tolerance)?;

        require_positive("christoffel.fd_eps", self.christoffel.fd_eps)?;
        if self.christoffel.cache_enabled {
            require_positive("christoffel.cache_quantum", self.christoffel.cache_quantum)?;
            require_count("christoffel.cache_capacity", self.christoffel.cache_capacity)?;
        }

        require_positive("reference_floor", self.reference_floor)?;
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> GeodesicResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GeodesicError::Config(format!("JSON parse error: {e}")))
    }
}
