// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Distance Engine (Facade)
// ─────────────────────────────────────────────────────────────────────
//! Dispatch between the three fidelity levels and normalisation against
//! a per-mode reference length.
//!
//! - `line`: straight embedded segment, midpoint rule.
//! - `geo`: optimised Bezier curve ([`BezierApproximator`]).
//! - `strict`: shooting-method geodesic ([`GeodesicShooter`]); requires
//!   the `strict` cargo feature and `strict.enabled`.
//!
//! [`DistanceEngine::distance`] never substitutes one mode for another.
//! [`DistanceEngine::distance_normalized`] does: if the requested mode
//! fails, both the query and the reference fall back to `geo` and the
//! diagnostics are tagged.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use geodesic_types::{
    BackendStats, Diagnostics, DistanceMode, DistanceResult, EngineConfig, GeodesicError,
    GeodesicResult, LineStats, Matrix4, NormalizedDistance, StatePoint, Vector4,
};

use crate::approx::BezierApproximator;
use crate::christoffel::{ChristoffelCache, ChristoffelEvaluator};
use crate::line::line_length;
use crate::metric::{self, StateMetric};
#[cfg(feature = "strict")]
use crate::shooter::GeodesicShooter;

/// Regression bound on the mean relative error of `geo` against
/// `strict` over uniformly random pairs. Empirical, not a contract on
/// any single query: individual pairs reach ~0.25.
///
/// Measured baseline with default configuration, 100 ChaCha8 pairs
/// (seed 2024): mean 0.046.
pub const GEO_VS_STRICT_TOLERANCE: f64 = 0.10;

/// Reference lengths per mode, computed once and kept for the lifetime
/// of the cache.
///
/// Thread-safe: each mode has its own slot lock, held while that mode's
/// first value is computed. Concurrent first queries for one mode all
/// observe the same value; other modes are never blocked by it.
pub struct ReferenceCache {
    slots: HashMap<DistanceMode, Mutex<Option<f64>>>,
}

impl Default for ReferenceCache {
    fn default() -> Self {
        Self {
            slots: DistanceMode::ALL
                .iter()
                .map(|&mode| (mode, Mutex::new(None)))
                .collect(),
        }
    }
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: DistanceMode) -> Option<f64> {
        self.slots.get(&mode).and_then(|slot| *slot.lock())
    }

    /// Cached length for `mode`, or the result of `compute`, which is
    /// stored only on success.
    pub fn get_or_try_insert_with(
        &self,
        mode: DistanceMode,
        compute: impl FnOnce() -> GeodesicResult<f64>,
    ) -> GeodesicResult<f64> {
        let slot = self.slots.get(&mode).ok_or_else(|| {
            GeodesicError::Validation(format!("no reference slot for {mode} mode"))
        })?;
        let mut value = slot.lock();
        if let Some(l) = *value {
            return Ok(l);
        }
        let l = compute()?;
        log::info!("reference length for {mode} mode: {l:.6}");
        *value = Some(l);
        Ok(l)
    }

    /// Number of modes with a cached length.
    pub fn len(&self) -> usize {
        self.slots.values().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for slot in self.slots.values() {
            *slot.lock() = None;
        }
    }
}

/// The fixed reference pair: low-extreme corner to high-extreme corner.
pub fn reference_pair() -> (StatePoint, StatePoint) {
    (StatePoint::low_extreme(), StatePoint::high_extreme())
}

/// Riemannian distance engine over the state manifold.
pub struct DistanceEngine {
    config: EngineConfig,
    approximator: BezierApproximator,
    #[cfg(feature = "strict")]
    shooter: GeodesicShooter,
    christoffel_cache: Option<Arc<ChristoffelCache>>,
    references: Arc<ReferenceCache>,
}

impl DistanceEngine {
    /// Build an engine with its own caches. The Christoffel cache is
    /// created only when `christoffel.cache_enabled` is set.
    pub fn new(config: EngineConfig) -> GeodesicResult<Self> {
        let christoffel_cache = config
            .christoffel
            .cache_enabled
            .then(|| Arc::new(ChristoffelCache::from_config(&config.christoffel)));
        Self::with_caches(config, Arc::new(ReferenceCache::new()), christoffel_cache)
    }

    /// Build an engine around injected caches.
    ///
    /// Passing `Some` Christoffel cache enables memoisation regardless
    /// of `christoffel.cache_enabled`.
    pub fn with_caches(
        config: EngineConfig,
        references: Arc<ReferenceCache>,
        christoffel_cache: Option<Arc<ChristoffelCache>>,
    ) -> GeodesicResult<Self> {
        config.validate()?;
        Ok(Self::build(config, references, christoffel_cache))
    }

    /// Engine with default parameters and no Christoffel cache.
    pub fn default_params() -> Self {
        Self::build(EngineConfig::default(), Arc::new(ReferenceCache::new()), None)
    }

    fn build(
        config: EngineConfig,
        references: Arc<ReferenceCache>,
        christoffel_cache: Option<Arc<ChristoffelCache>>,
    ) -> Self {
        let evaluator = ChristoffelEvaluator::with_cache(
            StateMetric,
            config.christoffel.fd_eps,
            config.christoffel.scheme,
            christoffel_cache.clone(),
        );
        #[cfg(not(feature = "strict"))]
        let _ = evaluator;

        Self {
            approximator: BezierApproximator::new(StateMetric, config.geo.clone()),
            #[cfg(feature = "strict")]
            shooter: GeodesicShooter::new(evaluator, config.strict.clone()),
            christoffel_cache,
            references,
            config,
        }
    }

    /// Read-only access to config.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn references(&self) -> &Arc<ReferenceCache> {
        &self.references
    }

    pub fn christoffel_cache(&self) -> Option<&Arc<ChristoffelCache>> {
        self.christoffel_cache.as_ref()
    }

    /// Whether `strict` can run: compiled in and enabled.
    pub fn strict_available(&self) -> bool {
        cfg!(feature = "strict") && self.config.strict.enabled
    }

    /// `strict` when available, otherwise `geo`.
    pub fn preferred_mode(&self) -> DistanceMode {
        if self.strict_available() {
            DistanceMode::Strict
        } else {
            DistanceMode::Geo
        }
    }

    pub fn metric(&self, point: &StatePoint) -> Matrix4 {
        metric::metric(point)
    }

    pub fn curvature_heuristic(&self, point: &StatePoint) -> f64 {
        metric::curvature_heuristic(point)
    }

    /// Distance between two state points in the requested mode.
    ///
    /// Fails with [`GeodesicError::StrictUnavailable`] when `strict` is
    /// requested but unavailable; no other mode is substituted.
    ///
    /// Identical embedded endpoints return exactly 0. Any non-zero
    /// separation goes through the backend, whose per-segment floor
    /// (`sqrt(1e-12)` per segment) leaves a residual of roughly
    /// `segments * 1e-6`: about 5e-5 for `line` and `geo`, 2e-4 for
    /// `strict` at default settings. Lengths of that order do not
    /// indicate real separation.
    pub fn distance(
        &self,
        start: &StatePoint,
        end: &StatePoint,
        mode: DistanceMode,
    ) -> GeodesicResult<DistanceResult> {
        if mode == DistanceMode::Strict && !self.strict_available() {
            return Err(GeodesicError::StrictUnavailable);
        }

        let (a, b) = (start.embed(), end.embed());
        if a == b {
            return Ok(DistanceResult {
                length: 0.0,
                diagnostics: Diagnostics::new(mode, BackendStats::Degenerate),
            });
        }

        let result = match mode {
            DistanceMode::Line => self.run_line(&a, &b),
            DistanceMode::Geo => self.run_geo(&a, &b),
            DistanceMode::Strict => self.run_strict(&a, &b)?,
        };
        if !result.length.is_finite() {
            return Err(GeodesicError::Numerical(format!(
                "{mode} backend produced length {}",
                result.length
            )));
        }
        Ok(result)
    }

    fn run_line(&self, a: &Vector4, b: &Vector4) -> DistanceResult {
        let segments = self.config.line.segments;
        DistanceResult {
            length: line_length(&StateMetric, a, b, segments),
            diagnostics: Diagnostics::new(
                DistanceMode::Line,
                BackendStats::Line(LineStats { segments }),
            ),
        }
    }

    fn run_geo(&self, a: &Vector4, b: &Vector4) -> DistanceResult {
        let out = self.approximator.approximate(a, b);
        DistanceResult {
            length: out.length,
            diagnostics: Diagnostics::new(DistanceMode::Geo, BackendStats::Geo(out.stats)),
        }
    }

    #[cfg(feature = "strict")]
    fn run_strict(&self, a: &Vector4, b: &Vector4) -> GeodesicResult<DistanceResult> {
        let out = self.shooter.shoot(a, b);
        Ok(DistanceResult {
            length: out.length,
            diagnostics: Diagnostics::new(
                DistanceMode::Strict,
                BackendStats::Strict(out.stats(self.config.strict.record_path)),
            ),
        })
    }

    #[cfg(not(feature = "strict"))]
    fn run_strict(&self, _a: &Vector4, _b: &Vector4) -> GeodesicResult<DistanceResult> {
        Err(GeodesicError::StrictUnavailable)
    }

    /// Length between the reference corners in `mode`, floored at
    /// `reference_floor` and cached on first use.
    pub fn reference_length(&self, mode: DistanceMode) -> GeodesicResult<f64> {
        let floor = self.config.reference_floor;
        self.references.get_or_try_insert_with(mode, || {
            let (lo, hi) = reference_pair();
            self.distance(&lo, &hi, mode).map(|r| r.length.max(floor))
        })
    }

    /// Distance plus its ratio to the reference length of the mode used.
    ///
    /// Never fails: any error in the requested mode downgrades both the
    /// query and the reference to `geo`, with `diagnostics.fallback` set.
    pub fn distance_normalized(
        &self,
        start: &StatePoint,
        end: &StatePoint,
        mode: DistanceMode,
    ) -> NormalizedDistance {
        let attempt = self.distance(start, end, mode).and_then(|r| {
            let reference = self.reference_length(mode)?;
            Ok((r, reference))
        });

        let (result, reference, fallback) = match attempt {
            Ok((r, reference)) => (r, reference, false),
            Err(e) => {
                log::warn!("{mode} distance failed ({e}); falling back to geo");
                let (r, reference) = self.geo_with_reference(start, end);
                (r, reference, true)
            }
        };

        let mut diagnostics = result.diagnostics;
        diagnostics.fallback = fallback;
        NormalizedDistance {
            length: result.length,
            normalized: result.length / reference,
            reference_length: reference,
            diagnostics,
        }
    }

    fn geo_with_reference(&self, start: &StatePoint, end: &StatePoint) -> (DistanceResult, f64) {
        let (a, b) = (start.embed(), end.embed());
        let result = if a == b {
            DistanceResult {
                length: 0.0,
                diagnostics: Diagnostics::new(DistanceMode::Geo, BackendStats::Degenerate),
            }
        } else {
            self.run_geo(&a, &b)
        };

        let floor = self.config.reference_floor;
        let reference = self
            .reference_length(DistanceMode::Geo)
            .unwrap_or_else(|e| {
                log::warn!("geo reference failed ({e}); recomputing uncached");
                let (lo, hi) = reference_pair();
                self.run_geo(&lo.embed(), &hi.embed()).length.max(floor)
            });
        (result, reference)
    }
}

impl Default for DistanceEngine {
    fn default() -> Self {
        Self::default_params()
    }
}
