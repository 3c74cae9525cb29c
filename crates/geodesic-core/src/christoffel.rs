// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Christoffel Evaluator
// ─────────────────────────────────────────────────────────────────────
//! Christoffel symbols of the second kind from finite differences of
//! the metric:
//!
//!   Γᵏᵢⱼ = ½ Σₗ gᵏˡ (∂ᵢ gⱼₗ + ∂ⱼ gᵢₗ − ∂ₗ gᵢⱼ)
//!
//! with `gᵏˡ` from [`invert`](crate::linalg::invert). An optional
//! [`ChristoffelCache`] memoises symbols on a quantised grid; cached
//! results are exact for the grid point, so they differ from the
//! uncached value by up to one quantisation step in position.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use geodesic_types::{
    clamp_unit, Christoffel, ChristoffelConfig, DerivativeScheme, Matrix4, StatePoint, Vector4,
    DIM,
};

use crate::linalg::invert;
use crate::metric::{MetricModel, StateMetric};

/// `partials[k]` is `∂g/∂x_k`.
pub type MetricPartials = [Matrix4; DIM];

/// Anything that yields connection coefficients at an embedded point.
pub trait ConnectionField {
    fn christoffel_at(&self, x: &Vector4) -> Christoffel;
}

/// Finite-difference partial derivatives of the metric at `x`.
///
/// Shifted coordinates are clamped into `[0, 1]`. With
/// [`DerivativeScheme::ClampedCentral`] the difference is always divided
/// by `2·eps`, which biases derivatives toward zero within `eps` of the
/// boundary; [`DerivativeScheme::SpanAdjusted`] divides by the span that
/// survived clamping instead.
pub fn partials<M: MetricModel + ?Sized>(
    model: &M,
    x: &Vector4,
    eps: f64,
    scheme: DerivativeScheme,
) -> MetricPartials {
    let mut out = [[[0.0; DIM]; DIM]; DIM];
    for (k, dg) in out.iter_mut().enumerate() {
        let mut plus = *x;
        let mut minus = *x;
        plus[k] = clamp_unit(x[k] + eps);
        minus[k] = clamp_unit(x[k] - eps);

        let denom = match scheme {
            DerivativeScheme::ClampedCentral => 2.0 * eps,
            DerivativeScheme::SpanAdjusted => plus[k] - minus[k],
        };
        if denom <= 0.0 {
            continue;
        }

        let g_plus = model.metric(&plus);
        let g_minus = model.metric(&minus);
        for i in 0..DIM {
            for j in 0..DIM {
                dg[i][j] = (g_plus[i][j] - g_minus[i][j]) / denom;
            }
        }
    }
    out
}

/// Christoffel symbols at `x` for an arbitrary metric model.
pub fn christoffel_with<M: MetricModel + ?Sized>(
    model: &M,
    x: &Vector4,
    eps: f64,
    scheme: DerivativeScheme,
) -> Christoffel {
    let g_inv = invert(&model.metric(x));
    let dg = partials(model, x, eps, scheme);

    let mut gamma = [[[0.0; DIM]; DIM]; DIM];
    for k in 0..DIM {
        for i in 0..DIM {
            for j in 0..DIM {
                let mut s = 0.0;
                for l in 0..DIM {
                    let term = dg[i][j][l] + dg[j][i][l] - dg[l][i][j];
                    s += g_inv[k][l] * term;
                }
                gamma[k][i][j] = 0.5 * s;
            }
        }
    }
    gamma
}

/// Christoffel symbols of the domain metric at a state point.
pub fn christoffel(point: &StatePoint, eps: f64) -> Christoffel {
    christoffel_with(&StateMetric, &point.embed(), eps, DerivativeScheme::ClampedCentral)
}

type GridKey = [i64; DIM];

struct CacheInner {
    entries: HashMap<GridKey, Christoffel>,
    order: VecDeque<GridKey>,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Bounded memo of Christoffel symbols keyed by quantised position.
///
/// Thread-safe: entries are guarded by a `parking_lot::Mutex`. When full,
/// the oldest entry is evicted.
pub struct ChristoffelCache {
    quantum: f64,
    capacity: usize,
    inner: Mutex<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ChristoffelCache {
    pub fn new(quantum: f64, capacity: usize) -> Self {
        Self {
            quantum,
            capacity,
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity.min(1024)),
                order: VecDeque::with_capacity(capacity.min(1024)),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &ChristoffelConfig) -> Self {
        Self::new(config.cache_quantum, config.cache_capacity)
    }

    pub fn quantum(&self) -> f64 {
        self.quantum
    }

    /// Grid cell of an embedded point (clamped into the unit cube).
    pub fn key(&self, x: &Vector4) -> GridKey {
        let mut k = [0i64; DIM];
        for (slot, &v) in k.iter_mut().zip(x.iter()) {
            *slot = (clamp_unit(v) / self.quantum).round() as i64;
        }
        k
    }

    /// Embedded coordinates of a grid cell.
    pub fn grid_point(&self, key: &GridKey) -> Vector4 {
        let mut x = [0.0; DIM];
        for (slot, &k) in x.iter_mut().zip(key.iter()) {
            *slot = clamp_unit(k as f64 * self.quantum);
        }
        x
    }

    /// Return the cached symbols for `key`, computing them with
    /// `compute` on a miss. `compute` runs outside the lock.
    pub fn get_or_compute(
        &self,
        key: GridKey,
        compute: impl FnOnce() -> Christoffel,
    ) -> Christoffel {
        if let Some(hit) = self.inner.lock().entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *hit;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute();

        let mut inner = self.inner.lock();
        if !inner.entries.contains_key(&key) {
            while inner.entries.len() >= self.capacity {
                match inner.order.pop_front() {
                    Some(old) => {
                        inner.entries.remove(&old);
                        log::debug!("christoffel cache full, evicted {old:?}");
                    }
                    None => break,
                }
            }
            inner.entries.insert(key, value);
            inner.order.push_back(key);
        }
        value
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: self.len(),
            capacity: self.capacity,
        }
    }
}

/// Christoffel evaluator bound to a metric model, step size, scheme and
/// optional cache.
#[derive(Clone)]
pub struct ChristoffelEvaluator<M = StateMetric> {
    model: M,
    eps: f64,
    scheme: DerivativeScheme,
    cache: Option<Arc<ChristoffelCache>>,
}

impl ChristoffelEvaluator<StateMetric> {
    /// Evaluator over the domain metric. The cache is attached only when
    /// `cache_enabled` is set.
    pub fn from_config(config: &ChristoffelConfig) -> Self {
        let cache = config
            .cache_enabled
            .then(|| Arc::new(ChristoffelCache::from_config(config)));
        Self::with_cache(StateMetric, config.fd_eps, config.scheme, cache)
    }
}

impl<M: MetricModel> ChristoffelEvaluator<M> {
    pub fn new(model: M, eps: f64, scheme: DerivativeScheme) -> Self {
        Self::with_cache(model, eps, scheme, None)
    }

    pub fn with_cache(
        model: M,
        eps: f64,
        scheme: DerivativeScheme,
        cache: Option<Arc<ChristoffelCache>>,
    ) -> Self {
        Self {
            model,
            eps,
            scheme,
            cache,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn cache(&self) -> Option<&Arc<ChristoffelCache>> {
        self.cache.as_ref()
    }

    pub fn partials(&self, x: &Vector4) -> MetricPartials {
        partials(&self.model, x, self.eps, self.scheme)
    }

    /// Symbols at `x`; served from the grid cache when one is attached.
    pub fn christoffel(&self, x: &Vector4) -> Christoffel {
        match &self.cache {
            Some(cache) => {
                let key = cache.key(x);
                cache.get_or_compute(key, || {
                    christoffel_with(&self.model, &cache.grid_point(&key), self.eps, self.scheme)
                })
            }
            None => christoffel_with(&self.model, x, self.eps, self.scheme),
        }
    }
}

impl<M: MetricModel> ConnectionField for ChristoffelEvaluator<M> {
    fn christoffel_at(&self, x: &Vector4) -> Christoffel {
        self.christoffel(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::identity;

    /// Constant metric: flat space.
    struct Flat;

    impl MetricModel for Flat {
        fn metric(&self, _x: &Vector4) -> Matrix4 {
            identity()
        }
    }

    /// g = diag(1 + x₀², 1, 1, 1): Γ⁰₀₀ = x₀ / (1 + x₀²).
    struct Stretched;

    impl MetricModel for Stretched {
        fn metric(&self, x: &Vector4) -> Matrix4 {
            let mut g = identity();
            let x0 = clamp_unit(x[0]);
            g[0][0] = 1.0 + x0 * x0;
            g
        }
    }

    #[test]
    fn test_flat_metric_has_zero_symbols() {
        let gamma = christoffel_with(&Flat, &[0.3, 0.4, 0.5, 0.6], 1e-4, DerivativeScheme::ClampedCentral);
        assert!(gamma.iter().flatten().flatten().all(|v| *v == 0.0));
    }

    #[test]
    fn test_stretched_metric_matches_analytic() {
        let x = [0.5, 0.5, 0.5, 0.5];
        let gamma = christoffel_with(&Stretched, &x, 1e-4, DerivativeScheme::ClampedCentral);
        let expected = 0.5 / (1.0 + 0.25);
        assert!((gamma[0][0][0] - expected).abs() < 1e-6, "Γ⁰₀₀ = {}", gamma[0][0][0]);
        for k in 0..DIM {
            for i in 0..DIM {
                for j in 0..DIM {
                    if (k, i, j) != (0, 0, 0) {
                        assert!(gamma[k][i][j].abs() < 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_symmetric_in_lower_indices() {
        for p in [
            StatePoint::new(0.2, 0.9, 0.7, 0.4),
            StatePoint::new(0.5, 0.5, 0.5, 0.5),
            StatePoint::low_extreme(),
        ] {
            let gamma = christoffel(&p, 1e-4);
            for k in 0..DIM {
                for i in 0..DIM {
                    for j in 0..DIM {
                        assert!((gamma[k][i][j] - gamma[k][j][i]).abs() < 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_partials_match_linear_metric_slope() {
        // Stretched: ∂g₀₀/∂x₀ = 2x₀.
        let dg = partials(&Stretched, &[0.4, 0.1, 0.1, 0.1], 1e-4, DerivativeScheme::ClampedCentral);
        assert!((dg[0][0][0] - 0.8).abs() < 1e-8);
        assert_eq!(dg[1][0][0], 0.0);
    }

    #[test]
    fn test_boundary_bias_and_span_adjusted_scheme() {
        // At x₀ = 1 the plus shift clamps away; true slope is 2.
        let x = [1.0, 0.5, 0.5, 0.5];
        let clamped = partials(&Stretched, &x, 1e-4, DerivativeScheme::ClampedCentral);
        let adjusted = partials(&Stretched, &x, 1e-4, DerivativeScheme::SpanAdjusted);
        assert!((clamped[0][0][0] - 1.0).abs() < 1e-3, "got {}", clamped[0][0][0]);
        assert!((adjusted[0][0][0] - 2.0).abs() < 1e-3, "got {}", adjusted[0][0][0]);
    }

    #[test]
    fn test_cache_hits_on_same_cell() {
        let cache = Arc::new(ChristoffelCache::new(1e-3, 16));
        let eval = ChristoffelEvaluator::with_cache(
            StateMetric,
            1e-4,
            DerivativeScheme::ClampedCentral,
            Some(cache.clone()),
        );
        let a = eval.christoffel(&[0.30001, 0.5, 0.5, 0.5]);
        let b = eval.christoffel(&[0.29999, 0.5, 0.5, 0.5]);
        assert_eq!(a, b);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.len, 1);
    }

    #[test]
    fn test_cached_value_close_to_exact() {
        let config = ChristoffelConfig {
            cache_enabled: true,
            ..ChristoffelConfig::default()
        };
        let cached = ChristoffelEvaluator::from_config(&config);
        let exact = ChristoffelEvaluator::from_config(&ChristoffelConfig::default());
        assert!(cached.cache().is_some());
        assert!(exact.cache().is_none());

        let x = [0.3337, 0.6012, 0.2499, 0.8123];
        let a = cached.christoffel(&x);
        let b = exact.christoffel(&x);
        for k in 0..DIM {
            for i in 0..DIM {
                for j in 0..DIM {
                    assert!((a[k][i][j] - b[k][i][j]).abs() < 1e-2);
                }
            }
        }
    }

    #[test]
    fn test_cache_capacity_is_hard_cap() {
        let cache = ChristoffelCache::new(1e-3, 3);
        for i in 0..10 {
            let key = cache.key(&[i as f64 * 0.01, 0.0, 0.0, 0.0]);
            cache.get_or_compute(key, || [[[i as f64; DIM]; DIM]; DIM]);
        }
        assert_eq!(cache.len(), 3);
        // Oldest entries are gone, newest kept.
        let newest = cache.key(&[0.09, 0.0, 0.0, 0.0]);
        let v = cache.get_or_compute(newest, || [[[-1.0; DIM]; DIM]; DIM]);
        assert_eq!(v[0][0][0], 9.0);
        cache.clear();
        assert!(cache.is_empty());
    }
}
