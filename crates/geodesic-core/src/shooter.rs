// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Shooting-Method Geodesic Solver ("strict")
// ─────────────────────────────────────────────────────────────────────
//! Two-point boundary-value solver for the geodesic equation.
//!
//! Each iteration:
//!   1. Integrate x(0) = start, v(0) = v₀ over t ∈ [0, 1] with `steps`
//!      fixed steps of the configured stepper (RK4 by default).
//!   2. Accumulate arc length with the midpoint rule.
//!   3. Stop if ‖x(1) − end‖₂ < tolerance; otherwise
//!      v₀ ← v₀ − lr · (x(1) − end), lr ← lr · lr_decay.
//!
//! The shortest trajectory seen over all iterations is returned, which
//! need not be the last one and need not hit `end` exactly. Exhausting
//! the iteration budget is not an error.

use geodesic_types::{GeodesicPath, ShootStats, StrictConfig, Vector4, DIM};

use crate::christoffel::ChristoffelEvaluator;
use crate::integrator::{GeodesicStepper, PhaseState, Rk4};
use crate::linalg::{norm, sub};
use crate::line::segment_length;
use crate::metric::{MetricModel, StateMetric};

/// Best-effort solution of one boundary-value problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ShootOutcome {
    pub length: f64,
    pub path: GeodesicPath,
    pub iterations: usize,
    pub converged: bool,
    pub terminal_error: f64,
}

impl ShootOutcome {
    /// Diagnostics view; the path is attached only when asked for.
    pub fn stats(&self, record_path: bool) -> ShootStats {
        ShootStats {
            iterations: self.iterations,
            converged: self.converged,
            terminal_error: self.terminal_error,
            path: record_path.then(|| self.path.clone()),
        }
    }
}

/// One integrated trajectory.
struct Trajectory {
    length: f64,
    points: Vec<Vector4>,
}

/// Shooting solver over a Christoffel evaluator and a stepper.
pub struct GeodesicShooter<M = StateMetric, S = Rk4> {
    field: ChristoffelEvaluator<M>,
    stepper: S,
    config: StrictConfig,
}

impl<M: MetricModel> GeodesicShooter<M, Rk4> {
    pub fn new(field: ChristoffelEvaluator<M>, config: StrictConfig) -> Self {
        Self::with_stepper(field, Rk4, config)
    }
}

impl<M: MetricModel, S: GeodesicStepper> GeodesicShooter<M, S> {
    pub fn with_stepper(field: ChristoffelEvaluator<M>, stepper: S, config: StrictConfig) -> Self {
        Self {
            field,
            stepper,
            config,
        }
    }

    pub fn config(&self) -> &StrictConfig {
        &self.config
    }

    pub fn field(&self) -> &ChristoffelEvaluator<M> {
        &self.field
    }

    fn integrate(&self, x0: &Vector4, v0: &Vector4) -> Trajectory {
        let steps = self.config.steps.max(1);
        let h = 1.0 / steps as f64;
        let model = self.field.model();

        let mut state = PhaseState::new(*x0, *v0);
        let mut points = Vec::with_capacity(steps + 1);
        points.push(*x0);
        let mut length = 0.0;

        for _ in 0..steps {
            state = self.stepper.step(&self.field, &state, h);
            if let Some(prev) = points.last() {
                length += segment_length(model, prev, &state.x);
            }
            points.push(state.x);
        }
        Trajectory { length, points }
    }

    /// Solve the boundary-value problem between two embedded points.
    pub fn shoot(&self, start: &Vector4, end: &Vector4) -> ShootOutcome {
        let mut v = sub(end, start);
        let mut lr = self.config.learning_rate;

        let mut best: Option<Trajectory> = None;
        let mut iterations = 0;
        let mut converged = false;
        let mut terminal_error = f64::INFINITY;

        for _ in 0..self.config.max_iterations.max(1) {
            iterations += 1;
            let traj = self.integrate(start, &v);
            let reached = traj.points.last().copied().unwrap_or(*start);
            let err = sub(&reached, end);
            terminal_error = norm(&err);

            if best.as_ref().map_or(true, |b| traj.length < b.length) {
                best = Some(traj);
            }
            if terminal_error < self.config.tolerance {
                converged = true;
                break;
            }
            for i in 0..DIM {
                v[i] -= lr * err[i];
            }
            lr *= self.config.lr_decay;
        }

        if !converged {
            log::debug!(
                "shooting stopped after {iterations} iterations, terminal error {terminal_error:.3e}"
            );
        }

        let (length, points) = match best {
            Some(t) => (t.length, t.points),
            None => (0.0, vec![*start]),
        };
        ShootOutcome {
            length,
            path: GeodesicPath::new(points),
            iterations,
            converged,
            terminal_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::Euler;
    use crate::line::line_length;
    use crate::linalg::identity;
    use geodesic_types::{ChristoffelConfig, DerivativeScheme, Matrix4, StatePoint};

    struct Flat;

    impl MetricModel for Flat {
        fn metric(&self, _x: &Vector4) -> Matrix4 {
            identity()
        }
    }

    fn flat_shooter() -> GeodesicShooter<Flat> {
        GeodesicShooter::new(
            ChristoffelEvaluator::new(Flat, 1e-4, DerivativeScheme::ClampedCentral),
            StrictConfig::default(),
        )
    }

    fn state_shooter(config: StrictConfig) -> GeodesicShooter {
        GeodesicShooter::new(
            ChristoffelEvaluator::from_config(&ChristoffelConfig::default()),
            config,
        )
    }

    #[test]
    fn test_flat_space_converges_immediately_to_euclidean_length() {
        let a = [0.1, 0.2, 0.3, 0.4];
        let b = [0.8, 0.6, 0.2, 0.9];
        let out = flat_shooter().shoot(&a, &b);
        assert!(out.converged);
        assert_eq!(out.iterations, 1);
        assert!((out.length - norm(&sub(&b, &a))).abs() < 1e-9);
        assert_eq!(out.path.len(), 201);
        assert_eq!(out.path.first(), Some(&a));
    }

    #[test]
    fn test_path_starts_at_start_and_length_is_finite() {
        let a = StatePoint::new(0.2, 0.9, 0.7, 0.4).embed();
        let b = StatePoint::new(0.7, 0.3, 0.2, 0.6).embed();
        let out = state_shooter(StrictConfig::default()).shoot(&a, &b);
        assert!(out.length.is_finite() && out.length > 0.0);
        assert_eq!(out.path.first(), Some(&a));
        assert!(out.iterations >= 1 && out.iterations <= 12);
        assert!(out.terminal_error.is_finite());
    }

    #[test]
    fn test_close_to_line_length_for_short_hops() {
        let a = StatePoint::new(0.5, 0.5, 0.5, 0.5).embed();
        let b = StatePoint::new(0.55, 0.48, 0.5, 0.53).embed();
        let out = state_shooter(StrictConfig::default()).shoot(&a, &b);
        let line = line_length(&StateMetric, &a, &b, 48);
        assert!((out.length - line).abs() / line < 0.05, "strict {} line {line}", out.length);
    }

    #[test]
    fn test_returns_shortest_iteration() {
        // A single iteration with the initial guess is an upper bound on
        // what more iterations may return.
        let a = StatePoint::low_extreme().embed();
        let b = StatePoint::high_extreme().embed();
        let one = state_shooter(StrictConfig {
            max_iterations: 1,
            ..StrictConfig::default()
        })
        .shoot(&a, &b);
        let many = state_shooter(StrictConfig::default()).shoot(&a, &b);
        assert!(many.length <= one.length);
    }

    #[test]
    fn test_stats_attach_path_on_request() {
        let out = flat_shooter().shoot(&[0.0; DIM], &[0.5; DIM]);
        assert!(out.stats(false).path.is_none());
        assert_eq!(out.stats(true).path.map(|p| p.len()), Some(201));
    }

    #[test]
    fn test_stepper_is_substitutable() {
        let shooter = GeodesicShooter::with_stepper(
            ChristoffelEvaluator::new(Flat, 1e-4, DerivativeScheme::ClampedCentral),
            Euler,
            StrictConfig {
                steps: 10,
                ..StrictConfig::default()
            },
        );
        let out = shooter.shoot(&[0.0; DIM], &[0.3, 0.0, 0.0, 0.4]);
        assert!(out.converged);
        assert!((out.length - 0.5).abs() < 1e-9);
    }
}
