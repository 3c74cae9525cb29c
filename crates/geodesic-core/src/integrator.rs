// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Geodesic ODE Steppers
// ─────────────────────────────────────────────────────────────────────
//! Fixed-step integration of the geodesic equation
//!
//!   dx/dt = v,   dv/dt = −Γᵏᵢⱼ(x) vⁱ vʲ
//!
//! Steppers are stateless; the connection is re-evaluated at every
//! stage from the stage position.

use geodesic_types::{Christoffel, Vector4, DIM};

use crate::christoffel::ConnectionField;

/// Position and velocity in embedded coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseState {
    pub x: Vector4,
    pub v: Vector4,
}

impl PhaseState {
    pub fn new(x: Vector4, v: Vector4) -> Self {
        Self { x, v }
    }

    #[inline]
    fn offset(&self, d: &PhaseState, h: f64) -> PhaseState {
        let mut out = *self;
        for i in 0..DIM {
            out.x[i] += h * d.x[i];
            out.v[i] += h * d.v[i];
        }
        out
    }
}

/// Geodesic acceleration `−Γ(x)[v, v]`.
#[inline]
pub fn geodesic_acceleration(gamma: &Christoffel, v: &Vector4) -> Vector4 {
    let mut a = [0.0; DIM];
    for (k, ak) in a.iter_mut().enumerate() {
        let mut s = 0.0;
        for i in 0..DIM {
            for j in 0..DIM {
                s += gamma[k][i][j] * v[i] * v[j];
            }
        }
        *ak = -s;
    }
    a
}

/// Time derivative of a phase state.
#[inline]
pub fn derivative<F: ConnectionField + ?Sized>(field: &F, s: &PhaseState) -> PhaseState {
    let gamma = field.christoffel_at(&s.x);
    PhaseState {
        x: s.v,
        v: geodesic_acceleration(&gamma, &s.v),
    }
}

/// One-step integration strategy for the geodesic ODE.
pub trait GeodesicStepper {
    fn step<F: ConnectionField + ?Sized>(&self, field: &F, state: &PhaseState, h: f64) -> PhaseState;
}

/// Classical 4th-order Runge-Kutta.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4;

impl GeodesicStepper for Rk4 {
    fn step<F: ConnectionField + ?Sized>(&self, field: &F, state: &PhaseState, h: f64) -> PhaseState {
        let k1 = derivative(field, state);
        let k2 = derivative(field, &state.offset(&k1, 0.5 * h));
        let k3 = derivative(field, &state.offset(&k2, 0.5 * h));
        let k4 = derivative(field, &state.offset(&k3, h));

        let mut out = *state;
        for i in 0..DIM {
            out.x[i] += (h / 6.0) * (k1.x[i] + 2.0 * k2.x[i] + 2.0 * k3.x[i] + k4.x[i]);
            out.v[i] += (h / 6.0) * (k1.v[i] + 2.0 * k2.v[i] + 2.0 * k3.v[i] + k4.v[i]);
        }
        out
    }
}

/// Explicit Euler, first order. Mainly a baseline for [`Rk4`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl GeodesicStepper for Euler {
    fn step<F: ConnectionField + ?Sized>(&self, field: &F, state: &PhaseState, h: f64) -> PhaseState {
        let d = derivative(field, state);
        state.offset(&d, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Zero;

    impl ConnectionField for Zero {
        fn christoffel_at(&self, _x: &Vector4) -> Christoffel {
            [[[0.0; DIM]; DIM]; DIM]
        }
    }

    /// Γ⁰₀₀ = c: along axis 0, v' = −c v², so v(t) = v₀ / (1 + c v₀ t).
    struct Drag(f64);

    impl ConnectionField for Drag {
        fn christoffel_at(&self, _x: &Vector4) -> Christoffel {
            let mut g = [[[0.0; DIM]; DIM]; DIM];
            g[0][0][0] = self.0;
            g
        }
    }

    fn run<S: GeodesicStepper, F: ConnectionField>(s: &S, f: &F, v0: Vector4, steps: usize) -> PhaseState {
        let h = 1.0 / steps as f64;
        let mut state = PhaseState::new([0.0; DIM], v0);
        for _ in 0..steps {
            state = s.step(f, &state, h);
        }
        state
    }

    #[test]
    fn test_flat_field_moves_in_straight_line() {
        let end = run(&Rk4, &Zero, [0.2, -0.1, 0.4, 0.0], 50);
        assert!((end.x[0] - 0.2).abs() < 1e-12);
        assert!((end.x[1] + 0.1).abs() < 1e-12);
        assert!((end.x[2] - 0.4).abs() < 1e-12);
        assert_eq!(end.v, [0.2, -0.1, 0.4, 0.0]);
    }

    #[test]
    fn test_rk4_beats_euler_on_drag() {
        let c: f64 = 0.8;
        let v0: f64 = 1.0;
        // x(1) = ln(1 + c v₀) / c
        let exact = (1.0 + c * v0).ln() / c;
        let rk = run(&Rk4, &Drag(c), [v0, 0.0, 0.0, 0.0], 50);
        let eu = run(&Euler, &Drag(c), [v0, 0.0, 0.0, 0.0], 50);
        let err_rk = (rk.x[0] - exact).abs();
        let err_eu = (eu.x[0] - exact).abs();
        assert!(err_rk < 1e-6, "rk4 error {err_rk}");
        assert!(err_rk < err_eu);
    }

    #[test]
    fn test_acceleration_is_quadratic_in_velocity() {
        let mut gamma = [[[0.0; DIM]; DIM]; DIM];
        gamma[1][0][2] = 0.5;
        gamma[1][2][0] = 0.5;
        let a = geodesic_acceleration(&gamma, &[2.0, 0.0, 3.0, 0.0]);
        assert_eq!(a, [0.0, -6.0, 0.0, 0.0]);
    }
}
