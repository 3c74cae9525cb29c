// ─────────────────────────────────────────────────────────────────────
// Geodesic Kernel — Small Dense Linear Algebra
// ─────────────────────────────────────────────────────────────────────
//! Fixed-size 4×4 helpers: Gauss-Jordan inversion, products and
//! quadratic forms. Stack-only, no allocation.

use geodesic_types::{Matrix4, Vector4, DIM};

/// Pivot magnitude below which the pivot is replaced.
pub const PIVOT_EPSILON: f64 = 1e-12;

/// Invert a 4×4 matrix by Gauss-Jordan elimination on `[M | I]`.
///
/// Partial pivoting picks the largest-magnitude entry of each column.
/// A pivot smaller than [`PIVOT_EPSILON`] is replaced by it instead of
/// failing, so the routine is total; the result is then inaccurate for
/// near-singular input.
pub fn invert(m: &Matrix4) -> Matrix4 {
    let mut aug = [[0.0f64; 2 * DIM]; DIM];
    for (i, row) in aug.iter_mut().enumerate() {
        row[..DIM].copy_from_slice(&m[i]);
        row[DIM + i] = 1.0;
    }

    for col in 0..DIM {
        let mut piv = col;
        for r in (col + 1)..DIM {
            if aug[r][col].abs() > aug[piv][col].abs() {
                piv = r;
            }
        }
        if aug[piv][col].abs() < PIVOT_EPSILON {
            log::warn!(
                "invert: near-singular pivot {:.3e} in column {col}, substituting {PIVOT_EPSILON:e}",
                aug[piv][col]
            );
            aug[piv][col] = PIVOT_EPSILON;
        }
        if piv != col {
            aug.swap(col, piv);
        }

        let div = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= div;
        }

        let pivot_row = aug[col];
        for (r, row) in aug.iter_mut().enumerate() {
            if r == col {
                continue;
            }
            let factor = row[col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in row.iter_mut().zip(pivot_row.iter()) {
                *v -= factor * p;
            }
        }
    }

    let mut inv = [[0.0; DIM]; DIM];
    for (i, row) in inv.iter_mut().enumerate() {
        row.copy_from_slice(&aug[i][DIM..]);
    }
    inv
}

/// Matrix product `a · b`.
pub fn mat_mul(a: &Matrix4, b: &Matrix4) -> Matrix4 {
    let mut out = [[0.0; DIM]; DIM];
    for i in 0..DIM {
        for j in 0..DIM {
            out[i][j] = (0..DIM).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Quadratic form `vᵀ g v`.
#[inline]
pub fn quad_form(g: &Matrix4, v: &Vector4) -> f64 {
    let mut s = 0.0;
    for i in 0..DIM {
        for j in 0..DIM {
            s += v[i] * g[i][j] * v[j];
        }
    }
    s
}

pub fn identity() -> Matrix4 {
    let mut m = [[0.0; DIM]; DIM];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    m
}

#[inline]
pub fn sub(a: &Vector4, b: &Vector4) -> Vector4 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]]
}

#[inline]
pub fn midpoint(a: &Vector4, b: &Vector4) -> Vector4 {
    [
        0.5 * (a[0] + b[0]),
        0.5 * (a[1] + b[1]),
        0.5 * (a[2] + b[2]),
        0.5 * (a[3] + b[3]),
    ]
}

/// Euclidean norm.
#[inline]
pub fn norm(v: &Vector4) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn max_abs_diff(a: &Matrix4, b: &Matrix4) -> f64 {
        let mut m: f64 = 0.0;
        for i in 0..DIM {
            for j in 0..DIM {
                m = m.max((a[i][j] - b[i][j]).abs());
            }
        }
        m
    }

    fn random_spd(rng: &mut ChaCha8Rng) -> Matrix4 {
        let mut b = [[0.0; DIM]; DIM];
        for row in b.iter_mut() {
            for v in row.iter_mut() {
                *v = rng.gen_range(-1.0..1.0);
            }
        }
        let mut a = [[0.0; DIM]; DIM];
        for i in 0..DIM {
            for j in 0..DIM {
                a[i][j] = (0..DIM).map(|k| b[k][i] * b[k][j]).sum();
            }
            a[i][i] += 1.0;
        }
        a
    }

    #[test]
    fn test_invert_identity() {
        let i = identity();
        assert_eq!(invert(&i), i);
    }

    #[test]
    fn test_invert_random_spd() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let a = random_spd(&mut rng);
            let prod = mat_mul(&invert(&a), &a);
            assert!(
                max_abs_diff(&prod, &identity()) < 1e-6,
                "A⁻¹A deviates from I: {prod:?}"
            );
        }
    }

    #[test]
    fn test_invert_needs_pivoting() {
        // Zero leading entry: fails without row exchange.
        let a = [
            [0.0, 2.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 3.0, 1.0],
            [0.0, 0.0, 1.0, 2.0],
        ];
        let prod = mat_mul(&invert(&a), &a);
        assert!(max_abs_diff(&prod, &identity()) < 1e-12);
    }

    #[test]
    fn test_invert_singular_is_total() {
        let a = [[1.0; DIM]; DIM];
        let inv = invert(&a);
        assert!(inv.iter().flatten().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_quad_form_identity_is_squared_norm() {
        let v = [0.3, -0.7, 0.2, 0.1];
        let q = quad_form(&identity(), &v);
        assert!((q - norm(&v).powi(2)).abs() < 1e-15);
    }
}
