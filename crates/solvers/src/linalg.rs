//! Small dense vector and matrix helpers over fixed-size arrays.

pub(crate) type Matrix<const N: usize> = [[f64; N]; N];

pub(crate) fn dot<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn norm<const N: usize>(a: &[f64; N]) -> f64 {
    dot(a, a).sqrt()
}

/// Returns `a − b`.
pub(crate) fn sub<const N: usize>(a: &[f64; N], b: &[f64; N]) -> [f64; N] {
    std::array::from_fn(|i| a[i] - b[i])
}

/// Returns `x + alpha·d`.
pub(crate) fn axpy<const N: usize>(x: &[f64; N], alpha: f64, d: &[f64; N]) -> [f64; N] {
    std::array::from_fn(|i| x[i] + alpha * d[i])
}

pub(crate) fn scale<const N: usize>(a: &[f64; N], s: f64) -> [f64; N] {
    std::array::from_fn(|i| s * a[i])
}

pub(crate) fn is_finite<const N: usize>(a: &[f64; N]) -> bool {
    a.iter().all(|v| v.is_finite())
}

pub(crate) fn identity<const N: usize>() -> Matrix<N> {
    std::array::from_fn(|i| std::array::from_fn(|j| if i == j { 1.0 } else { 0.0 }))
}

pub(crate) fn mat_vec<const N: usize>(m: &Matrix<N>, v: &[f64; N]) -> [f64; N] {
    std::array::from_fn(|i| dot(&m[i], v))
}

pub(crate) fn matrix_is_finite<const N: usize>(m: &Matrix<N>) -> bool {
    m.iter().all(is_finite)
}

/// Solves the square system `a·x = b` by Gaussian elimination with partial
/// pivoting.
///
/// Returns `None` if the matrix is numerically singular.
pub(crate) fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let threshold = scale * 1e-12;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() <= threshold {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        let pivot_rhs = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            for (k, value) in pivot_row.iter().enumerate().skip(col) {
                a[row][k] -= factor * value;
            }
            b[row] -= factor * pivot_rhs;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn vector_helpers() {
        let a = [1.0, 2.0, 2.0];
        let b = [0.5, -1.0, 4.0];

        assert_relative_eq!(dot(&a, &b), 6.5);
        assert_relative_eq!(norm(&a), 3.0);
        assert_eq!(sub(&a, &b), [0.5, 3.0, -2.0]);
        assert_eq!(axpy(&a, 2.0, &b), [2.0, 0.0, 10.0]);
        assert_eq!(scale(&a, -1.0), [-1.0, -2.0, -2.0]);
    }

    #[test]
    fn identity_times_vector_is_vector() {
        let m = identity::<3>();
        assert_eq!(mat_vec(&m, &[1.0, -2.0, 3.0]), [1.0, -2.0, 3.0]);
    }

    #[test]
    fn solves_system_needing_pivot() {
        let a = vec![vec![0.0, 2.0], vec![3.0, 1.0]];
        let b = vec![4.0, 5.0];

        let x = solve(a, b).expect("non-singular");

        assert_relative_eq!(x[0], 1.0);
        assert_relative_eq!(x[1], 2.0);
    }

    #[test]
    fn detects_singular_system() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve(a, vec![1.0, 2.0]).is_none());
    }
}
