//! Active-set solver for the quadratic subproblem
//!
//! ```text
//! minimize    ½dᵀBd + gᵀd
//! subject to  cᵢ + aᵢᵀd = 0   (equality rows)
//!             cᵢ + aᵢᵀd ≥ 0   (inequality rows)
//! ```
//!
//! The working set starts with the equality rows. Each pass solves the
//! equality-constrained KKT system for the working set, drops the inequality
//! with the most negative multiplier, or else adds the most violated
//! inequality. Rows that would make the working set rank deficient are
//! skipped for the rest of the solve, which also lets inconsistent
//! linearizations produce a best-effort step instead of failing.

use crate::linalg::{self, Matrix};

use super::rows::{Kind, Row};

const FEASIBILITY_TOL: f64 = 1e-10;
const MULTIPLIER_TOL: f64 = 1e-12;

/// Step and multipliers from one subproblem solve.
///
/// `multipliers` has one entry per row; rows outside the final working set
/// have a zero multiplier.
#[derive(Debug, Clone)]
pub(super) struct QpSolution<const N: usize> {
    pub(super) step: [f64; N],
    pub(super) multipliers: Vec<f64>,
}

/// Solves the quadratic subproblem.
///
/// Returns `None` only if `B` itself is numerically singular.
pub(super) fn solve<const N: usize>(
    b: &Matrix<N>,
    g: &[f64; N],
    rows: &[Row<N>],
) -> Option<QpSolution<N>> {
    let mut skipped = vec![false; rows.len()];
    let mut working: Vec<usize> = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        if row.kind == Kind::Equality {
            working.push(i);
            if solve_kkt(b, g, rows, &working).is_none() {
                working.pop();
                skipped[i] = true;
            }
        }
    }

    let (mut step, mut lambdas) = solve_kkt(b, g, rows, &working)?;
    let max_passes = 3 * (rows.len() + N) + 10;

    for _ in 0..max_passes {
        let drop = working
            .iter()
            .zip(&lambdas)
            .enumerate()
            .filter(|(_, (row, _))| rows[**row].kind == Kind::Inequality)
            .min_by(|(_, (_, a)), (_, (_, b))| a.total_cmp(b))
            .filter(|(_, (_, lambda))| **lambda < -MULTIPLIER_TOL)
            .map(|(position, _)| position);

        if let Some(position) = drop {
            working.remove(position);
        } else {
            let add = rows
                .iter()
                .enumerate()
                .filter(|(i, row)| {
                    row.kind == Kind::Inequality && !skipped[*i] && !working.contains(i)
                })
                .map(|(i, row)| (i, row.predicted(&step)))
                .filter(|(_, predicted)| *predicted < -FEASIBILITY_TOL)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i);

            let Some(index) = add else {
                return Some(QpSolution {
                    step,
                    multipliers: scatter(rows.len(), &working, &lambdas),
                });
            };
            working.push(index);
        }

        match solve_kkt(b, g, rows, &working) {
            Some((d, l)) => {
                step = d;
                lambdas = l;
            }
            None => {
                if let Some(index) = working.pop() {
                    skipped[index] = true;
                }
            }
        }
    }

    log::debug!("QP subproblem hit its pass limit with {} active rows", working.len());
    Some(QpSolution {
        step,
        multipliers: scatter(rows.len(), &working, &lambdas),
    })
}

/// Solves `[B −Aᵀ; A 0]·[d; λ] = [−g; −c]` for the rows in `working`.
fn solve_kkt<const N: usize>(
    b: &Matrix<N>,
    g: &[f64; N],
    rows: &[Row<N>],
    working: &[usize],
) -> Option<([f64; N], Vec<f64>)> {
    let size = N + working.len();
    let mut matrix = vec![vec![0.0; size]; size];
    let mut rhs = vec![0.0; size];

    for i in 0..N {
        matrix[i][..N].copy_from_slice(&b[i]);
        rhs[i] = -g[i];
    }
    for (k, &index) in working.iter().enumerate() {
        let row = &rows[index];
        for i in 0..N {
            matrix[i][N + k] = -row.gradient[i];
            matrix[N + k][i] = row.gradient[i];
        }
        rhs[N + k] = -row.value;
    }

    let solution = linalg::solve(matrix, rhs)?;
    let step = std::array::from_fn(|i| solution[i]);
    Some((step, solution[N..].to_vec()))
}

fn scatter(len: usize, working: &[usize], lambdas: &[f64]) -> Vec<f64> {
    let mut multipliers = vec![0.0; len];
    for (&index, &lambda) in working.iter().zip(lambdas) {
        multipliers[index] = lambda;
    }
    multipliers
}
