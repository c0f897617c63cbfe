use optima_core::{Bounds, Objective};

/// Counts objective and gradient evaluations for one solve.
///
/// Solvers never call the objective directly; going through the evaluator
/// keeps the counters honest, including finite-difference probes.
pub(crate) struct Evaluator<'a, O: ?Sized, const N: usize> {
    objective: &'a O,
    func_evals: usize,
    grad_evals: usize,
}

impl<'a, O, const N: usize> Evaluator<'a, O, N>
where
    O: Objective<N> + ?Sized,
{
    pub(crate) fn new(objective: &'a O) -> Self {
        Self {
            objective,
            func_evals: 0,
            grad_evals: 0,
        }
    }

    /// Evaluates the objective at `x`.
    pub(crate) fn value(&mut self, x: &[f64; N]) -> f64 {
        self.func_evals += 1;
        self.objective.value(x)
    }

    /// Evaluates the gradient at `x`, whose objective value is `fx`.
    ///
    /// Uses the analytic gradient when the objective provides one, otherwise
    /// forward differences that stay inside `bounds`.
    pub(crate) fn gradient(&mut self, x: &[f64; N], fx: f64, bounds: &Bounds<N>) -> [f64; N] {
        if let Some(grad) = self.objective.gradient(x) {
            self.grad_evals += 1;
            return grad;
        }
        let objective = self.objective;
        let func_evals = &mut self.func_evals;
        finite_difference(x, fx, bounds, |probe| {
            *func_evals += 1;
            objective.value(probe)
        })
    }

    /// Adds the evaluations spent by a nested solve on the same objective.
    pub(crate) fn absorb(&mut self, func_evals: usize, grad_evals: usize) {
        self.func_evals += func_evals;
        self.grad_evals += grad_evals;
    }

    pub(crate) fn func_evals(&self) -> usize {
        self.func_evals
    }

    pub(crate) fn grad_evals(&self) -> usize {
        self.grad_evals
    }
}

/// Approximates the gradient of `f` at `x` by forward differences.
///
/// The step for coordinate `i` is `√ε·max(1, |xᵢ|)`, taken backwards when a
/// forward step would leave `bounds`. When the box is narrower than the step
/// on both sides, the step shrinks to the wider side so every evaluation
/// stays inside `bounds`. A variable fixed by its bounds gets a zero partial.
pub(crate) fn finite_difference<const N: usize, F>(
    x: &[f64; N],
    fx: f64,
    bounds: &Bounds<N>,
    mut f: F,
) -> [f64; N]
where
    F: FnMut(&[f64; N]) -> f64,
{
    let sqrt_eps = f64::EPSILON.sqrt();
    let mut grad = [0.0; N];
    for (i, g) in grad.iter_mut().enumerate() {
        let bound = bounds.get(i);
        let mut h = sqrt_eps * x[i].abs().max(1.0);
        if x[i] + h > bound.upper() {
            let above = (bound.upper() - x[i]).max(0.0);
            let below = (x[i] - bound.lower()).max(0.0);
            h = if below >= h {
                -h
            } else if above >= below {
                above
            } else {
                -below
            };
        }
        if h == 0.0 {
            continue;
        }
        let mut probe = *x;
        probe[i] += h;
        let h = probe[i] - x[i];
        *g = (f(&probe) - fx) / h;
    }
    grad
}
