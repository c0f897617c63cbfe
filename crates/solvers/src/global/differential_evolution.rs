//! Differential evolution (DE/rand/1/bin).
//!
//! # Algorithm
//!
//! A population of `max(population_multiplier·N, 4)` members is sampled
//! uniformly inside the bounds. Each generation visits every member `i` in
//! turn and builds a trial point from three other distinct members:
//!
//! ```text
//! mutant = x[r1] + F·(x[r2] − x[r3])
//! trial[j] = mutant[j] if j == j_rand or U(0, 1) < CR, else x[i][j]
//! ```
//!
//! The trial is clipped to the bounds and replaces member `i` when it is at
//! least as good. Replacements take effect immediately, so later members in
//! the same generation already see them.
//!
//! The run is converged when the standard deviation of the population's
//! fitness drops below the tolerance. With [`Options::polish`] set, the best
//! member is then refined with [`lbfgsb`] inside the same bounds; the polished
//! point is kept only if it improves on the best member.
//!
//! All randomness comes from the caller's generator, so a seeded generator
//! makes the run reproducible bit for bit.
//!
//! # Observer Events
//!
//! One [`Event`] per completed generation, exposing the whole population.

mod population;


pub use population::Member;

use optima_core::{Bounds, Objective, Observer};
use rand::Rng;

use crate::{
    Action, Config, ConfigError, Error, Solution, Status, evaluate::Evaluator,
    unconstrained::lbfgsb,
};

use population::Population;

const LABEL: &str = "differential evolution";

/// Tuning options for differential evolution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    /// Differential weight `F`.
    pub scale: f64,

    /// Crossover probability `CR`.
    pub crossover: f64,

    /// Population size per variable.
    pub population_multiplier: usize,

    /// Refine the best member with L-BFGS-B after evolution.
    pub polish: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scale: 0.8,
            crossover: 0.9,
            population_multiplier: 10,
            polish: true,
        }
    }
}

impl Options {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 < scale ≤ 2`, `0 ≤ crossover ≤ 1`, and the
    /// population multiplier is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale > 0.0 && self.scale <= 2.0) {
            return Err(ConfigError::InvalidOption {
                name: "scale",
                reason: "must be in (0, 2]",
            });
        }
        if !(0.0..=1.0).contains(&self.crossover) {
            return Err(ConfigError::InvalidOption {
                name: "crossover",
                reason: "must be in [0, 1]",
            });
        }
        if self.population_multiplier == 0 {
            return Err(ConfigError::InvalidOption {
                name: "population_multiplier",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Number of members for an `n`-variable problem.
    #[must_use]
    pub fn population_size(&self, n: usize) -> usize {
        (self.population_multiplier * n).max(4)
    }
}

/// Generation event emitted by differential evolution.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a, const N: usize> {
    /// Generation counter (1-based).
    pub generation: usize,

    /// Best member so far.
    pub best: &'a Member<N>,

    /// Every member after this generation's replacements.
    pub population: &'a [Member<N>],
}

/// Minimizes the objective over `bounds` with differential evolution.
///
/// # Errors
///
/// Returns an error if the config or options are invalid or if any variable
/// lacks a finite lower or upper bound.
pub fn minimize<O, R, Obs, const N: usize>(
    objective: &O,
    bounds: &Bounds<N>,
    config: &Config,
    options: &Options,
    rng: &mut R,
    mut observer: Obs,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
    R: Rng + ?Sized,
    Obs: for<'a> Observer<Event<'a, N>, Action>,
{
    config.validate()?;
    if N == 0 {
        return Err(ConfigError::Dimension.into());
    }
    options.validate()?;
    if let Some(index) = bounds.iter().position(|b| !b.is_finite()) {
        return Err(Error::UnboundedSearchSpace { index });
    }

    let mut evaluator = Evaluator::new(objective);
    let size = options.population_size(N);

    let mut population = match Population::sample(size, bounds, &mut evaluator, rng) {
        Ok(population) => population,
        Err(nan) => {
            log::warn!("{LABEL}: objective returned NaN while sampling the population");
            let Member { x, fitness } = nan.best;
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, x, fitness, 0, &evaluator));
        }
    };

    let mut status = Status::MaxIters;
    let mut generations = config.max_iters;

    for generation in 1..=config.max_iters {
        if population.fitness_std_dev() < config.tolerance {
            status = Status::Converged;
            generations = generation - 1;
            break;
        }

        for i in 0..size {
            let [r1, r2, r3] = distinct_others(rng, size, i);
            let (a, b, c) = (population.get(r1).x, population.get(r2).x, population.get(r3).x);
            let target = population.get(i).x;

            let j_rand = rng.random_range(0..N);
            let mut trial = target;
            for j in 0..N {
                if j == j_rand || rng.random::<f64>() < options.crossover {
                    trial[j] = a[j] + options.scale * (b[j] - c[j]);
                }
            }
            let trial = bounds.clamp(&trial);

            let fitness = evaluator.value(&trial);
            if fitness.is_nan() {
                log::warn!("{LABEL}: objective returned NaN in generation {generation}");
                let Member { x, fitness } = *population.best();
                let status = Status::NumericalDegeneracy;
                return Ok(Solution::finish(LABEL, status, x, fitness, generation, &evaluator));
            }
            population.offer(i, Member { x: trial, fitness });
        }

        log::debug!(
            "{LABEL} generation {generation}: best = {:e}, spread = {:e}",
            population.best().fitness,
            population.fitness_std_dev()
        );

        let event = Event {
            generation,
            best: population.best(),
            population: population.members(),
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            status = Status::StoppedByObserver;
            generations = generation;
            break;
        }
    }

    if status == Status::MaxIters && population.fitness_std_dev() < config.tolerance {
        status = Status::Converged;
    }

    if options.polish && status != Status::StoppedByObserver {
        polish(objective, bounds, config, &mut population, &mut evaluator);
    }

    let best = *population.best();
    Ok(Solution::finish(LABEL, status, best.x, best.fitness, generations, &evaluator))
}

/// Minimizes the objective with differential evolution without observer
/// support.
///
/// # Errors
///
/// Returns an error if the config or options are invalid or if any variable
/// lacks a finite lower or upper bound.
pub fn minimize_unobserved<O, R, const N: usize>(
    objective: &O,
    bounds: &Bounds<N>,
    config: &Config,
    options: &Options,
    rng: &mut R,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
    R: Rng + ?Sized,
{
    minimize(objective, bounds, config, options, rng, ())
}

/// Runs L-BFGS-B from the best member and keeps the result if it improves.
fn polish<O, const N: usize>(
    objective: &O,
    bounds: &Bounds<N>,
    config: &Config,
    population: &mut Population<N>,
    evaluator: &mut Evaluator<'_, O, N>,
) where
    O: Objective<N> + ?Sized,
{
    let start = *population.best();
    let Ok(polished) =
        lbfgsb::minimize_unobserved(objective, start.x, bounds, config, &lbfgsb::Options::default())
    else {
        return;
    };
    evaluator.absorb(polished.func_evals, polished.grad_evals);

    if polished.objective < start.fitness {
        log::debug!(
            "{LABEL}: polishing improved best from {:e} to {:e}",
            start.fitness,
            polished.objective
        );
        population.set_best(Member {
            x: polished.x,
            fitness: polished.objective,
        });
    }
}

/// Draws three distinct indices in `0..size`, all different from `exclude`.
///
/// Requires `size >= 4`.
fn distinct_others<R: Rng + ?Sized>(rng: &mut R, size: usize, exclude: usize) -> [usize; 3] {
    let mut picked = [exclude; 3];
    for k in 0..3 {
        let mut candidate = rng.random_range(0..size);
        while candidate == exclude || picked[..k].contains(&candidate) {
            candidate = rng.random_range(0..size);
        }
        picked[k] = candidate;
    }
    picked
}
