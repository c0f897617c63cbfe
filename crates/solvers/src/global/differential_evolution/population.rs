use optima_core::{Bounds, Objective};
use rand::Rng;

use crate::evaluate::Evaluator;

/// A candidate point and its objective value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member<const N: usize> {
    pub x: [f64; N],
    pub fitness: f64,
}

/// The evolving population of one solve.
///
/// Invariant: `members` is non-empty, every member lies inside the bounds it
/// was sampled from, and `best` indexes the member with the lowest fitness.
#[derive(Debug, Clone)]
pub(super) struct Population<const N: usize> {
    members: Vec<Member<N>>,
    best: usize,
}

/// Why sampling stopped before the population was complete.
pub(super) struct NanSample<const N: usize> {
    /// Best member sampled before the NaN, or the NaN point itself.
    pub(super) best: Member<N>,
}

impl<const N: usize> Population<N> {
    /// Samples `size` members uniformly inside `bounds`.
    ///
    /// Stops at the first NaN objective value.
    pub(super) fn sample<O, R>(
        size: usize,
        bounds: &Bounds<N>,
        evaluator: &mut Evaluator<'_, O, N>,
        rng: &mut R,
    ) -> Result<Self, NanSample<N>>
    where
        O: Objective<N> + ?Sized,
        R: Rng + ?Sized,
    {
        let mut members: Vec<Member<N>> = Vec::with_capacity(size);
        for _ in 0..size {
            let x: [f64; N] = std::array::from_fn(|i| {
                let bound = bounds.get(i);
                let u: f64 = rng.random();
                // Interpolating avoids `upper - lower`, which can overflow.
                bound.clamp(bound.lower() * (1.0 - u) + bound.upper() * u)
            });
            let fitness = evaluator.value(&x);
            if fitness.is_nan() {
                let best = best_index(&members).map_or(Member { x, fitness }, |i| members[i]);
                return Err(NanSample { best });
            }
            members.push(Member { x, fitness });
        }

        let best = best_index(&members).unwrap_or(0);
        Ok(Self { members, best })
    }

    pub(super) fn members(&self) -> &[Member<N>] {
        &self.members
    }

    pub(super) fn get(&self, index: usize) -> &Member<N> {
        &self.members[index]
    }

    pub(super) fn best(&self) -> &Member<N> {
        &self.members[self.best]
    }

    /// Replaces member `index` if `candidate` is at least as fit.
    ///
    /// Returns `true` if the candidate was accepted.
    pub(super) fn offer(&mut self, index: usize, candidate: Member<N>) -> bool {
        if candidate.fitness > self.members[index].fitness {
            return false;
        }
        self.members[index] = candidate;
        if candidate.fitness < self.members[self.best].fitness {
            self.best = index;
        }
        true
    }

    /// Overwrites the best member, used after polishing improves it.
    pub(super) fn set_best(&mut self, member: Member<N>) {
        self.members[self.best] = member;
    }

    /// Population standard deviation of the fitness values.
    pub(super) fn fitness_std_dev(&self) -> f64 {
        let count = self.members.len() as f64;
        let mean = self.members.iter().map(|m| m.fitness).sum::<f64>() / count;
        let variance = self
            .members
            .iter()
            .map(|m| (m.fitness - mean).powi(2))
            .sum::<f64>()
            / count;
        variance.sqrt()
    }
}

fn best_index<const N: usize>(members: &[Member<N>]) -> Option<usize> {
    members
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.fitness.total_cmp(&b.fitness))
        .map(|(i, _)| i)
}
