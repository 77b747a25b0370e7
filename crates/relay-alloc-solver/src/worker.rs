// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::engine::SearchFlags;
use crate::greedy::{GreedyScratch, construct, construct_scarce};
use crate::improve::improving_phase;
use crate::stats::SearchIndex;
use crate::usage::UsageTracker;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use relay_alloc_core::tensor::Tensor4;
use relay_alloc_model::problem::Problem;
use std::sync::atomic::Ordering;
use tracing::debug;

/// Restarts between improvement rounds.
const ITERATION_LIMIT: u64 = 10;

/// What one worker hands back to the engine after its deadline fires.
#[derive(Debug)]
pub struct WorkerOutcome {
    pub objective: f64,
    pub solution: Tensor4<i32>,
    pub iterations: u64,
}

/// One multi-start search worker.
///
/// Repeats batches of [`ITERATION_LIMIT`] greedy restarts over shuffled
/// destination orders, polishes the batch best with the improving phase,
/// and keeps its own running best. The first restart that comes back
/// infeasible flips the worker into scarce-user construction for the rest
/// of its life, switching it to the longer deadline.
pub fn run(problem: &Problem, index: &SearchIndex, flags: &SearchFlags, seed: u64) -> WorkerOutcome {
    let shape = [
        problem.n_cells(),
        problem.n_cells(),
        problem.n_types(),
        problem.n_times(),
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut scratch = GreedyScratch::new(problem);
    let mut usage = UsageTracker::new([problem.n_cells(), problem.n_types(), problem.n_times()]);
    let mut current = Tensor4::zeros(shape);
    let mut batch_best_solution = Tensor4::zeros(shape);
    let mut best_solution = Tensor4::zeros(shape);
    let mut best_objective = f64::INFINITY;
    let mut iterations = 0u64;

    let mut order: Vec<usize> = (0..problem.n_cells())
        .filter(|&j| problem.activities(j) > 0)
        .collect();

    let mut scarce_mode = false;
    let mut stop = flags.normal();

    while !stop.load(Ordering::Relaxed) {
        let mut batch_best = f64::INFINITY;
        let mut batch_iterations = 0;

        while !stop.load(Ordering::Relaxed) && batch_iterations < ITERATION_LIMIT {
            order.shuffle(&mut rng);

            let objective = if scarce_mode {
                construct_scarce(
                    problem,
                    index,
                    index.activity_slots(problem),
                    &order,
                    &mut scratch,
                    &mut current,
                )
            } else {
                construct(problem, index, &order, &mut usage, &mut scratch, &mut current)
            };
            if objective < batch_best {
                batch_best = objective;
                batch_best_solution.copy_from(&current);
            }
            batch_iterations += 1;

            if objective.is_infinite() && !scarce_mode {
                // Publish the reachability table before anyone needs it,
                // then move over to the longer deadline.
                index.activity_slots(problem);
                scarce_mode = true;
                stop = flags.scarce();
                debug!("greedy found no assignment, switching to scarce-user construction");
            }
        }
        iterations += batch_iterations;

        if batch_best.is_finite() {
            while !flags.normal().load(Ordering::Relaxed) {
                let gain =
                    improving_phase(problem, index, &mut batch_best_solution, flags.normal());
                batch_best -= gain;
                if gain == 0.0 {
                    break;
                }
            }
        }

        if batch_best < best_objective {
            best_objective = batch_best;
            best_solution.copy_from(&batch_best_solution);
            debug!(objective = best_objective, "worker found new local best");
        }
    }

    WorkerOutcome {
        objective: best_objective,
        solution: best_solution,
        iterations,
    }
}
