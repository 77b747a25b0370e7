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

use crate::config::SolverConfig;
use crate::stats::SearchIndex;
use crate::worker;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use relay_alloc_core::timer::Deadline;
use relay_alloc_model::problem::Problem;
use relay_alloc_model::sol::{RunSummary, Solution};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// The two one-shot stop signals shared between the deadline timers and the
/// workers. Each flag transitions false to true at most once; relaxed loads
/// and stores are all that monotonic boolean needs.
#[derive(Debug, Default)]
pub struct SearchFlags {
    normal: AtomicBool,
    scarce: AtomicBool,
}

impl SearchFlags {
    #[inline]
    pub fn normal(&self) -> &AtomicBool {
        &self.normal
    }

    #[inline]
    pub fn scarce(&self) -> &AtomicBool {
        &self.scarce
    }
}

/// Result of one solve: the best assignment found (if any), the total
/// restart count across workers, and the wall-clock time spent.
#[derive(Debug)]
pub struct SolveReport {
    best: Option<Solution>,
    iterations: u64,
    elapsed: Duration,
}

impl SolveReport {
    #[inline]
    pub fn best(&self) -> Option<&Solution> {
        self.best.as_ref()
    }

    #[inline]
    pub fn into_best(self) -> Option<Solution> {
        self.best
    }

    #[inline]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The KPI record, present when a solution was found.
    pub fn summary(&self) -> Option<RunSummary> {
        self.best.as_ref().map(|solution| RunSummary {
            objective: solution.objective(),
            elapsed: self.elapsed,
            moved_per_type: solution.moved_per_type(),
        })
    }
}

/// The parallel search orchestrator.
///
/// One solve builds the shared read-only [`SearchIndex`], arms the two
/// deadlines, fans out the configured number of workers with seeds drawn
/// from the master RNG, joins them all, and keeps the lowest objective.
#[derive(Debug, Default)]
pub struct SearchEngine {
    config: SolverConfig,
}

impl SearchEngine {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve(&self, problem: &Problem) -> SolveReport {
        let started = Instant::now();

        let index = SearchIndex::build(problem);
        let flags = Arc::new(SearchFlags::default());

        let normal_flags = Arc::clone(&flags);
        let mut normal_deadline = Deadline::start(
            self.config.time_budget.mul_f64(self.config.normal_frac),
            move || normal_flags.normal.store(true, Ordering::Relaxed),
        );
        let scarce_flags = Arc::clone(&flags);
        let mut scarce_deadline = Deadline::start(
            self.config.time_budget.mul_f64(self.config.scarce_frac),
            move || scarce_flags.scarce.store(true, Ordering::Relaxed),
        );

        let mut master = ChaCha8Rng::seed_from_u64(self.config.seed);
        let seeds: Vec<u64> = (0..self.config.workers).map(|_| master.random()).collect();

        let mut outcomes = Vec::with_capacity(seeds.len());
        std::thread::scope(|scope| {
            let handles: Vec<_> = seeds
                .iter()
                .map(|&seed| {
                    let index = &index;
                    let flags: &SearchFlags = &flags;
                    scope.spawn(move || worker::run(problem, index, flags, seed))
                })
                .collect();
            for handle in handles {
                outcomes.push(handle.join().expect("search worker panicked"));
            }
        });

        normal_deadline.cancel();
        scarce_deadline.cancel();

        let iterations = outcomes.iter().map(|o| o.iterations).sum();
        let best = outcomes
            .into_iter()
            .min_by(|a, b| a.objective.total_cmp(&b.objective))
            .filter(|o| o.objective.is_finite())
            .map(|o| Solution::new(o.solution, o.objective));
        let elapsed = started.elapsed();

        match &best {
            Some(solution) => info!(
                objective = solution.objective(),
                iterations,
                elapsed_ms = elapsed.as_millis() as u64,
                "search finished"
            ),
            None => info!(
                iterations,
                elapsed_ms = elapsed.as_millis() as u64,
                "search finished without a feasible assignment"
            ),
        }

        SolveReport {
            best,
            iterations,
            elapsed,
        }
    }
}
