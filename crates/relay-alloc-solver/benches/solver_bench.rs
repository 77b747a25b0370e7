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

use criterion::{Criterion, criterion_group, criterion_main};
use relay_alloc_core::tensor::Tensor4;
use relay_alloc_model::generator::{InstanceConfig, generate};
use relay_alloc_solver::greedy::{GreedyScratch, construct};
use relay_alloc_solver::improve::improving_phase;
use relay_alloc_solver::stats::SearchIndex;
use relay_alloc_solver::usage::UsageTracker;
use std::hint::black_box;
use std::sync::atomic::AtomicBool;

fn bench_greedy_construct(c: &mut Criterion) {
    let problem = generate(&InstanceConfig {
        cells: 60,
        types: 3,
        times: 6,
        max_supply: 5,
        ..InstanceConfig::default()
    });
    let index = SearchIndex::build(&problem);
    let order: Vec<usize> = (0..problem.n_cells())
        .filter(|&j| problem.activities(j) > 0)
        .collect();
    let mut usage = UsageTracker::new([problem.n_cells(), problem.n_types(), problem.n_times()]);
    let mut scratch = GreedyScratch::new(&problem);
    let mut solution = Tensor4::zeros([
        problem.n_cells(),
        problem.n_cells(),
        problem.n_types(),
        problem.n_times(),
    ]);

    c.bench_function("greedy_construct_60c_3m_6t", |b| {
        b.iter(|| {
            let objective = construct(
                &problem,
                &index,
                black_box(&order),
                &mut usage,
                &mut scratch,
                &mut solution,
            );
            black_box(objective)
        })
    });
}

fn bench_improving_phase(c: &mut Criterion) {
    let problem = generate(&InstanceConfig {
        cells: 40,
        types: 3,
        times: 4,
        max_supply: 5,
        ..InstanceConfig::default()
    });
    let index = SearchIndex::build(&problem);
    let order: Vec<usize> = (0..problem.n_cells())
        .filter(|&j| problem.activities(j) > 0)
        .collect();
    let mut usage = UsageTracker::new([problem.n_cells(), problem.n_types(), problem.n_times()]);
    let mut scratch = GreedyScratch::new(&problem);
    let mut greedy_solution = Tensor4::zeros([
        problem.n_cells(),
        problem.n_cells(),
        problem.n_types(),
        problem.n_times(),
    ]);
    let objective = construct(
        &problem,
        &index,
        &order,
        &mut usage,
        &mut scratch,
        &mut greedy_solution,
    );
    assert!(objective.is_finite());
    let stop = AtomicBool::new(false);

    c.bench_function("improving_phase_40c_3m_4t", |b| {
        b.iter(|| {
            let mut solution = greedy_solution.clone();
            black_box(improving_phase(&problem, &index, &mut solution, &stop))
        })
    });
}

criterion_group!(benches, bench_greedy_construct, bench_improving_phase);
criterion_main!(benches);
