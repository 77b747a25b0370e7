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

use crate::problem::Problem;
use relay_alloc_core::tensor::Tensor4;
use std::time::Duration;

/// A complete assignment: how many users of each (source, type, period)
/// bucket serve each destination cell, plus the objective value the solver
/// reported for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    moves: Tensor4<i32>,
    objective: f64,
}

impl Solution {
    pub fn new(moves: Tensor4<i32>, objective: f64) -> Self {
        Self { moves, objective }
    }

    #[inline]
    pub fn moves(&self) -> &Tensor4<i32> {
        &self.moves
    }

    #[inline]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Total users moved, per user type. The KPI line reports these.
    pub fn moved_per_type(&self) -> Vec<u64> {
        let [n_cells, _, n_types, n_times] = self.moves.shape();
        let mut totals = vec![0u64; n_types];
        for (m, total) in totals.iter_mut().enumerate() {
            for i in 0..n_cells {
                for j in 0..n_cells {
                    for t in 0..n_times {
                        *total += self.moves[[i, j, m, t]] as u64;
                    }
                }
            }
        }
        totals
    }

    /// Recomputes the objective from scratch against the problem's costs.
    pub fn recompute_objective(&self, problem: &Problem) -> f64 {
        let [n_cells, _, n_types, n_times] = self.moves.shape();
        let mut total = 0.0;
        for i in 0..n_cells {
            for j in 0..n_cells {
                if i == j {
                    continue;
                }
                for m in 0..n_types {
                    for t in 0..n_times {
                        let x = self.moves[[i, j, m, t]];
                        if x != 0 {
                            total += x as f64 * problem.cost(i, j, m, t);
                        }
                    }
                }
            }
        }
        total
    }
}

/// Per-instance KPI record: objective, wall-clock time, per-type move totals.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub objective: f64,
    pub elapsed: Duration,
    pub moved_per_type: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::Solution;
    use relay_alloc_core::tensor::Tensor4;

    #[test]
    fn test_moved_per_type_sums_buckets() {
        let mut moves = Tensor4::zeros([3, 3, 2, 2]);
        moves[[0, 1, 0, 0]] = 2;
        moves[[2, 1, 0, 1]] = 1;
        moves[[0, 2, 1, 0]] = 4;
        let sol = Solution::new(moves, 0.0);
        assert_eq!(sol.moved_per_type(), vec![3, 4]);
    }
}
