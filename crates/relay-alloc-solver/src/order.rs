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

use rayon::prelude::*;
use relay_alloc_core::tensor::Tensor3;
use relay_alloc_model::problem::Problem;

/// One element of an assignment: users of type `m` at period `t` moved from
/// source cell `i` to destination cell `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveIndex {
    pub i: usize,
    pub j: usize,
    pub m: usize,
    pub t: usize,
}

impl MoveIndex {
    #[inline]
    pub const fn new(i: usize, j: usize, m: usize, t: usize) -> Self {
        Self { i, j, m, t }
    }

    /// The supply bucket this move draws from.
    #[inline]
    pub const fn bucket(self) -> BucketIndex {
        BucketIndex {
            i: self.i,
            m: self.m,
            t: self.t,
        }
    }

    #[inline]
    pub const fn as_solution_index(self) -> [usize; 4] {
        [self.i, self.j, self.m, self.t]
    }
}

/// A supply group: (source cell, user type, time period).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketIndex {
    pub i: usize,
    pub m: usize,
    pub t: usize,
}

impl BucketIndex {
    #[inline]
    pub const fn as_supply_index(self) -> [usize; 3] {
        [self.i, self.m, self.t]
    }
}

/// An immutable candidate sequence for one destination cell, pre-sorted by
/// non-decreasing reduced cost `cost / min(act_per_user[m], cap)`.
///
/// The list is built once at initialization and never mutated; workers scan
/// it against their private supply tables.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    entries: Vec<MoveIndex>,
}

impl CandidateList {
    fn build(problem: &Problem, j: usize, cap: i32) -> Self {
        let mut entries =
            Vec::with_capacity((problem.n_cells() - 1) * problem.n_types() * problem.n_times());
        for i in 0..problem.n_cells() {
            if i == j {
                continue;
            }
            for m in 0..problem.n_types() {
                for t in 0..problem.n_times() {
                    if problem.users_available()[[i, m, t]] > 0 {
                        entries.push(MoveIndex::new(i, j, m, t));
                    }
                }
            }
        }
        // Stable sort keeps the collection order deterministic among
        // equal-cost candidates.
        entries.sort_by(|a, b| {
            reduced_cost(problem, *a, cap).total_cmp(&reduced_cost(problem, *b, cap))
        });
        Self { entries }
    }

    #[inline]
    pub fn entries(&self) -> &[MoveIndex] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the next candidate at or after `*pos` whose bucket still has
    /// users available, leaving `*pos` one past it. `None` when the list is
    /// exhausted.
    #[inline]
    pub fn next_available(
        &self,
        pos: &mut usize,
        users_available: &Tensor3<i32>,
    ) -> Option<MoveIndex> {
        while *pos < self.entries.len() {
            let entry = self.entries[*pos];
            *pos += 1;
            if users_available[entry.bucket().as_supply_index()] > 0 {
                return Some(entry);
            }
        }
        None
    }
}

/// Reduced cost of a candidate under a per-user activity cap: the raw move
/// cost divided by the number of demanded activities the user can actually
/// absorb in the current regime.
#[inline]
pub fn reduced_cost(problem: &Problem, mv: MoveIndex, cap: i32) -> f64 {
    problem.cost(mv.i, mv.j, mv.m, mv.t) / problem.act_per_user(mv.m).min(cap) as f64
}

/// All candidate lists: one per (limiting-type index k, destination cell j).
///
/// Index k selects which capacity from the non-increasing sorted
/// `act_per_user` acts as the divisor cap; [`CandidateOrders::index_for`]
/// picks the k whose cap matches the remaining demand, so that a user type
/// able to do more activities than remain is priced at its effective rate.
#[derive(Debug, Clone)]
pub struct CandidateOrders {
    caps: Vec<i32>,
    lists: Vec<Vec<CandidateList>>,
}

impl CandidateOrders {
    /// Builds the lists for every cap, one helper task per limiting type.
    pub fn build(problem: &Problem, caps_sorted: &[i32]) -> Self {
        let lists = caps_sorted
            .par_iter()
            .map(|&cap| {
                (0..problem.n_cells())
                    .map(|j| {
                        if problem.activities(j) > 0 {
                            CandidateList::build(problem, j, cap)
                        } else {
                            CandidateList::default()
                        }
                    })
                    .collect()
            })
            .collect();
        Self {
            caps: caps_sorted.to_vec(),
            lists,
        }
    }

    /// The list index to use for a given remaining demand: the first cap not
    /// exceeding the demand, falling back to the smallest cap.
    #[inline]
    pub fn index_for(&self, demand: i32) -> usize {
        let mut k = 0;
        while self.caps[k] > demand && k < self.caps.len() - 1 {
            k += 1;
        }
        k
    }

    #[inline]
    pub fn list(&self, k: usize, j: usize) -> &CandidateList {
        &self.lists[k][j]
    }
}
