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

use crate::order::MoveIndex;
use crate::stats::SearchIndex;
use relay_alloc_core::tensor::{Tensor3, Tensor4};
use relay_alloc_model::problem::Problem;
use std::sync::atomic::{AtomicBool, Ordering};

/// Quit a branch once its running gain drops below this threshold.
const MIN_GAIN: f64 = -4.0;
/// Maximum recursion depth of the move chain.
const MAX_LEVEL: u32 = 5;
/// Maximum candidates evaluated per recursion level.
const MAX_COUNT: u32 = 20;

/// Bookkeeping derived from a feasible solution for one improvement pass.
///
/// `residual_supply` is what each bucket has left after the current
/// assignment; it goes negative transiently while a chain borrows users, and
/// a chain may only commit when the touched bucket is non-negative again.
/// The move vectors are a snapshot: deltas applied during the pass update
/// the counters but never the vectors, so cells the pass itself creates are
/// not picked up as chain roots until the next pass rebuilds the ledger.
#[derive(Debug, Clone, PartialEq)]
struct MoveLedger {
    residual_supply: Tensor3<i32>,
    moves: Vec<MoveIndex>,
    moves_from_i: Vec<Vec<MoveIndex>>,
    moves_to_j: Vec<Vec<MoveIndex>>,
    done_in_j: Vec<i32>,
}

impl MoveLedger {
    fn build(problem: &Problem, solution: &Tensor4<i32>) -> Self {
        let mut residual_supply = problem.users_available().clone();
        let mut moves = Vec::new();
        let mut moves_from_i = vec![Vec::new(); problem.n_cells()];
        let mut moves_to_j = vec![Vec::new(); problem.n_cells()];
        let mut done_in_j = vec![0i32; problem.n_cells()];

        for i in 0..problem.n_cells() {
            for j in 0..problem.n_cells() {
                if i == j {
                    continue;
                }
                for m in 0..problem.n_types() {
                    for t in 0..problem.n_times() {
                        let x = solution[[i, j, m, t]];
                        if x == 0 {
                            continue;
                        }
                        let mv = MoveIndex::new(i, j, m, t);
                        residual_supply[[i, m, t]] -= x;
                        moves_from_i[i].push(mv);
                        moves_to_j[j].push(mv);
                        moves.push(mv);
                        done_in_j[j] += x * problem.act_per_user(m);
                    }
                }
            }
        }

        Self {
            residual_supply,
            moves,
            moves_from_i,
            moves_to_j,
            done_in_j,
        }
    }
}

/// One reversible change to the solution under inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Delta {
    mv: MoveIndex,
    users_added: i32,
    activities_added: i32,
    gain: f64,
}

impl Delta {
    fn remove(problem: &Problem, mv: MoveIndex, users: i32) -> Self {
        Self {
            mv,
            users_added: -users,
            activities_added: -users * problem.act_per_user(mv.m),
            gain: users as f64 * problem.cost(mv.i, mv.j, mv.m, mv.t),
        }
    }

    fn add(problem: &Problem, mv: MoveIndex, users: i32) -> Self {
        Self {
            mv,
            users_added: users,
            activities_added: users * problem.act_per_user(mv.m),
            gain: -(users as f64) * problem.cost(mv.i, mv.j, mv.m, mv.t),
        }
    }
}

struct ImprovePass<'a> {
    problem: &'a Problem,
    index: &'a SearchIndex,
    stop: &'a AtomicBool,
}

impl ImprovePass<'_> {
    fn apply(&self, delta: &Delta, solution: &mut Tensor4<i32>, ledger: &mut MoveLedger) -> f64 {
        solution[delta.mv.as_solution_index()] += delta.users_added;
        ledger.residual_supply[delta.mv.bucket().as_supply_index()] -= delta.users_added;
        ledger.done_in_j[delta.mv.j] += delta.activities_added;
        delta.gain
    }

    fn revert(&self, delta: &Delta, solution: &mut Tensor4<i32>, ledger: &mut MoveLedger) -> f64 {
        solution[delta.mv.as_solution_index()] -= delta.users_added;
        ledger.residual_supply[delta.mv.bucket().as_supply_index()] += delta.users_added;
        ledger.done_in_j[delta.mv.j] -= delta.activities_added;
        -delta.gain
    }

    /// Pops and reverts deltas down to `mark`, LIFO.
    fn undo_to(
        &self,
        mark: usize,
        deltas: &mut Vec<Delta>,
        gain_so_far: &mut f64,
        solution: &mut Tensor4<i32>,
        ledger: &mut MoveLedger,
    ) {
        while deltas.len() > mark {
            if let Some(delta) = deltas.pop() {
                *gain_so_far += self.revert(&delta, solution, ledger);
            }
        }
    }

    /// While the cell does more activities than demanded, removes the most
    /// expensive contributors whose capacity fits inside the excess.
    fn prune_overshoot(
        &self,
        j: usize,
        solution: &mut Tensor4<i32>,
        ledger: &mut MoveLedger,
        deltas: &mut Vec<Delta>,
    ) -> f64 {
        let mut redundancy = ledger.done_in_j[j] - self.problem.activities(j);
        let mut gain = 0.0;
        if redundancy <= 0 {
            return gain;
        }

        let mut contributors = std::mem::take(&mut ledger.moves_to_j[j]);
        contributors.sort_by(|a, b| {
            self.problem
                .cost(b.i, b.j, b.m, b.t)
                .total_cmp(&self.problem.cost(a.i, a.j, a.m, a.t))
        });

        let mut idx = 0;
        while redundancy > 0 && idx < contributors.len() {
            let mv = contributors[idx];
            if self.problem.act_per_user(mv.m) <= redundancy
                && solution[mv.as_solution_index()] > 0
            {
                redundancy -= self.problem.act_per_user(mv.m);
                let delta = Delta::remove(self.problem, mv, 1);
                gain += self.apply(&delta, solution, ledger);
                deltas.push(delta);
            } else {
                idx += 1;
            }
        }

        ledger.moves_to_j[j] = contributors;
        gain
    }

    /// Tries to replace `users_to_remove` users of the chain seed `curr`
    /// with a cheaper combination, recursing when a replacement borrows
    /// users some other destination currently holds.
    ///
    /// On success the deltas stay applied and are appended to
    /// `committed_out`; on failure every delta of this level is reverted
    /// and the tabu entry is popped, leaving solution and ledger exactly as
    /// on entry.
    #[allow(clippy::too_many_arguments)]
    fn try_improve(
        &self,
        solution: &mut Tensor4<i32>,
        ledger: &mut MoveLedger,
        tabu: &mut Vec<MoveIndex>,
        committed_out: &mut Vec<Delta>,
        gain_so_far: &mut f64,
        curr: MoveIndex,
        users_to_remove: i32,
        level: u32,
    ) -> bool {
        if solution[curr.as_solution_index()] < users_to_remove
            || level > MAX_LEVEL
            || tabu.contains(&curr)
        {
            return false;
        }
        tabu.push(curr);

        let mut deltas: Vec<Delta> = Vec::new();
        let removal = Delta::remove(self.problem, curr, users_to_remove);
        *gain_so_far += self.apply(&removal, solution, ledger);
        deltas.push(removal);

        let act_removed = users_to_remove * self.problem.act_per_user(curr.m);
        let k = self.index.orders().index_for(act_removed);
        let mut count = 0u32;

        // The whole list is walked, exhausted buckets included: the supply
        // check below is against the problem's absolute availability, and a
        // transiently negative residual is what triggers the recursion.
        let candidates = self.index.orders().list(k, curr.j).entries();
        for &cand in candidates {
            let cap = self.problem.act_per_user(cand.m);
            let need = (act_removed + cap - 1) / cap;
            if tabu.contains(&cand)
                || self.problem.users_available()[cand.bucket().as_supply_index()] < need
            {
                continue;
            }

            let mark = deltas.len();
            let addition = Delta::add(self.problem, cand, need);
            *gain_so_far += self.apply(&addition, solution, ledger);
            deltas.push(addition);
            *gain_so_far += self.prune_overshoot(curr.j, solution, ledger, &mut deltas);

            count += 1;
            if *gain_so_far < MIN_GAIN || count > MAX_COUNT || self.stop.load(Ordering::Relaxed) {
                break;
            }

            let shortfall = ledger.residual_supply[cand.bucket().as_supply_index()];
            if shortfall >= 0 {
                if *gain_so_far > 0.0 {
                    committed_out.append(&mut deltas);
                    return true;
                }
                self.undo_to(mark, &mut deltas, gain_so_far, solution, ledger);
                continue;
            }

            // The replacement overdraws its bucket: some sibling move fed
            // from the same bucket has to give users back first.
            let mut recovered = false;
            for s_idx in 0..ledger.moves_from_i[cand.i].len() {
                let sibling = ledger.moves_from_i[cand.i][s_idx];
                if sibling.m != cand.m || sibling.t != cand.t {
                    continue;
                }
                let mut child = Vec::new();
                if self.try_improve(
                    solution,
                    ledger,
                    tabu,
                    &mut child,
                    gain_so_far,
                    sibling,
                    -shortfall,
                    level + 1,
                ) {
                    deltas.append(&mut child);
                    committed_out.append(&mut deltas);
                    recovered = true;
                    break;
                }
            }
            if recovered {
                return true;
            }
            self.undo_to(mark, &mut deltas, gain_so_far, solution, ledger);
        }

        self.undo_to(0, &mut deltas, gain_so_far, solution, ledger);
        tabu.pop();
        false
    }
}

/// One improvement pass over a feasible solution.
///
/// Every move of the current assignment is tried as the seed of a chain,
/// for every removal count from the largest user capacity down to one, and
/// each seed is retried as long as it keeps paying off. Returns the total
/// objective gain; the solution is updated in place and stays feasible.
pub fn improving_phase(
    problem: &Problem,
    index: &SearchIndex,
    solution: &mut Tensor4<i32>,
    stop: &AtomicBool,
) -> f64 {
    let mut ledger = MoveLedger::build(problem, solution);
    let roots = ledger.moves.clone();
    let pass = ImprovePass {
        problem,
        index,
        stop,
    };

    let mut improvement = 0.0;
    for &root in &roots {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        for users_to_remove in (1..=index.max_act_per_user()).rev() {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                let mut committed = Vec::new();
                let mut tabu = Vec::new();
                let mut gain_so_far = 0.0;
                if pass.try_improve(
                    solution,
                    &mut ledger,
                    &mut tabu,
                    &mut committed,
                    &mut gain_so_far,
                    root,
                    users_to_remove,
                    0,
                ) {
                    improvement += committed.iter().map(|d| d.gain).sum::<f64>();
                } else {
                    break;
                }
            }
        }
    }

    improvement
}
