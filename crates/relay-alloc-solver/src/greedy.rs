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
use crate::slots::ActivitySlots;
use crate::stats::SearchIndex;
use crate::usage::UsageTracker;
use relay_alloc_core::tensor::{Tensor3, Tensor4};
use relay_alloc_model::problem::Problem;

/// Working buffers reused across greedy restarts to avoid reallocation.
#[derive(Debug)]
pub struct GreedyScratch {
    users_available: Tensor3<i32>,
    inserted: Vec<MoveIndex>,
    remaining: Vec<(usize, i32)>,
}

impl GreedyScratch {
    pub fn new(problem: &Problem) -> Self {
        Self {
            users_available: Tensor3::zeros([
                problem.n_cells(),
                problem.n_types(),
                problem.n_times(),
            ]),
            inserted: Vec::new(),
            remaining: Vec::new(),
        }
    }
}

/// Builds a complete assignment for the given destination visit order.
///
/// Destinations are served one at a time; within a cell the candidate list
/// matching the remaining demand is scanned in reduced-cost order and the
/// cheapest effective candidate (usage score breaking ties) is committed in
/// bulk. Returns the objective, or `f64::INFINITY` when some demand cannot
/// be covered from the remaining supply.
pub fn construct(
    problem: &Problem,
    index: &SearchIndex,
    order: &[usize],
    usage: &mut UsageTracker,
    scratch: &mut GreedyScratch,
    solution: &mut Tensor4<i32>,
) -> f64 {
    solution.reset();
    scratch.users_available.copy_from(problem.users_available());
    let users = &mut scratch.users_available;
    let mut objective = 0.0;

    for &j in order {
        let mut demand = problem.activities(j);
        scratch.inserted.clear();

        while demand > 0 {
            let k = index.orders().index_for(demand);
            let list = index.orders().list(k, j);

            let mut pos = 0;
            let mut best: Option<(MoveIndex, f64)> = None;
            while let Some(cand) = list.next_available(&mut pos, users) {
                let eff = problem.cost(cand.i, cand.j, cand.m, cand.t)
                    / demand.min(problem.act_per_user(cand.m)) as f64;
                match best {
                    // The list is sorted: nothing after a worse candidate
                    // can win.
                    Some((_, best_eff)) if eff > best_eff => break,
                    Some((incumbent, best_eff)) => {
                        if eff < best_eff || usage.prefers(cand.bucket(), incumbent.bucket()) {
                            best = Some((cand, eff));
                        }
                    }
                    None => best = Some((cand, eff)),
                }
            }

            let Some((chosen, _)) = best else {
                return f64::INFINITY;
            };

            let cap = problem.act_per_user(chosen.m);
            let mut n_users = (demand / cap).min(users[chosen.bucket().as_supply_index()]);
            if n_users == 0 {
                // Only reachable for an over-capacity type; the scan already
                // guaranteed at least one user in the bucket.
                debug_assert!(users[chosen.bucket().as_supply_index()] >= 1);
                n_users = 1;
            }

            solution[chosen.as_solution_index()] += n_users;
            objective += problem.cost(chosen.i, chosen.j, chosen.m, chosen.t) * n_users as f64;
            demand -= cap * n_users;
            users[chosen.bucket().as_supply_index()] -= n_users;
            scratch.inserted.push(chosen);
            usage.add(chosen.bucket(), n_users, problem.users_available());
        }

        if demand < 0 {
            rebalance(
                problem,
                solution,
                users,
                &mut scratch.inserted,
                &mut objective,
                -demand,
            );
        }
    }

    objective
}

/// Removes over-capacity users committed to the cell just served.
///
/// Overshoot appears when cheap low-capacity users are taken first and a
/// big-capacity user closes the gap; walking the in-cell insert log by
/// non-increasing raw cost gives back every user whose capacity fits within
/// the excess.
fn rebalance(
    problem: &Problem,
    solution: &mut Tensor4<i32>,
    users: &mut Tensor3<i32>,
    inserted: &mut [MoveIndex],
    objective: &mut f64,
    mut excess: i32,
) {
    inserted.sort_by(|a, b| {
        problem
            .cost(b.i, b.j, b.m, b.t)
            .total_cmp(&problem.cost(a.i, a.j, a.m, a.t))
    });

    let mut idx = 0;
    while excess > 0 && idx < inserted.len() {
        let entry = inserted[idx];
        let cap = problem.act_per_user(entry.m);
        if cap <= excess && solution[entry.as_solution_index()] > 0 {
            solution[entry.as_solution_index()] -= 1;
            if solution[entry.as_solution_index()] == 0 {
                idx += 1;
            }
            *objective -= problem.cost(entry.i, entry.j, entry.m, entry.t);
            excess -= cap;
            users[entry.bucket().as_supply_index()] += 1;
        } else {
            idx += 1;
        }
    }
}

/// Fallback constructor for instances with few users to spare.
///
/// Two passes over the residual demands in visit order. The first refuses
/// every choice that would strand activities (per the reachability table)
/// and prefers higher-capacity types at equal cost; the second admits
/// anything. Users are committed one at a time. Infeasible only when the
/// wasting pass still finds no candidate for an open cell.
pub fn construct_scarce(
    problem: &Problem,
    index: &SearchIndex,
    slots: &ActivitySlots,
    order: &[usize],
    scratch: &mut GreedyScratch,
    solution: &mut Tensor4<i32>,
) -> f64 {
    solution.reset();
    scratch.users_available.copy_from(problem.users_available());
    let users = &mut scratch.users_available;
    let mut objective = 0.0;

    scratch.remaining.clear();
    scratch
        .remaining
        .extend(order.iter().map(|&j| (j, problem.activities(j))));

    for pass in 0..2 {
        let wasting = pass == 1;

        for b in 0..scratch.remaining.len() {
            let (j, mut demand) = scratch.remaining[b];
            if !wasting && slots.should_skip(demand) {
                continue;
            }

            while demand > 0 {
                let k = index.orders().index_for(demand);
                let list = index.orders().list(k, j);

                let mut pos = 0;
                let mut best: Option<(MoveIndex, f64)> = None;
                while let Some(cand) = list.next_available(&mut pos, users) {
                    let eff = problem.cost(cand.i, cand.j, cand.m, cand.t)
                        / demand.min(problem.act_per_user(cand.m)) as f64;
                    if let Some((_, best_eff)) = best {
                        if eff > best_eff {
                            break;
                        }
                    }
                    if !wasting && !slots.can_be_selected(demand, cand.m) {
                        continue;
                    }
                    match best {
                        None => best = Some((cand, eff)),
                        Some((incumbent, best_eff)) => {
                            if eff < best_eff
                                || problem.act_per_user(cand.m)
                                    > problem.act_per_user(incumbent.m)
                            {
                                best = Some((cand, eff));
                            }
                        }
                    }
                }

                let Some((chosen, _)) = best else {
                    if wasting {
                        return f64::INFINITY;
                    }
                    // Leave the rest of this cell to the wasting pass.
                    break;
                };

                solution[chosen.as_solution_index()] += 1;
                objective += problem.cost(chosen.i, chosen.j, chosen.m, chosen.t);
                demand -= problem.act_per_user(chosen.m);
                users[chosen.bucket().as_supply_index()] -= 1;
            }

            scratch.remaining[b] = (j, demand);
        }
    }

    objective
}

#[cfg(test)]
mod tests {
    use super::{GreedyScratch, construct, construct_scarce};
    use crate::stats::SearchIndex;
    use crate::usage::UsageTracker;
    use relay_alloc_core::tensor::{Tensor3, Tensor4};
    use relay_alloc_model::problem::Problem;
    use relay_alloc_model::sol::Solution;
    use relay_alloc_model::verify::{Feasibility, check};

    fn usage_for(problem: &Problem) -> UsageTracker {
        UsageTracker::new([problem.n_cells(), problem.n_types(), problem.n_times()])
    }

    fn solution_for(problem: &Problem) -> Tensor4<i32> {
        Tensor4::zeros([
            problem.n_cells(),
            problem.n_cells(),
            problem.n_types(),
            problem.n_times(),
        ])
    }

    // One type-0 user at cell 0 covers the single activity at cell 1.
    fn trivial_problem() -> Problem {
        let mut supply = Tensor3::zeros([2, 1, 1]);
        supply[[0, 0, 0]] = 1;
        let mut costs = Tensor4::zeros([2, 2, 1, 1]);
        costs[[0, 1, 0, 0]] = 7.0;
        costs[[1, 0, 0, 0]] = 7.0;
        Problem::from_parts(vec![1], vec![0, 1], supply, costs).unwrap()
    }

    #[test]
    fn test_trivial_single_move() {
        let problem = trivial_problem();
        let index = SearchIndex::build(&problem);
        let mut usage = usage_for(&problem);
        let mut scratch = GreedyScratch::new(&problem);
        let mut solution = solution_for(&problem);

        let obj = construct(
            &problem,
            &index,
            &[1],
            &mut usage,
            &mut scratch,
            &mut solution,
        );
        assert_eq!(obj, 7.0);
        assert_eq!(solution[[0, 1, 0, 0]], 1);
        let sol = Solution::new(solution, obj);
        assert_eq!(check(&problem, Some(&sol)), Feasibility::Feasible);
    }

    #[test]
    fn test_unsatisfiable_demand_returns_sentinel() {
        let mut supply = Tensor3::zeros([2, 1, 1]);
        supply[[0, 0, 0]] = 1;
        let mut costs = Tensor4::zeros([2, 2, 1, 1]);
        costs[[0, 1, 0, 0]] = 7.0;
        let problem = Problem::from_parts(vec![1], vec![0, 3], supply, costs).unwrap();
        let index = SearchIndex::build(&problem);
        let mut usage = usage_for(&problem);
        let mut scratch = GreedyScratch::new(&problem);
        let mut solution = solution_for(&problem);

        let obj = construct(
            &problem,
            &index,
            &[1],
            &mut usage,
            &mut scratch,
            &mut solution,
        );
        assert!(obj.is_infinite());
    }

    // Cell 0 holds one type-0 user (capacity 1, cost 4) and one type-1 user
    // (capacity 3, cost 15). Cell 1 demands 3 activities: the cheap small
    // user is taken first, the big one overshoots, and the rebalance walk
    // gives the small one back.
    #[test]
    fn test_overshoot_rebalance_drops_expensive_small_user() {
        let mut supply = Tensor3::zeros([2, 2, 1]);
        supply[[0, 0, 0]] = 1;
        supply[[0, 1, 0]] = 1;
        let mut costs = Tensor4::zeros([2, 2, 2, 1]);
        costs[[0, 1, 0, 0]] = 4.0;
        costs[[0, 1, 1, 0]] = 15.0;
        let problem = Problem::from_parts(vec![1, 3], vec![0, 3], supply, costs).unwrap();
        let index = SearchIndex::build(&problem);
        let mut usage = usage_for(&problem);
        let mut scratch = GreedyScratch::new(&problem);
        let mut solution = solution_for(&problem);

        let obj = construct(
            &problem,
            &index,
            &[1],
            &mut usage,
            &mut scratch,
            &mut solution,
        );
        assert_eq!(obj, 15.0);
        assert_eq!(solution[[0, 1, 1, 0]], 1);
        assert_eq!(solution[[0, 1, 0, 0]], 0);
        // The rebalance returned the small user to the pool.
        assert_eq!(scratch.users_available[[0, 0, 0]], 1);
    }

    // Equal-cost candidates at cells 0 and 1 serving cell 2: the second
    // restart must flip to the bucket the first one did not take.
    #[test]
    fn test_usage_breaks_cost_ties_across_restarts() {
        let mut supply = Tensor3::zeros([3, 1, 1]);
        supply[[0, 0, 0]] = 1;
        supply[[1, 0, 0]] = 1;
        let mut costs = Tensor4::zeros([3, 3, 1, 1]);
        costs[[0, 2, 0, 0]] = 5.0;
        costs[[1, 2, 0, 0]] = 5.0;
        let problem = Problem::from_parts(vec![1], vec![0, 0, 1], supply, costs).unwrap();
        let index = SearchIndex::build(&problem);
        let mut usage = usage_for(&problem);
        let mut scratch = GreedyScratch::new(&problem);
        let mut solution = solution_for(&problem);

        let obj = construct(
            &problem,
            &index,
            &[2],
            &mut usage,
            &mut scratch,
            &mut solution,
        );
        assert_eq!(obj, 5.0);
        let first_pick = if solution[[0, 2, 0, 0]] == 1 { 0 } else { 1 };

        let obj = construct(
            &problem,
            &index,
            &[2],
            &mut usage,
            &mut scratch,
            &mut solution,
        );
        assert_eq!(obj, 5.0);
        let second_pick = if solution[[0, 2, 0, 0]] == 1 { 0 } else { 1 };
        assert_ne!(first_pick, second_pick);
    }

    // Two type-0 users (capacity 2) and one type-1 user (capacity 3) at cell
    // 0 must cover demands of 4 and 3 exactly. The standard greedy wastes
    // capacity on every visit order and fails; the no-waste pass of the
    // scarce constructor packs both cells.
    fn tight_problem() -> Problem {
        let mut supply = Tensor3::zeros([3, 2, 1]);
        supply[[0, 0, 0]] = 2;
        supply[[0, 1, 0]] = 1;
        let mut costs = Tensor4::zeros([3, 3, 2, 1]);
        costs[[0, 1, 0, 0]] = 3.0;
        costs[[0, 1, 1, 0]] = 3.0;
        costs[[0, 2, 0, 0]] = 3.0;
        costs[[0, 2, 1, 0]] = 30.0;
        Problem::from_parts(vec![2, 3], vec![0, 4, 3], supply, costs).unwrap()
    }

    #[test]
    fn test_standard_greedy_fails_on_tight_instance() {
        let problem = tight_problem();
        let index = SearchIndex::build(&problem);
        let mut usage = usage_for(&problem);
        let mut scratch = GreedyScratch::new(&problem);
        let mut solution = solution_for(&problem);

        for order in [[1, 2], [2, 1]] {
            let obj = construct(
                &problem,
                &index,
                &order,
                &mut usage,
                &mut scratch,
                &mut solution,
            );
            assert!(obj.is_infinite(), "order {order:?} should be infeasible");
        }
    }

    #[test]
    fn test_scarce_first_pass_packs_tight_instance() {
        let problem = tight_problem();
        let index = SearchIndex::build(&problem);
        let slots = index.activity_slots(&problem);
        let mut scratch = GreedyScratch::new(&problem);
        let mut solution = solution_for(&problem);

        for order in [[1, 2], [2, 1]] {
            let obj = construct_scarce(
                &problem,
                &index,
                slots,
                &order,
                &mut scratch,
                &mut solution,
            );
            assert!(obj.is_finite());
            // Exact packing: two capacity-2 users at cell 1, the capacity-3
            // user at cell 2, nothing wasted.
            assert_eq!(solution[[0, 1, 0, 0]], 2);
            assert_eq!(solution[[0, 2, 1, 0]], 1);
            assert_eq!(obj, 36.0);
            let sol = Solution::new(solution.clone(), obj);
            assert_eq!(check(&problem, Some(&sol)), Feasibility::Feasible);
        }
    }

    #[test]
    fn test_scarce_second_pass_allows_waste() {
        // A single capacity-3 user covers a demand of 2 only by wasting one
        // activity; pass 1 skips the cell entirely, pass 2 serves it.
        let mut supply = Tensor3::zeros([2, 1, 1]);
        supply[[0, 0, 0]] = 1;
        let mut costs = Tensor4::zeros([2, 2, 1, 1]);
        costs[[0, 1, 0, 0]] = 6.0;
        let problem = Problem::from_parts(vec![3], vec![0, 2], supply, costs).unwrap();
        let index = SearchIndex::build(&problem);
        let slots = index.activity_slots(&problem);
        let mut scratch = GreedyScratch::new(&problem);
        let mut solution = solution_for(&problem);

        let obj = construct_scarce(
            &problem,
            &index,
            slots,
            &[1],
            &mut scratch,
            &mut solution,
        );
        assert_eq!(obj, 6.0);
        assert_eq!(solution[[0, 1, 0, 0]], 1);
    }
}
