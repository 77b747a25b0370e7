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
use crate::sol::Solution;
use std::fmt::Display;

const OBJECTIVE_TOLERANCE: f64 = 1e-3;

/// Independent feasibility verdict for a returned solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feasibility {
    Feasible,
    DemandNotMet {
        cell: usize,
    },
    SupplyExceeded {
        cell: usize,
        user_type: usize,
        period: usize,
    },
    SelfAssignment {
        cell: usize,
    },
    ObjectiveMismatch {
        reported: f64,
        recomputed: f64,
    },
    NoSolution,
}

impl Display for Feasibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feasibility::Feasible => write!(f, "Solution is feasible"),
            Feasibility::DemandNotMet { cell } => {
                write!(f, "Solution is not feasible: demand not satisfied in cell {cell}")
            }
            Feasibility::SupplyExceeded {
                cell,
                user_type,
                period,
            } => write!(
                f,
                "Solution is not feasible: exceeded available users in ({cell}, {user_type}, {period})"
            ),
            Feasibility::SelfAssignment { cell } => {
                write!(f, "Solution is not feasible: users serve their own cell {cell}")
            }
            Feasibility::ObjectiveMismatch {
                reported,
                recomputed,
            } => write!(
                f,
                "Objective value {reported} does not match recomputed value {recomputed}"
            ),
            Feasibility::NoSolution => write!(f, "No solution found"),
        }
    }
}

/// Re-derives every solution invariant from scratch: demand coverage,
/// supply caps, the zero diagonal, and the reported objective (within a
/// 1e-3 absolute tolerance). Violations are reported, never retried.
pub fn check(problem: &Problem, solution: Option<&Solution>) -> Feasibility {
    let Some(solution) = solution else {
        return Feasibility::NoSolution;
    };
    let moves = solution.moves();

    for j in 0..problem.n_cells() {
        let mut done = 0i64;
        for i in 0..problem.n_cells() {
            for m in 0..problem.n_types() {
                for t in 0..problem.n_times() {
                    done += problem.act_per_user(m) as i64 * moves[[i, j, m, t]] as i64;
                }
            }
        }
        if done < problem.activities(j) as i64 {
            return Feasibility::DemandNotMet { cell: j };
        }
    }

    for i in 0..problem.n_cells() {
        for m in 0..problem.n_types() {
            for t in 0..problem.n_times() {
                let mut moved = 0i64;
                for j in 0..problem.n_cells() {
                    moved += moves[[i, j, m, t]] as i64;
                }
                if moved > problem.users_available()[[i, m, t]] as i64 {
                    return Feasibility::SupplyExceeded {
                        cell: i,
                        user_type: m,
                        period: t,
                    };
                }
                if moves[[i, i, m, t]] != 0 {
                    return Feasibility::SelfAssignment { cell: i };
                }
            }
        }
    }

    let recomputed = solution.recompute_objective(problem);
    if (recomputed - solution.objective()).abs() > OBJECTIVE_TOLERANCE {
        return Feasibility::ObjectiveMismatch {
            reported: solution.objective(),
            recomputed,
        };
    }

    Feasibility::Feasible
}

#[cfg(test)]
mod tests {
    use super::{Feasibility, check};
    use crate::problem::Problem;
    use crate::sol::Solution;
    use relay_alloc_core::tensor::{Tensor3, Tensor4};

    // The trivial single-user instance: cell 0 holds one type-0 user that
    // serves the single activity demanded at cell 1 for cost 7.
    fn trivial_problem() -> Problem {
        let mut supply = Tensor3::zeros([2, 1, 1]);
        supply[[0, 0, 0]] = 1;
        let mut costs = Tensor4::zeros([2, 2, 1, 1]);
        costs[[0, 1, 0, 0]] = 7.0;
        costs[[1, 0, 0, 0]] = 7.0;
        Problem::from_parts(vec![1], vec![0, 1], supply, costs).unwrap()
    }

    fn trivial_solution() -> Solution {
        let mut moves = Tensor4::zeros([2, 2, 1, 1]);
        moves[[0, 1, 0, 0]] = 1;
        Solution::new(moves, 7.0)
    }

    #[test]
    fn test_feasible_verdict() {
        let problem = trivial_problem();
        let solution = trivial_solution();
        assert_eq!(check(&problem, Some(&solution)), Feasibility::Feasible);
    }

    #[test]
    fn test_absent_solution() {
        let problem = trivial_problem();
        assert_eq!(check(&problem, None), Feasibility::NoSolution);
    }

    #[test]
    fn test_demand_not_met() {
        let problem = trivial_problem();
        let solution = Solution::new(Tensor4::zeros([2, 2, 1, 1]), 0.0);
        assert_eq!(
            check(&problem, Some(&solution)),
            Feasibility::DemandNotMet { cell: 1 }
        );
    }

    #[test]
    fn test_supply_exceeded() {
        let problem = trivial_problem();
        let mut moves = Tensor4::zeros([2, 2, 1, 1]);
        moves[[0, 1, 0, 0]] = 2;
        let solution = Solution::new(moves, 14.0);
        assert_eq!(
            check(&problem, Some(&solution)),
            Feasibility::SupplyExceeded {
                cell: 0,
                user_type: 0,
                period: 0
            }
        );
    }

    #[test]
    fn test_self_assignment_detected() {
        let mut supply = Tensor3::zeros([2, 1, 1]);
        supply[[0, 0, 0]] = 2;
        let mut costs = Tensor4::zeros([2, 2, 1, 1]);
        costs[[0, 1, 0, 0]] = 7.0;
        let problem = Problem::from_parts(vec![1], vec![1, 1], supply, costs).unwrap();
        let mut moves = Tensor4::zeros([2, 2, 1, 1]);
        moves[[0, 1, 0, 0]] = 1;
        moves[[0, 0, 0, 0]] = 1;
        let solution = Solution::new(moves, 7.0);
        assert_eq!(
            check(&problem, Some(&solution)),
            Feasibility::SelfAssignment { cell: 0 }
        );
    }

    #[test]
    fn test_objective_mismatch_beyond_tolerance() {
        let problem = trivial_problem();
        let mut moves = Tensor4::zeros([2, 2, 1, 1]);
        moves[[0, 1, 0, 0]] = 1;
        let solution = Solution::new(moves, 7.5);
        assert_eq!(
            check(&problem, Some(&solution)),
            Feasibility::ObjectiveMismatch {
                reported: 7.5,
                recomputed: 7.0
            }
        );
    }
}
