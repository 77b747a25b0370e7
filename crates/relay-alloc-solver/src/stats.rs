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

use crate::order::CandidateOrders;
use crate::slots::ActivitySlots;
use relay_alloc_model::problem::Problem;
use std::sync::OnceLock;

/// Derived, read-only search statistics shared by all workers.
///
/// Built once before the search starts; the only late field is the
/// activity-slot table, which is needed only if some worker enters
/// scarce-user mode and is then published exactly once through a `OnceLock`.
#[derive(Debug)]
pub struct SearchIndex {
    act_per_user_sorted: Vec<i32>,
    max_act_per_user: i32,
    max_activities: i32,
    orders: CandidateOrders,
    slots: OnceLock<ActivitySlots>,
}

impl SearchIndex {
    pub fn build(problem: &Problem) -> Self {
        let mut act_per_user_sorted = problem.act_per_user_all().to_vec();
        act_per_user_sorted.sort_unstable_by(|a, b| b.cmp(a));
        let max_act_per_user = act_per_user_sorted[0];
        let max_activities = problem.activities_all().iter().copied().max().unwrap_or(0);
        let orders = CandidateOrders::build(problem, &act_per_user_sorted);
        Self {
            act_per_user_sorted,
            max_act_per_user,
            max_activities,
            orders,
            slots: OnceLock::new(),
        }
    }

    #[inline]
    pub fn act_per_user_sorted(&self) -> &[i32] {
        &self.act_per_user_sorted
    }

    #[inline]
    pub fn max_act_per_user(&self) -> i32 {
        self.max_act_per_user
    }

    #[inline]
    pub fn max_activities(&self) -> i32 {
        self.max_activities
    }

    #[inline]
    pub fn orders(&self) -> &CandidateOrders {
        &self.orders
    }

    /// The scarce-mode reachability table; constructed on first use,
    /// published once, shared by every worker afterwards.
    pub fn activity_slots(&self, problem: &Problem) -> &ActivitySlots {
        self.slots
            .get_or_init(|| ActivitySlots::build(self.max_activities, problem.act_per_user_all()))
    }
}

#[cfg(test)]
mod tests {
    use super::SearchIndex;
    use relay_alloc_core::tensor::{Tensor3, Tensor4};
    use relay_alloc_model::problem::Problem;

    fn problem() -> Problem {
        let supply = Tensor3::filled([3, 3, 2], 1);
        let costs = Tensor4::filled([3, 3, 3, 2], 1.0);
        Problem::from_parts(vec![2, 5, 1], vec![4, 0, 9], supply, costs).unwrap()
    }

    #[test]
    fn test_build_sorts_caps_and_tracks_maxima() {
        let problem = problem();
        let index = SearchIndex::build(&problem);
        assert_eq!(index.act_per_user_sorted(), &[5, 2, 1]);
        assert_eq!(index.max_act_per_user(), 5);
        assert_eq!(index.max_activities(), 9);
    }

    #[test]
    fn test_activity_slots_built_once() {
        let problem = problem();
        let index = SearchIndex::build(&problem);
        let first = index.activity_slots(&problem) as *const _;
        let second = index.activity_slots(&problem) as *const _;
        assert_eq!(first, second);
    }
}
