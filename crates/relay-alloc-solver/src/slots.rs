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

/// Reachability table for the scarce-user construction.
///
/// Row `a` answers: starting from `a` remaining activities, can some
/// sequence of user types land exactly on zero? Entry `(a, m)` is true when
/// picking one type-`m` user next keeps that possible; the extra sentinel
/// column holds the disjunction over all types. Row 0 is all true.
///
/// With this table the no-waste pass can refuse choices that would force
/// more activities to be performed than demanded.
#[derive(Debug, Clone)]
pub struct ActivitySlots {
    width: usize,
    data: Vec<bool>,
}

impl ActivitySlots {
    pub fn build(max_activities: i32, act_per_user: &[i32]) -> Self {
        let n_types = act_per_user.len();
        let width = n_types + 1;
        let rows = max_activities.max(0) as usize + 1;
        let mut data = vec![false; rows * width];
        for cell in &mut data[..width] {
            *cell = true;
        }
        for a in 1..rows {
            for (m, &cap) in act_per_user.iter().enumerate() {
                let residual = a as i32 - cap;
                if residual >= 0 {
                    let reachable = data[residual as usize * width + n_types];
                    data[a * width + m] = reachable;
                    if reachable {
                        data[a * width + n_types] = true;
                    }
                }
            }
        }
        Self { width, data }
    }

    /// True when no user type can start a waste-free completion of `demand`.
    #[inline]
    pub fn should_skip(&self, demand: i32) -> bool {
        !self.data[demand as usize * self.width + self.width - 1]
    }

    /// True when serving `demand` with one type-`m` user can still end on
    /// exactly zero remaining activities.
    #[inline]
    pub fn can_be_selected(&self, demand: i32, m: usize) -> bool {
        demand >= 0 && self.data[demand as usize * self.width + m]
    }
}

#[cfg(test)]
mod tests {
    use super::ActivitySlots;

    #[test]
    fn test_zero_demand_row_is_true() {
        let slots = ActivitySlots::build(4, &[2, 3]);
        assert!(slots.can_be_selected(0, 0));
        assert!(slots.can_be_selected(0, 1));
        assert!(!slots.should_skip(0));
    }

    #[test]
    fn test_selection_requires_enough_demand() {
        let slots = ActivitySlots::build(6, &[2, 3]);
        for a in 0..=6 {
            for (m, &cap) in [2, 3].iter().enumerate() {
                if slots.can_be_selected(a, m) && a > 0 {
                    assert!(a >= cap, "type {m} selected with demand {a}");
                }
            }
        }
    }

    #[test]
    fn test_reachability_with_caps_two_and_three() {
        let slots = ActivitySlots::build(7, &[2, 3]);
        // 1 is unreachable; everything from 2 upwards decomposes into 2s/3s.
        assert!(slots.should_skip(1));
        for a in 2..=7 {
            assert!(!slots.should_skip(a), "demand {a} should be coverable");
        }
        // Taking a 3 at demand 4 strands a residual of 1.
        assert!(!slots.can_be_selected(4, 1));
        assert!(slots.can_be_selected(4, 0));
        // At 5 either type works: 5-2=3 and 5-3=2 are both coverable.
        assert!(slots.can_be_selected(5, 0));
        assert!(slots.can_be_selected(5, 1));
    }

    #[test]
    fn test_sentinel_is_disjunction_of_types() {
        let caps = [3, 4];
        let slots = ActivitySlots::build(10, &caps);
        for a in 0..=10 {
            let any = (0..caps.len()).any(|m| slots.can_be_selected(a, m));
            assert_eq!(!slots.should_skip(a), any || a == 0);
        }
    }

    #[test]
    fn test_negative_demand_is_never_selectable() {
        let slots = ActivitySlots::build(3, &[1]);
        assert!(!slots.can_be_selected(-1, 0));
    }
}
