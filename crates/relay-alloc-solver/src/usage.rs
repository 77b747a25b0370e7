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

use crate::order::BucketIndex;
use relay_alloc_core::tensor::Tensor3;

/// Per-bucket fractional usage accumulated across the greedy restarts of one
/// worker.
///
/// Committing `n` users of a bucket adds `n / users_available[bucket]`, so a
/// bucket that keeps getting drained scores high. Between equal-cost
/// candidates the greedy prefers the lower score, steering consecutive
/// restarts toward users that were less contended so far. Deliberately never
/// reset within a worker.
#[derive(Debug, Clone)]
pub struct UsageTracker {
    usage: Tensor3<f64>,
}

impl UsageTracker {
    pub fn new(shape: [usize; 3]) -> Self {
        Self {
            usage: Tensor3::zeros(shape),
        }
    }

    /// Records that `n_users` from `bucket` were committed.
    #[inline]
    pub fn add(&mut self, bucket: BucketIndex, n_users: i32, users_available: &Tensor3<i32>) {
        let total = users_available[bucket.as_supply_index()];
        self.usage[bucket.as_supply_index()] += n_users as f64 / total as f64;
    }

    /// True when `candidate` has been leaned on less than `incumbent`.
    #[inline]
    pub fn prefers(&self, candidate: BucketIndex, incumbent: BucketIndex) -> bool {
        self.usage[candidate.as_supply_index()] < self.usage[incumbent.as_supply_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::UsageTracker;
    use crate::order::BucketIndex;
    use relay_alloc_core::tensor::Tensor3;

    #[test]
    fn test_add_scales_by_availability() {
        let mut available = Tensor3::zeros([2, 1, 1]);
        available[[0, 0, 0]] = 4;
        available[[1, 0, 0]] = 1;
        let mut usage = UsageTracker::new([2, 1, 1]);

        let a = BucketIndex { i: 0, m: 0, t: 0 };
        let b = BucketIndex { i: 1, m: 0, t: 0 };
        usage.add(a, 2, &available);
        usage.add(b, 1, &available);

        // 2/4 used of bucket a, 1/1 of bucket b: a is now the lighter one.
        assert!(usage.prefers(a, b));
        assert!(!usage.prefers(b, a));
    }

    #[test]
    fn test_untouched_buckets_tie() {
        let available = Tensor3::filled([2, 1, 1], 3);
        let usage = UsageTracker::new([2, 1, 1]);
        let a = BucketIndex { i: 0, m: 0, t: 0 };
        let b = BucketIndex { i: 1, m: 0, t: 0 };
        assert!(!usage.prefers(a, b));
        assert!(!usage.prefers(b, a));
    }
}
