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

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Total wall-clock budget for one solve.
    pub time_budget: Duration,
    /// Number of search worker threads.
    pub workers: usize,
    /// Fraction of the budget granted to standard-construction workers.
    pub normal_frac: f64,
    /// Fraction of the budget granted to workers in scarce-user mode.
    pub scarce_frac: f64,
    /// Master RNG seed. The default keeps runs reproducible; seed from a
    /// clock if that is not wanted.
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(5000),
            workers: 8,
            normal_frac: 0.50,
            scarce_frac: 0.95,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SolverConfig;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.time_budget, Duration::from_millis(5000));
        assert_eq!(config.workers, 8);
        assert_eq!(config.normal_frac, 0.50);
        assert_eq!(config.scarce_frac, 0.95);
        assert_eq!(config.seed, 0);
    }
}
