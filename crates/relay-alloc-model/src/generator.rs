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
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use relay_alloc_core::tensor::{Tensor3, Tensor4};

/// Configuration for the synthetic instance generator used by benches and
/// end-to-end tests.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceConfig {
    pub cells: usize,
    pub types: usize,
    pub times: usize,
    /// Per-type activity capacities; cycled when `types` exceeds its length.
    pub activity_caps: Vec<i32>,
    pub max_cost: i32,
    pub max_demand: i32,
    pub max_supply: i32,
    pub seed: u64,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            cells: 20,
            types: 3,
            times: 4,
            activity_caps: vec![1, 2, 3],
            max_cost: 100,
            max_demand: 12,
            max_supply: 4,
            seed: 42,
        }
    }
}

/// Generates a random instance. Supply is drawn per bucket, so with the
/// default parameters instances are feasible with overwhelming probability;
/// scarcity can be dialed in by shrinking `max_supply`.
pub fn generate(config: &InstanceConfig) -> Problem {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let InstanceConfig {
        cells,
        types,
        times,
        ..
    } = *config;

    let act_per_user: Vec<i32> = (0..types)
        .map(|m| config.activity_caps[m % config.activity_caps.len()].max(1))
        .collect();
    let activities: Vec<i32> = (0..cells)
        .map(|_| rng.random_range(0..=config.max_demand))
        .collect();

    let mut users_available = Tensor3::zeros([cells, types, times]);
    for i in 0..cells {
        for m in 0..types {
            for t in 0..times {
                users_available[[i, m, t]] = rng.random_range(0..=config.max_supply);
            }
        }
    }

    let mut costs = Tensor4::zeros([cells, cells, types, times]);
    for i in 0..cells {
        for j in 0..cells {
            if i == j {
                continue;
            }
            for m in 0..types {
                for t in 0..times {
                    costs[[i, j, m, t]] = rng.random_range(1..=config.max_cost) as f64;
                }
            }
        }
    }

    Problem::from_parts(act_per_user, activities, users_available, costs)
        .expect("generated instance is structurally valid")
}
