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

use relay_alloc_core::tensor::{Tensor3, Tensor4};
use std::fmt::Display;

/// A problem instance, immutable once constructed.
///
/// Destination cells demand `activities`; users grouped by
/// (source cell, user type, time period) can serve them. Moving one user of
/// type `m` at period `t` from cell `i` to cell `j` costs `costs[i,j,m,t]`
/// and completes `act_per_user[m]` activities. The diagonal `costs[i,i,*,*]`
/// is never read: users cannot serve their own cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    n_cells: usize,
    n_types: usize,
    n_times: usize,
    act_per_user: Vec<i32>,
    activities: Vec<i32>,
    users_available: Tensor3<i32>,
    costs: Tensor4<f64>,
}

impl Problem {
    /// Builds a problem from raw parts, validating shapes and value ranges.
    pub fn from_parts(
        act_per_user: Vec<i32>,
        activities: Vec<i32>,
        users_available: Tensor3<i32>,
        costs: Tensor4<f64>,
    ) -> Result<Self, ProblemBuildError> {
        let n_types = act_per_user.len();
        let n_cells = activities.len();
        if n_cells == 0 || n_types == 0 {
            return Err(ProblemBuildError::EmptyDimension);
        }
        let [sc, sm, st] = users_available.shape();
        if sc != n_cells || sm != n_types {
            return Err(ProblemBuildError::ShapeMismatch);
        }
        let n_times = st;
        if n_times == 0 {
            return Err(ProblemBuildError::EmptyDimension);
        }
        if costs.shape() != [n_cells, n_cells, n_types, n_times] {
            return Err(ProblemBuildError::ShapeMismatch);
        }
        if let Some(&cap) = act_per_user.iter().find(|&&cap| cap <= 0) {
            return Err(ProblemBuildError::NonPositiveCapacity(cap));
        }
        if activities.iter().any(|&a| a < 0) {
            return Err(ProblemBuildError::NegativeDemand);
        }
        if users_available.iter().any(|&u| u < 0) {
            return Err(ProblemBuildError::NegativeSupply);
        }
        if costs.iter().any(|&c| !c.is_finite() || c < 0.0) {
            return Err(ProblemBuildError::InvalidCost);
        }
        Ok(Self {
            n_cells,
            n_types,
            n_times,
            act_per_user,
            activities,
            users_available,
            costs,
        })
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    #[inline]
    pub fn n_types(&self) -> usize {
        self.n_types
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.n_times
    }

    /// Activities one user of type `m` performs per engagement.
    #[inline]
    pub fn act_per_user(&self, m: usize) -> i32 {
        self.act_per_user[m]
    }

    #[inline]
    pub fn act_per_user_all(&self) -> &[i32] {
        &self.act_per_user
    }

    /// Activity demand at destination cell `j`.
    #[inline]
    pub fn activities(&self, j: usize) -> i32 {
        self.activities[j]
    }

    #[inline]
    pub fn activities_all(&self) -> &[i32] {
        &self.activities
    }

    #[inline]
    pub fn users_available(&self) -> &Tensor3<i32> {
        &self.users_available
    }

    #[inline]
    pub fn costs(&self) -> &Tensor4<f64> {
        &self.costs
    }

    /// Raw cost of moving one user of type `m` at period `t` from `i` to `j`.
    #[inline]
    pub fn cost(&self, i: usize, j: usize, m: usize, t: usize) -> f64 {
        self.costs[[i, j, m, t]]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProblemBuildError {
    EmptyDimension,
    ShapeMismatch,
    NonPositiveCapacity(i32),
    NegativeDemand,
    NegativeSupply,
    InvalidCost,
}

impl Display for ProblemBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemBuildError::EmptyDimension => {
                write!(f, "instance has an empty cell, type or period dimension")
            }
            ProblemBuildError::ShapeMismatch => {
                write!(f, "supply or cost tensor shape does not match dimensions")
            }
            ProblemBuildError::NonPositiveCapacity(cap) => {
                write!(f, "user type has non-positive activity capacity {cap}")
            }
            ProblemBuildError::NegativeDemand => write!(f, "negative activity demand"),
            ProblemBuildError::NegativeSupply => write!(f, "negative user supply"),
            ProblemBuildError::InvalidCost => write!(f, "cost is negative or not finite"),
        }
    }
}

impl std::error::Error for ProblemBuildError {}
