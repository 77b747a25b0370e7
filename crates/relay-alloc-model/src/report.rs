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
use crate::sol::{RunSummary, Solution};
use std::io::{self, Write};

/// Appends one KPI line for a solved instance:
/// `name;obj;elapsed_seconds;n_moved_type_0;…;n_moved_type_{M-1}`.
pub fn write_kpi<W: Write>(w: &mut W, instance_name: &str, summary: &RunSummary) -> io::Result<()> {
    write!(
        w,
        "{};{};{}",
        instance_name,
        summary.objective,
        summary.elapsed.as_secs_f64()
    )?;
    for moved in &summary.moved_per_type {
        write!(w, ";{moved}")?;
    }
    writeln!(w)
}

/// Writes the full assignment: a `C;T;M` header, then one line
/// `i;j;m;t;count` per non-zero entry, iterating m, then t, then i, then j.
pub fn write_solution<W: Write>(
    w: &mut W,
    problem: &Problem,
    solution: &Solution,
) -> io::Result<()> {
    writeln!(
        w,
        "{};{};{}",
        problem.n_cells(),
        problem.n_times(),
        problem.n_types()
    )?;
    let moves = solution.moves();
    for m in 0..problem.n_types() {
        for t in 0..problem.n_times() {
            for i in 0..problem.n_cells() {
                for j in 0..problem.n_cells() {
                    let count = moves[[i, j, m, t]];
                    if count > 0 {
                        writeln!(w, "{i};{j};{m};{t};{count}")?;
                    }
                }
            }
        }
    }
    Ok(())
}
