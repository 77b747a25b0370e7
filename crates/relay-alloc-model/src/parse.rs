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

use crate::problem::{Problem, ProblemBuildError};
use relay_alloc_core::tensor::{Tensor3, Tensor4};
use std::fmt::Display;
use std::io::{self, Read};

/// Parses a textual problem instance.
///
/// The format is a flat stream of whitespace-delimited integers:
///
/// 1. `C T M` — cells, time periods, user types.
/// 2. `M` activity capacities, one per user type.
/// 3. For each `(m, t)`: two header integers (discarded), then `C·C` costs
///    in row-major `(i, j)` order.
/// 4. `C` activity demands.
/// 5. For each `(m, t)`: two header integers (discarded), then `C` supplies.
///
/// Costs are decimal integers in the file and stored as `f64`.
pub fn parse_instance<R: Read>(mut reader: R) -> Result<Problem, ParseError> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(ParseError::Io)?;
    let mut tokens = Tokens::new(&text);

    let n_cells = tokens.next_usize("cell count")?;
    let n_times = tokens.next_usize("period count")?;
    let n_types = tokens.next_usize("type count")?;

    let mut act_per_user = Vec::with_capacity(n_types);
    for _ in 0..n_types {
        act_per_user.push(tokens.next_i32("activity capacity")?);
    }

    let mut costs = Tensor4::zeros([n_cells, n_cells, n_types, n_times]);
    for m in 0..n_types {
        for t in 0..n_times {
            tokens.next_i32("cost block header")?;
            tokens.next_i32("cost block header")?;
            for i in 0..n_cells {
                for j in 0..n_cells {
                    costs[[i, j, m, t]] = tokens.next_i32("cost")? as f64;
                }
            }
        }
    }

    let mut activities = Vec::with_capacity(n_cells);
    for _ in 0..n_cells {
        activities.push(tokens.next_i32("activity demand")?);
    }

    let mut users_available = Tensor3::zeros([n_cells, n_types, n_times]);
    for m in 0..n_types {
        for t in 0..n_times {
            tokens.next_i32("supply block header")?;
            tokens.next_i32("supply block header")?;
            for i in 0..n_cells {
                users_available[[i, m, t]] = tokens.next_i32("user supply")?;
            }
        }
    }

    Problem::from_parts(act_per_user, activities, users_available, costs)
        .map_err(ParseError::Build)
}

struct Tokens<'a> {
    inner: std::str::SplitAsciiWhitespace<'a>,
    consumed: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_ascii_whitespace(),
            consumed: 0,
        }
    }

    fn next_token(&mut self, expected: &'static str) -> Result<&'a str, ParseError> {
        match self.inner.next() {
            Some(token) => {
                self.consumed += 1;
                Ok(token)
            }
            None => Err(ParseError::UnexpectedEof { expected }),
        }
    }

    fn next_i32(&mut self, expected: &'static str) -> Result<i32, ParseError> {
        let token = self.next_token(expected)?;
        token.parse().map_err(|_| ParseError::InvalidToken {
            token: token.to_owned(),
            position: self.consumed,
        })
    }

    fn next_usize(&mut self, expected: &'static str) -> Result<usize, ParseError> {
        let token = self.next_token(expected)?;
        token.parse().map_err(|_| ParseError::InvalidToken {
            token: token.to_owned(),
            position: self.consumed,
        })
    }
}

#[derive(Debug)]
pub enum ParseError {
    Io(io::Error),
    UnexpectedEof { expected: &'static str },
    InvalidToken { token: String, position: usize },
    Build(ProblemBuildError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(e) => write!(f, "failed to read instance: {e}"),
            ParseError::UnexpectedEof { expected } => {
                write!(f, "instance ended early, expected {expected}")
            }
            ParseError::InvalidToken { token, position } => {
                write!(f, "invalid integer {token:?} at token {position}")
            }
            ParseError::Build(e) => write!(f, "invalid instance: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            ParseError::Build(e) => Some(e),
            _ => None,
        }
    }
}
