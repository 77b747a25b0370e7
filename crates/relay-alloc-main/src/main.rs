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

use relay_alloc_model::prelude::*;
use relay_alloc_solver::config::SolverConfig;
use relay_alloc_solver::engine::SearchEngine;
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const MIN_FILES: usize = 2;
const MAX_FILES: usize = 3;

// Callers script against these: -1 bad usage, -2 input, -3 output.
const EXIT_WRONG_USAGE: u8 = (-1i8) as u8;
const EXIT_INPUT_FAILURE: u8 = (-2i8) as u8;
const EXIT_OUTPUT_FAILURE: u8 = (-3i8) as u8;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

struct CliArgs {
    files: Vec<String>,
    test: bool,
    seed: Option<u64>,
}

enum CliAction {
    Run(CliArgs),
    Exit(u8),
}

fn parse_args(args: &[String]) -> CliAction {
    let mut files = Vec::new();
    let mut test = false;
    let mut seed = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help(&args[0]);
                return CliAction::Exit(0);
            }
            "--version" => {
                print_version();
                return CliAction::Exit(0);
            }
            "--test" => test = true,
            "--seed" => match iter.next().and_then(|s| s.parse().ok()) {
                Some(value) => seed = Some(value),
                None => {
                    print_help(&args[0]);
                    return CliAction::Exit(EXIT_WRONG_USAGE);
                }
            },
            _ => files.push(arg.clone()),
        }
    }

    if files.len() < MIN_FILES || files.len() > MAX_FILES {
        print_help(&args[0]);
        return CliAction::Exit(EXIT_WRONG_USAGE);
    }
    CliAction::Run(CliArgs { files, test, seed })
}

fn main() -> ExitCode {
    enable_tracing();

    let args: Vec<String> = std::env::args().collect();
    let cli = match parse_args(&args) {
        CliAction::Run(cli) => cli,
        CliAction::Exit(code) => return ExitCode::from(code),
    };

    let input_path = &cli.files[0];
    let input_file = match File::open(input_path) {
        Ok(file) => file,
        Err(_) => {
            eprintln!("Impossible to open input file {input_path}");
            return ExitCode::from(EXIT_INPUT_FAILURE);
        }
    };
    let problem = match parse_instance(input_file) {
        Ok(problem) => problem,
        Err(e) => {
            eprintln!("Failed to parse input file {input_path}: {e}");
            return ExitCode::from(EXIT_INPUT_FAILURE);
        }
    };

    let output_path = &cli.files[1];
    let output_file = match OpenOptions::new().append(true).create(true).open(output_path) {
        Ok(file) => file,
        Err(_) => {
            eprintln!("Impossible to open output file {output_path}");
            return ExitCode::from(EXIT_OUTPUT_FAILURE);
        }
    };

    let mut config = SolverConfig::default();
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    let report = SearchEngine::new(config).solve(&problem);

    if let Some(summary) = report.summary() {
        let mut writer = BufWriter::new(output_file);
        if let Err(e) = write_kpi(&mut writer, &instance_name(input_path), &summary) {
            eprintln!("Failed to write summary to {output_path}: {e}");
            return ExitCode::from(EXIT_OUTPUT_FAILURE);
        }
    }

    if let Some(solution_path) = cli.files.get(2) {
        match File::create(solution_path) {
            Ok(file) => {
                if let Some(solution) = report.best() {
                    let mut writer = BufWriter::new(file);
                    if let Err(e) = write_solution(&mut writer, &problem, solution) {
                        eprintln!("Failed to write solution to {solution_path}: {e}");
                    }
                }
            }
            Err(_) => eprintln!("Impossible to open solution file {solution_path}"),
        }
    }

    if cli.test {
        println!("{}", check(&problem, report.best()));
    }

    ExitCode::SUCCESS
}

fn instance_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_owned())
}

fn print_help(exe_name: &str) {
    eprintln!("Usage: {exe_name} [Options] InputFile OutputFile [SolutionFile]");
    eprintln!(" * InputFile: path of the input file describing the problem instance");
    eprintln!(" * OutputFile: path of the file to which append a summary of the solution");
    eprintln!(" * SolutionFile: path of the file where store the complete solution (optional)");
    eprintln!("Options:");
    eprintln!(" * --test: run a feasibility check on the result and print the verdict");
    eprintln!(" * --seed <n>: override the master random seed (runs are reproducible by default)");
    eprintln!(" * --help: shows this help");
    eprintln!(" * --version: shows information about this program");
}

fn print_version() {
    eprintln!("relay-alloc {}", env!("CARGO_PKG_VERSION"));
}
