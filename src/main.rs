use clap::{App, Arg, ArgMatches};
use failure::Error;
use std::io::{self, Write};
use std::str::FromStr;

use mandelbench::bench::{run_suite, standard_cases, BenchCase, Strategy};

/// Given a string and a separator, returns the two values separated
/// by the separator.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const THREADS: &str = "threads";
const STRATEGY: &str = "strategy";
const SIZE: &str = "size";
const ITERATIONS: &str = "iterations";

fn app<'a>(max_threads: usize, default_threads: &'a str) -> App<'a, 'a> {
    App::new("mandelbench")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Mandelbrot escape-iteration benchmark")
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value(default_threads)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads for the banded strategy"),
        )
        .arg(
            Arg::with_name(STRATEGY)
                .required(false)
                .long(STRATEGY)
                .short("S")
                .takes_value(true)
                .possible_values(&["single", "banded", "both"])
                .default_value("both")
                .help("Which execution strategy to benchmark"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse image size"))
                .help("Replace the standard suite with a single WIDTHxHEIGHT case"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("500")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 200000",
                    )
                })
                .help("Iteration cap for the --size case"),
        )
}

fn cases(matches: &ArgMatches) -> Vec<BenchCase> {
    match matches.value_of(SIZE) {
        Some(size) => {
            let (width, height) = parse_pair(size, 'x').expect("Error parsing image size");
            let limit = usize::from_str(matches.value_of(ITERATIONS).unwrap())
                .expect("Could not parse iteration count.");
            vec![BenchCase {
                name: "Custom",
                width,
                height,
                limit,
            }]
        }
        None => standard_cases(),
    }
}

fn run<W: Write>(
    out: &mut W,
    cases: &[BenchCase],
    strategy: &str,
    threads: usize,
) -> Result<(), Error> {
    match strategy {
        "single" => run_suite(out, cases, Strategy::Single, threads),
        "banded" => run_suite(out, cases, Strategy::Banded, threads),
        _ => {
            run_suite(out, cases, Strategy::Single, threads)?;
            writeln!(out)?;
            run_suite(out, cases, Strategy::Banded, threads)
        }
    }
}

fn main() {
    let max_threads = num_cpus::get();
    let default_threads = max_threads.to_string();
    let matches = app(max_threads, &default_threads).get_matches();

    let threads =
        usize::from_str(matches.value_of(THREADS).unwrap()).expect("Could not parse thread count.");
    let cases = cases(&matches);
    let strategy = matches.value_of(STRATEGY).unwrap();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&mut out, &cases, strategy, threads) {
        eprintln!("Benchmark failure: {}", e);
        std::process::exit(1);
    }
}
