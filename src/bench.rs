//! The benchmark harness.
//!
//! The harness is a thin external caller of the renderer: it owns the
//! workload list, times each render, and prints the comparison table.
//! Cases and the output sink are passed in explicitly so the core
//! stays free of process-wide state and the table can be captured in
//! tests.

use std::io::Write;
use std::time::{Duration, Instant};

use failure::Error;

use crate::renderer::EscapeRenderer;
use crate::RenderError;

/// How many leading output bytes a report keeps for the manual
/// sanity check printed under each table row.
const SAMPLE_LEN: usize = 10;

/// One benchmark workload: a label plus the render inputs.
#[derive(Copy, Clone, Debug)]
pub struct BenchCase {
    /// Label printed in the report table.
    pub name: &'static str,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Per-pixel iteration cap.
    pub limit: usize,
}

/// The standard workloads, small through extra large.  Expect the
/// larger ones to run for minutes on the single strategy.
pub fn standard_cases() -> Vec<BenchCase> {
    vec![
        BenchCase {
            name: "Small",
            width: 800,
            height: 600,
            limit: 500,
        },
        BenchCase {
            name: "Medium",
            width: 1920,
            height: 1080,
            limit: 1000,
        },
        BenchCase {
            name: "Large",
            width: 3840,
            height: 2160,
            limit: 1500,
        },
        BenchCase {
            name: "Extra Large",
            width: 7680,
            height: 4320,
            limit: 2000,
        },
    ]
}

/// Which driver a benchmark run exercises.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Strategy {
    /// Single-threaded row-major sweep.
    Single,
    /// Row bands rendered by a pool of worker threads.
    Banded,
}

impl Strategy {
    /// Human label used in the report header.
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Single => "sequential sweep",
            Strategy::Banded => "banded workers",
        }
    }
}

/// Timing and sanity data from one rendered case.
#[derive(Clone, Debug)]
pub struct CaseReport {
    /// Wall-clock time of the whole render call.  For the banded
    /// strategy this includes worker startup and teardown; exposing
    /// that cost is the point of the benchmark.
    pub elapsed: Duration,
    /// Total pixels rendered, which is also the buffer length.
    pub pixels: usize,
    /// The first few output bytes, for eyeballing against a known run.
    pub sample: Vec<u8>,
}

impl CaseReport {
    /// Throughput in pixels per millisecond.
    pub fn pixels_per_ms(&self) -> f64 {
        self.pixels as f64 / (self.elapsed.as_secs_f64() * 1000.0)
    }
}

/// Runs one case under the chosen strategy and times the call.
pub fn run_case(
    case: &BenchCase,
    strategy: Strategy,
    workers: usize,
) -> Result<CaseReport, RenderError> {
    let renderer = EscapeRenderer::new(case.width, case.height, case.limit)?;
    let start = Instant::now();
    let buffer = match strategy {
        Strategy::Single => renderer.render_single()?,
        Strategy::Banded => renderer.render_banded(workers)?,
    };
    let elapsed = start.elapsed();
    Ok(CaseReport {
        elapsed,
        pixels: buffer.len(),
        sample: buffer.iter().take(SAMPLE_LEN).cloned().collect(),
    })
}

/// Runs every case under one strategy and writes the timing table:
/// name, resolution, iteration cap, duration, and throughput, with a
/// sample of the leading output bytes under each row.
pub fn run_suite<W: Write>(
    out: &mut W,
    cases: &[BenchCase],
    strategy: Strategy,
    workers: usize,
) -> Result<(), Error> {
    writeln!(
        out,
        "Mandelbrot escape-iteration benchmark ({})",
        strategy.label()
    )?;
    writeln!(
        out,
        "{:<15} {:<15} {:<15} {:<15} {:<15}",
        "Size", "Resolution", "Iterations", "Time (ms)", "Pixels/ms"
    )?;
    writeln!(out, "{}", "-".repeat(75))?;
    for case in cases {
        let report = run_case(case, strategy, workers)?;
        write!(out, "{:<15} ", case.name)?;
        write!(out, "{:<15} ", format!("{}x{}", case.width, case.height))?;
        write!(out, "{:<15} ", case.limit)?;
        write!(out, "{:<15.2} ", report.elapsed.as_secs_f64() * 1000.0)?;
        writeln!(out, "{:<15.0}", report.pixels_per_ms())?;
        writeln!(out, "First few pixels: {:?}\n", report.sample)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_is_pixels_over_milliseconds() {
        let report = CaseReport {
            elapsed: Duration::from_millis(200),
            pixels: 1000,
            sample: vec![],
        };
        assert!((report.pixels_per_ms() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn report_carries_length_and_sample() {
        let case = BenchCase {
            name: "Tiny",
            width: 32,
            height: 24,
            limit: 50,
        };
        let report = run_case(&case, Strategy::Single, 1).unwrap();
        assert_eq!(report.pixels, 32 * 24);
        assert_eq!(report.sample.len(), 10);
    }

    #[test]
    fn strategies_report_identical_samples() {
        let case = BenchCase {
            name: "Tiny",
            width: 64,
            height: 48,
            limit: 100,
        };
        let single = run_case(&case, Strategy::Single, 1).unwrap();
        let banded = run_case(&case, Strategy::Banded, 3).unwrap();
        assert_eq!(single.sample, banded.sample);
        assert_eq!(single.pixels, banded.pixels);
    }

    #[test]
    fn suite_prints_every_case() {
        let cases = [BenchCase {
            name: "Tiny",
            width: 32,
            height: 24,
            limit: 50,
        }];
        let mut out = Vec::new();
        run_suite(&mut out, &cases, Strategy::Banded, 4).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("banded workers"));
        assert!(text.contains("Tiny"));
        assert!(text.contains("32x24"));
        assert!(text.contains("First few pixels:"));
    }

    #[test]
    fn invalid_case_surfaces_the_render_error() {
        let case = BenchCase {
            name: "Broken",
            width: 0,
            height: 24,
            limit: 50,
        };
        assert!(run_case(&case, Strategy::Single, 1).is_err());
    }
}
