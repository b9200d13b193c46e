#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot escape-iteration benchmark
//!
//! The Mandelbrot set takes a point on the complex plane and
//! repeatedly multiplies it by itself, measuring how quickly that
//! number goes to infinity.  This "velocity" is the number used to
//! render the image: the count of iterations before the orbit's
//! magnitude crosses the escape threshold, capped at a maximum.
//!
//! This crate computes that escape count over a pixel grid two ways
//! and exists to race the two against each other: a single-threaded
//! sweep of the whole image, and a banded sweep that cuts the image
//! into contiguous row ranges, hands each range to its own worker
//! thread, and reassembles the partial buffers into one image.  The
//! two strategies produce byte-identical output; only the wall-clock
//! time differs.

use failure::Fail;

pub mod bench;
pub mod planes;
pub mod renderer;

pub use crate::renderer::EscapeRenderer;

/// Everything that can go wrong while validating or rendering an
/// image.  Validation failures are reported before any work is
/// dispatched; worker failures are reported instead of a partial
/// buffer.
#[derive(Clone, Debug, Fail, PartialEq)]
pub enum RenderError {
    /// Width or height of zero leaves nothing to render.
    #[fail(display = "image dimensions must be nonzero, got {}x{}", _0, _1)]
    EmptyPlane(usize, usize),
    /// An iteration cap of zero would mark every pixel as inside the set.
    #[fail(display = "iteration limit must be nonzero")]
    ZeroLimit,
    /// The banded strategy needs at least one worker.
    #[fail(display = "worker count must be nonzero")]
    NoWorkers,
    /// A worker thread died before reporting its band.
    #[fail(display = "a render worker terminated abnormally")]
    WorkerPanicked,
    /// The aggregator received fewer band results than it dispatched.
    #[fail(display = "expected {} band results, received {}", _0, _1)]
    MissingBands(usize, usize),
}
