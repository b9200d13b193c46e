// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-iteration renderer.
//!
//! One kernel, two drivers.  The kernel maps a pixel into the complex
//! plane and counts recurrence steps until the orbit escapes.  The
//! single driver sweeps the whole image on the calling thread.  The
//! banded driver carves the image into contiguous row bands, renders
//! each band on its own worker thread into a private chunk, and
//! copies the chunks back into one buffer as the workers report in.
//! Both drivers run the same kernel, so their output is
//! byte-identical.

use crossbeam::channel;
use itertools::iproduct;
use num::Complex;

use crate::planes::{ImagePlane, Pixel};
use crate::RenderError;

/// Squared orbit magnitude beyond which a point has left the set.
const ESCAPE_MAGNITUDE_SQR: f64 = 4.0;

/// A contiguous half-open range of image rows assigned to one worker.
/// The bands of a render are pairwise disjoint and their union is
/// exactly the full row range.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Band(pub usize, pub usize);

impl Band {
    /// The number of rows the band covers.
    pub fn rows(&self) -> usize {
        self.1 - self.0
    }

    /// True for the surplus bands handed out when the workers
    /// outnumber the rows.  An empty band renders a zero-length chunk
    /// and merges as a no-op.
    pub fn is_empty(&self) -> bool {
        self.0 == self.1
    }
}

/// One worker's completed output: the band it was assigned, and the
/// rendered pixels in local row order.  Sent back to the aggregator
/// exactly once, consumed exactly once.
struct BandResult {
    band: Band,
    chunk: Vec<u8>,
}

/// Splits `height` rows into one band per worker.  Every worker gets
/// `ceil(height / workers)` rows except the last few: the final
/// non-empty band is clipped to the image edge, and any workers past
/// the edge get an empty band.  `workers` must be nonzero; callers
/// validate before partitioning.
pub fn bands(height: usize, workers: usize) -> Vec<Band> {
    let chunk = (height + workers - 1) / workers;
    (0..workers)
        .map(|i| {
            let start = (i * chunk).min(height);
            Band(start, (start + chunk).min(height))
        })
        .collect()
}

/// Takes an image plane and a limit (the number of iterations to
/// conduct per-point) and renders the Mandelbrot escape counts over
/// it, either on the calling thread or banded across workers.
#[derive(Debug)]
pub struct EscapeRenderer {
    plane: ImagePlane,
    limit: usize,
}

impl EscapeRenderer {
    /// Requires the width and height of the image and the per-pixel
    /// iteration cap.  All three must be nonzero; the constructor
    /// fails fast before anything is allocated.
    pub fn new(width: usize, height: usize, limit: usize) -> Result<Self, RenderError> {
        let plane = ImagePlane::new(width, height)?;
        if limit == 0 {
            return Err(RenderError::ZeroLimit);
        }
        Ok(EscapeRenderer { plane, limit })
    }

    /// The kernel.  Iterates `z = z*z + c` from zero, counting steps
    /// while the squared magnitude stays within the escape threshold
    /// and the count stays under the limit.  A pixel that never
    /// escapes encodes as 0; an escaping pixel encodes as its step
    /// count mod 255.  The wraparound aliases counts of 255, 510, ...
    /// with "inside the set" -- that is the palette contract, and
    /// downstream consumers depend on it staying exactly this way.
    pub fn escape(&self, pixel: Pixel) -> u8 {
        let c = self.plane.pixel_to_point(&pixel);
        let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
        let mut count = 0;
        while count < self.limit && z.norm_sqr() <= ESCAPE_MAGNITUDE_SQR {
            z = z * z + c;
            count += 1;
        }
        if count == self.limit {
            0
        } else {
            (count % 255) as u8
        }
    }

    /// Renders the rows of one band into a freshly allocated chunk,
    /// indexed by local row so a worker never addresses memory
    /// outside its own allocation.
    fn render_rows(&self, band: Band) -> Vec<u8> {
        let width = self.plane.0;
        let mut chunk = vec![0 as u8; band.rows() * width];
        for (row, column) in iproduct!(band.0..band.1, 0..width) {
            chunk[(row - band.0) * width + column] = self.escape(Pixel(column, row));
        }
        chunk
    }

    /// The main function for single-threaded rendering.  Sweeps every
    /// pixel in row-major order on the calling thread.  This is the
    /// correctness and performance baseline for the banded driver.
    pub fn render_single(&self) -> Result<Vec<u8>, RenderError> {
        Ok(self.render_rows(Band(0, self.plane.1)))
    }

    /// A multi-threaded version of the render function that takes a
    /// worker count.  Each worker renders its band into a private
    /// chunk and posts exactly one result; the aggregator drains the
    /// channel on this thread, routing each chunk to its band's
    /// offset.  Completion order is unconstrained -- the band carried
    /// with the result decides where it lands, not arrival order.
    pub fn render_banded(&self, workers: usize) -> Result<Vec<u8>, RenderError> {
        if workers == 0 {
            return Err(RenderError::NoWorkers);
        }
        let bands = bands(self.plane.1, workers);
        let width = self.plane.0;
        let mut buffer = vec![0 as u8; self.plane.len()];
        let delivered = crossbeam::scope(|spawner| {
            let (sender, receiver) = channel::bounded(bands.len());
            for band in &bands {
                let sender = sender.clone();
                let band = *band;
                spawner.spawn(move |_| {
                    let chunk = self.render_rows(band);
                    sender.send(BandResult { band, chunk }).unwrap();
                });
            }
            // The receiver loop ends once every sender is gone, so
            // the original has to go before the drain starts.
            drop(sender);
            let mut delivered = 0;
            for result in receiver {
                let offset = result.band.0 * width;
                buffer[offset..offset + result.chunk.len()].copy_from_slice(&result.chunk);
                delivered += 1;
            }
            delivered
        })
        .map_err(|_| RenderError::WorkerPanicked)?;
        if delivered != bands.len() {
            return Err(RenderError::MissingBands(bands.len(), delivered));
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn renderer(width: usize, height: usize, limit: usize) -> EscapeRenderer {
        EscapeRenderer::new(width, height, limit).unwrap()
    }

    #[test]
    fn constructor_rejects_zero_inputs() {
        assert_eq!(
            EscapeRenderer::new(0, 600, 500).unwrap_err(),
            RenderError::EmptyPlane(0, 600)
        );
        assert_eq!(
            EscapeRenderer::new(800, 0, 500).unwrap_err(),
            RenderError::EmptyPlane(800, 0)
        );
        assert_eq!(
            EscapeRenderer::new(800, 600, 0).unwrap_err(),
            RenderError::ZeroLimit
        );
    }

    #[test]
    fn escape_is_a_pure_function() {
        let r = renderer(64, 48, 100);
        let first = r.escape(Pixel(17, 9));
        assert_eq!(first, r.escape(Pixel(17, 9)));
    }

    #[test]
    fn corner_pixel_escapes_quickly() {
        // Pixel (0,0) maps to c = (-2.5, -1.0), which is already
        // outside the escape radius, so the orbit leaves within the
        // first few steps.
        let r = renderer(800, 600, 500);
        let count = r.escape(Pixel(0, 0));
        assert!(count >= 1 && count <= 10, "unexpected count {}", count);
    }

    #[test]
    fn origin_point_never_escapes() {
        // Width 7 puts pixel x=5 at the real origin, height 2 puts
        // y=1 at the imaginary origin.  c = 0 orbits forever, so the
        // kernel reports 0.
        let r = renderer(7, 2, 50);
        assert_eq!(r.escape(Pixel(5, 1)), 0);
    }

    #[test]
    fn bands_cover_every_row_exactly_once() {
        for &(height, workers) in &[(600, 8), (10, 3), (7, 7), (1, 1), (5, 4), (3, 8)] {
            let bands = bands(height, workers);
            assert_eq!(bands.len(), workers);
            assert_eq!(bands[0].0, 0);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].1, pair[1].0, "gap or overlap in {:?}", bands);
            }
            assert_eq!(bands[workers - 1].1, height);
            assert_eq!(bands.iter().map(Band::rows).sum::<usize>(), height);
        }
    }

    #[test]
    fn surplus_workers_get_empty_bands() {
        let bands = bands(3, 8);
        assert_eq!(bands.iter().filter(|b| !b.is_empty()).count(), 3);
        assert_eq!(bands[7], Band(3, 3));
        assert_eq!(bands[7].rows(), 0);
    }

    #[test]
    fn banded_output_matches_single() {
        let r = renderer(64, 48, 100);
        let single = r.render_single().unwrap();
        for workers in &[1, 2, 3, 8] {
            assert_eq!(r.render_banded(*workers).unwrap(), single);
        }
    }

    #[test]
    fn banded_tolerates_more_workers_than_rows() {
        let r = renderer(16, 3, 50);
        assert_eq!(r.render_banded(8).unwrap(), r.render_single().unwrap());
    }

    #[test]
    fn zero_workers_are_rejected() {
        let r = renderer(16, 16, 50);
        assert_eq!(r.render_banded(0).unwrap_err(), RenderError::NoWorkers);
    }

    #[test]
    fn random_planes_agree_across_strategies() {
        let mut rng = rand::thread_rng();
        for _ in 0..8 {
            let width = rng.gen_range(1, 40);
            let height = rng.gen_range(1, 40);
            let limit = rng.gen_range(1, 200);
            let workers = rng.gen_range(1, 12);
            let r = renderer(width, height, limit);
            assert_eq!(
                r.render_banded(workers).unwrap(),
                r.render_single().unwrap(),
                "strategies diverged at {}x{} limit {} workers {}",
                width,
                height,
                limit,
                workers
            );
        }
    }

    #[test]
    fn small_case_end_to_end() {
        let r = renderer(800, 600, 500);
        let buffer = r.render_single().unwrap();
        assert_eq!(buffer.len(), 480_000);

        // Recompute pixel (0,0) with the raw recurrence, independent
        // of the kernel.
        let (x0, y0) = (-2.5, -1.0);
        let (mut xi, mut yi) = (0.0_f64, 0.0_f64);
        let mut count = 0;
        while count < 500 && xi * xi + yi * yi <= 4.0 {
            let tmp = xi * xi - yi * yi + x0;
            yi = 2.0 * xi * yi + y0;
            xi = tmp;
            count += 1;
        }
        assert!(count < 500);
        assert_eq!(buffer[0], (count % 255) as u8);
        assert!(buffer[0] > 0);
    }
}
