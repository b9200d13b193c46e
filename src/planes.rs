//! Contains the ImagePlane struct, which describes a rectangle on the
//! integral plane with an origin at 0,0 and its mapping onto the
//! fixed region of the complex plane where the classic Mandelbrot
//! lives: real axis [-2.5, 1.0], imaginary axis [-1.0, 1.0].
use num::Complex;

use crate::RenderError;

// The fixed viewport.  A pixel at x maps to RE_MIN + (x/width) *
// RE_SPAN on the real axis, and likewise on the imaginary axis.
const RE_MIN: f64 = -2.5;
const RE_SPAN: f64 = 3.5;
const IM_MIN: f64 = -1.0;
const IM_SPAN: f64 = 2.0;

/// Describes the x, y of a point in the image.  All values are
/// assumed to be non-negative integers with the origin at the
/// upper-left corner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Describes the width and height of an integral plane that is
/// assumed to start at 0,0.  Construction rejects empty planes, so a
/// validated ImagePlane always has at least one pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImagePlane(pub usize, pub usize);

impl ImagePlane {
    /// Constructor.  Takes the width and height of the image and
    /// fails fast if either is zero, before any buffer is allocated.
    pub fn new(width: usize, height: usize) -> Result<ImagePlane, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyPlane(width, height));
        }
        Ok(ImagePlane(width, height))
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.0 * self.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.0 == 0 || self.1 == 0
    }

    /// Given a pixel on the integral cartesian plane, map that to the
    /// corresponding point on the complex cartesian plane.  The
    /// viewport is fixed, so the only inputs are the pixel and the
    /// image dimensions.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            (pixel.0 as f64 / self.0 as f64) * RE_SPAN + RE_MIN,
            (pixel.1 as f64 / self.1 as f64) * IM_SPAN + IM_MIN,
        )
    }

    /// The linear offset of a pixel from the root of a row-major
    /// image buffer.
    pub fn offset(&self, pixel: &Pixel) -> usize {
        pixel.1 * self.0 + pixel.0
    }
}
