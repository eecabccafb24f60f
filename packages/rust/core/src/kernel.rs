//! Escape-time iteration for a single point of the plane.

use mandelbrot_shared::{Complex, ViewState};

pub use mandelbrot_shared::types::{map_to_plane, reference_extent};

/// Iteration limits for [`escape_time`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscapeParams {
    pub max_iterations: u32,
    escape_radius_sqr: f64,
}

impl EscapeParams {
    pub fn new(max_iterations: u32, escape_radius: f64) -> Self {
        Self {
            max_iterations,
            escape_radius_sqr: escape_radius * escape_radius,
        }
    }

    pub fn escape_radius(&self) -> f64 {
        self.escape_radius_sqr.sqrt()
    }
}

/// Number of iterations of `z = z² + c` (from `z = 0`) until `|z|` reaches
/// the escape radius, or `None` if it is still inside after
/// `max_iterations`. Every computed iterate is tested, the last one included.
#[inline]
pub fn escape_time(c: Complex, params: &EscapeParams) -> Option<u32> {
    let mut z = Complex::ZERO;

    for n in 1..=params.max_iterations {
        z = z * z + c;
        if z.norm_sqr() >= params.escape_radius_sqr {
            return Some(n);
        }
    }

    None
}

/// Complex coordinate of pixel `(x, y)` in a `width` x `height` view.
#[inline]
pub fn pixel_to_complex(x: u32, y: u32, view: &ViewState, width: u32, height: u32) -> Complex {
    view.pixel_to_complex(f64::from(x), f64::from(y), width, height)
}
