//! Parallel frame renderer.
//!
//! A frame is split into contiguous bands of rows, one per worker thread.
//! Every band writes into its own slice of the output buffer, so workers
//! never share mutable state and the result does not depend on the thread
//! count.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use mandelbrot_shared::{AppConfig, Result, Rgb, SnapshotManifest, ViewState, ViewerError};

use crate::coloring::Palette;
use crate::kernel::{EscapeParams, escape_time, pixel_to_complex};

/// Everything besides the view that determines a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub escape_radius: f64,
    pub palette: Palette,
    /// Worker threads; clamped to `1..=height` at render time.
    pub threads: usize,
}

impl RenderParams {
    /// Build params from the `[view]` and `[render]` config sections.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            width: config.view.width,
            height: config.view.height,
            max_iterations: config.view.max_iterations,
            escape_radius: config.view.escape_radius,
            palette: config.view.palette.parse()?,
            threads: config.resolved_threads(),
        })
    }

    /// Rebuild the params a snapshot was rendered with.
    pub fn from_manifest(manifest: &SnapshotManifest, threads: usize) -> Result<Self> {
        Ok(Self {
            width: manifest.width,
            height: manifest.height,
            max_iterations: manifest.max_iterations,
            escape_radius: manifest.escape_radius,
            palette: manifest.palette.parse()?,
            threads,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ViewerError::validation(format!(
                "frame size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_iterations == 0 {
            return Err(ViewerError::validation("max_iterations must be at least 1"));
        }
        if !(self.escape_radius.is_finite() && self.escape_radius > 0.0) {
            return Err(ViewerError::validation("escape_radius must be a positive number"));
        }
        Ok(())
    }

    fn escape(&self) -> EscapeParams {
        EscapeParams::new(self.max_iterations, self.escape_radius)
    }
}

/// A rendered image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgb>,
}

impl RenderedFrame {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Packed `RGBRGB...` bytes.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
    }

    /// SHA-256 of the packed RGB bytes, hex encoded.
    pub fn pixel_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_rgb_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Progress callback for reporting render status.
pub trait RenderProgress: Send + Sync {
    /// Called from a worker thread each time a band completes.
    fn band_done(&self, done: usize, total: usize);
    /// Called once the frame is assembled.
    fn finished(&self, frame: &RenderedFrame);
}

/// No-op progress reporter for interactive/test usage.
pub struct SilentProgress;

impl RenderProgress for SilentProgress {
    fn band_done(&self, _done: usize, _total: usize) {}
    fn finished(&self, _frame: &RenderedFrame) {}
}

/// Render `view` into a new frame using `params.threads` workers.
#[instrument(skip_all, fields(
    width = params.width,
    height = params.height,
    magnification = view.magnification,
))]
pub fn render(
    view: &ViewState,
    params: &RenderParams,
    progress: &dyn RenderProgress,
) -> Result<RenderedFrame> {
    params.validate()?;
    let start = Instant::now();

    let width = params.width as usize;
    let height = params.height as usize;
    let threads = params.threads.clamp(1, height);
    let rows_per_band = height.div_ceil(threads);
    let total_bands = height.div_ceil(rows_per_band);
    let escape = params.escape();

    let mut pixels = vec![Rgb::BLACK; width * height];
    let done = AtomicUsize::new(0);

    let failed = std::thread::scope(|scope| {
        let handles: Vec<_> = pixels
            .chunks_mut(rows_per_band * width)
            .enumerate()
            .map(|(band, slice)| {
                let done = &done;
                scope.spawn(move || {
                    render_band(slice, band * rows_per_band, view, params, &escape);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    progress.band_done(finished, total_bands);
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join())
            .filter(|joined| joined.is_err())
            .count()
    });

    if failed > 0 {
        return Err(ViewerError::Render(format!(
            "{failed} of {total_bands} render workers panicked"
        )));
    }

    let frame = RenderedFrame {
        width: params.width,
        height: params.height,
        pixels,
    };

    debug!(
        bands = total_bands,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "frame rendered"
    );
    progress.finished(&frame);

    Ok(frame)
}

/// Fill `slice` (whole rows starting at `first_row`) with colours.
fn render_band(
    slice: &mut [Rgb],
    first_row: usize,
    view: &ViewState,
    params: &RenderParams,
    escape: &EscapeParams,
) {
    for (i, row) in slice.chunks_mut(params.width as usize).enumerate() {
        let y = (first_row + i) as u32;
        for (x, px) in row.iter_mut().enumerate() {
            let c = pixel_to_complex(x as u32, y, view, params.width, params.height);
            *px = params
                .palette
                .color(escape_time(c, escape), params.max_iterations);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn params(width: u32, height: u32, threads: usize) -> RenderParams {
        RenderParams {
            width,
            height,
            max_iterations: 50,
            escape_radius: 2.0,
            palette: Palette::Hsv,
            threads,
        }
    }

    #[derive(Default)]
    struct Recorder {
        bands: Mutex<Vec<(usize, usize)>>,
        finished: AtomicUsize,
    }

    impl RenderProgress for Recorder {
        fn band_done(&self, done: usize, total: usize) {
            self.bands.lock().expect("lock").push((done, total));
        }
        fn finished(&self, _frame: &RenderedFrame) {
            self.finished.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn output_is_independent_of_thread_count() {
        let view = ViewState::home(64, 37);
        let single = render(&view, &params(64, 37, 1), &SilentProgress).expect("render");
        let many = render(&view, &params(64, 37, 10), &SilentProgress).expect("render");
        assert_eq!(single, many);
        assert_eq!(single.pixel_hash(), many.pixel_hash());
    }

    #[test]
    fn every_row_is_rendered_when_height_is_not_divisible() {
        // 7 rows over 3 threads: bands of 3, 3, 1.
        let view = ViewState::home(8, 7);
        let frame = render(&view, &params(8, 7, 3), &SilentProgress).expect("render");
        assert_eq!(frame.pixels.len(), 56);

        // The bottom-left corner is far outside the set and escapes at once.
        let corner = frame.pixel(0, 6).expect("pixel");
        assert_ne!(corner, Rgb::BLACK);
    }

    #[test]
    fn centre_of_home_view_is_inside_the_set() {
        let view = ViewState::home(41, 41);
        let frame = render(&view, &params(41, 41, 4), &SilentProgress).expect("render");
        // Pixel 20 maps to -0.0488, well inside the main cardioid.
        assert_eq!(frame.pixel(20, 20), Some(Rgb::BLACK));
        assert_eq!(frame.pixel(41, 0), None);
    }

    #[test]
    fn progress_reports_each_band_once() {
        let view = ViewState::home(10, 10);
        let recorder = Recorder::default();
        render(&view, &params(10, 10, 4), &recorder).expect("render");

        let mut bands = recorder.bands.lock().expect("lock").clone();
        bands.sort_unstable();
        // 10 rows over 4 threads: bands of 3, 3, 3, 1.
        assert_eq!(bands, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
        assert_eq!(recorder.finished.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn more_threads_than_rows_is_clamped() {
        let view = ViewState::home(5, 2);
        let frame = render(&view, &params(5, 2, 64), &SilentProgress).expect("render");
        assert_eq!(frame.pixels.len(), 10);
    }

    #[test]
    fn zero_sized_frames_are_rejected() {
        let view = ViewState::home(1, 1);
        let err = render(&view, &params(0, 10, 2), &SilentProgress).unwrap_err();
        assert!(err.to_string().contains("non-zero"));
    }

    #[test]
    fn rgb_bytes_are_packed_row_major() {
        let frame = RenderedFrame {
            width: 2,
            height: 1,
            pixels: vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)],
        };
        assert_eq!(frame.to_rgb_bytes(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.pixel_hash().len(), 64);
    }

    #[test]
    fn params_from_default_config() {
        let p = RenderParams::from_config(&AppConfig::default()).expect("params");
        assert_eq!((p.width, p.height), (500, 500));
        assert_eq!(p.palette, Palette::Hsv);
        assert_eq!(p.threads, 10);
    }
}
