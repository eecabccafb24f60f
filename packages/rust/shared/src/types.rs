//! Core domain types: complex numbers, colours, view geometry, snapshots.

use std::ops::{Add, Mul};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for the snapshot manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Width of the complex-plane window shown at magnification 1.
const PLANE_SPAN: f64 = 4.0;

/// Left/top edge of the complex-plane window at magnification 1.
const PLANE_ORIGIN: f64 = -2.0;

// ---------------------------------------------------------------------------
// Complex
// ---------------------------------------------------------------------------

/// A complex number, treated like a 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Squared magnitude; avoids the square root in the escape test.
    #[inline]
    pub fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    pub fn abs(&self) -> f64 {
        self.norm_sqr().sqrt()
    }
}

impl Add for Complex {
    type Output = Complex;

    #[inline]
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    // (a + bi)(c + di) = (ac - bd) + (ad + bc)i
    #[inline]
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "{} - {}i", self.re, -self.im)
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}

// ---------------------------------------------------------------------------
// Rgb
// ---------------------------------------------------------------------------

/// An 8-bit sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

// ---------------------------------------------------------------------------
// View geometry
// ---------------------------------------------------------------------------

/// Map a translated pixel coordinate onto the complex plane.
///
/// At magnification 1 the range `0..extent` covers `[-2, 2]`.
#[inline]
pub fn map_to_plane(value: f64, extent: f64, magnification: f64) -> f64 {
    value / extent / magnification * PLANE_SPAN + PLANE_ORIGIN
}

/// The single scale used for both axes: the shorter side of the viewport.
#[inline]
pub fn reference_extent(width: u32, height: u32) -> f64 {
    f64::from(width.min(height).max(1))
}

/// What part of the plane is on screen: a pixel offset plus a magnification.
///
/// The offset is measured in pixels at the current magnification, so panning
/// by N pixels always moves the picture by N pixels on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub offset_x: f64,
    pub offset_y: f64,
    pub magnification: f64,
}

impl ViewState {
    /// Magnification 1 with `[-2, 2]` centred in a `width` x `height` viewport.
    pub fn home(width: u32, height: u32) -> Self {
        let extent = reference_extent(width, height);
        Self {
            offset_x: -(f64::from(width) - extent) / 2.0,
            offset_y: -(f64::from(height) - extent) / 2.0,
            magnification: 1.0,
        }
    }

    /// The view whose centre pixel lands on `c` at the given magnification.
    pub fn centered_on(c: Complex, magnification: f64, width: u32, height: u32) -> Self {
        let extent = reference_extent(width, height);
        let to_pixels = |v: f64| (v - PLANE_ORIGIN) / PLANE_SPAN * extent * magnification;
        Self {
            offset_x: to_pixels(c.re) - f64::from(width) / 2.0,
            offset_y: to_pixels(c.im) - f64::from(height) / 2.0,
            magnification,
        }
    }

    /// Complex coordinate under the pixel `(x, y)`.
    #[inline]
    pub fn pixel_to_complex(&self, x: f64, y: f64, width: u32, height: u32) -> Complex {
        let extent = reference_extent(width, height);
        Complex::new(
            map_to_plane(x + self.offset_x, extent, self.magnification),
            map_to_plane(y + self.offset_y, extent, self.magnification),
        )
    }

    /// Complex coordinate at the centre of the viewport.
    pub fn center(&self, width: u32, height: u32) -> Complex {
        self.pixel_to_complex(f64::from(width) / 2.0, f64::from(height) / 2.0, width, height)
    }
}

// ---------------------------------------------------------------------------
// SnapshotId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for snapshot identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub Uuid);

impl SnapshotId {
    /// Generate a new time-sortable snapshot identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SnapshotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// SnapshotManifest
// ---------------------------------------------------------------------------

/// The JSON sidecar written next to every exported image.
///
/// Holds everything needed to render the same picture again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Unique identifier for this snapshot.
    pub id: SnapshotId,
    /// Tool version that wrote the snapshot.
    pub tool_version: String,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub view: ViewState,
    pub max_iterations: u32,
    pub escape_radius: f64,
    /// Palette name (`hsv`, `grayscale`, `fire`).
    pub palette: String,
    /// Image file name, relative to the manifest.
    pub image_file: String,
    /// SHA-256 of the raw RGB pixel bytes, hex encoded.
    pub pixel_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn complex_multiplication() {
        // (1 + 2i)(3 + 4i) = -5 + 10i
        let z = Complex::new(1.0, 2.0) * Complex::new(3.0, 4.0);
        assert_eq!(z, Complex::new(-5.0, 10.0));
        assert!(approx(Complex::new(3.0, 4.0).abs(), 5.0));
        assert!(approx(Complex::new(3.0, 4.0).norm_sqr(), 25.0));
    }

    #[test]
    fn home_view_of_square_viewport_has_zero_offset() {
        let view = ViewState::home(500, 500);
        assert_eq!(view.offset_x, 0.0);
        assert_eq!(view.offset_y, 0.0);
        let top_left = view.pixel_to_complex(0.0, 0.0, 500, 500);
        assert!(approx(top_left.re, -2.0) && approx(top_left.im, -2.0));
        let center = view.center(500, 500);
        assert!(approx(center.re, 0.0) && approx(center.im, 0.0));
    }

    #[test]
    fn home_view_of_wide_viewport_is_centred_and_unstretched() {
        let view = ViewState::home(200, 100);
        let center = view.center(200, 100);
        assert!(approx(center.re, 0.0) && approx(center.im, 0.0));

        // One pixel is the same distance on both axes.
        let a = view.pixel_to_complex(10.0, 10.0, 200, 100);
        let b = view.pixel_to_complex(11.0, 11.0, 200, 100);
        assert!(approx(b.re - a.re, b.im - a.im));
    }

    #[test]
    fn centered_on_inverts_center() {
        let target = Complex::new(-0.743_643_9, 0.131_825_9);
        let view = ViewState::centered_on(target, 64.0, 320, 240);
        let center = view.center(320, 240);
        assert!(approx(center.re, target.re));
        assert!(approx(center.im, target.im));
        assert_eq!(view.magnification, 64.0);
    }

    #[test]
    fn snapshot_id_roundtrip() {
        let id = SnapshotId::new();
        let parsed: SnapshotId = id.to_string().parse().expect("parse SnapshotId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn manifest_serialization() {
        let manifest = SnapshotManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: SnapshotId::new(),
            tool_version: "0.1.0".into(),
            created_at: Utc::now(),
            width: 500,
            height: 500,
            view: ViewState::home(500, 500),
            max_iterations: 100,
            escape_radius: 2.0,
            palette: "hsv".into(),
            image_file: "snapshot.ppm".into(),
            pixel_hash: "00".into(),
        };

        let json = serde_json::to_string_pretty(&manifest).expect("serialize");
        let parsed: SnapshotManifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(parsed.view, manifest.view);
        assert_eq!(parsed.palette, "hsv");
    }
}
