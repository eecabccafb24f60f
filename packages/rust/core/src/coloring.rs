//! Palettes mapping escape counts to colours.

use std::fmt;
use std::str::FromStr;

use ::palette::{FromColor, Hsv, Srgb};
use mandelbrot_shared::{Rgb, ViewerError};

/// Colouring scheme for escaped points. Points inside the set are black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// Full hue sweep, saturation and value at 1.
    #[default]
    Hsv,
    Grayscale,
    /// Black through red and yellow to white.
    Fire,
}

impl Palette {
    pub const ALL: [Palette; 3] = [Palette::Hsv, Palette::Grayscale, Palette::Fire];

    /// Colour for a point that escaped after `iterations` of `max_iterations`,
    /// or black when it did not escape.
    pub fn color(self, iterations: Option<u32>, max_iterations: u32) -> Rgb {
        let Some(n) = iterations else {
            return Rgb::BLACK;
        };
        let t = (f64::from(n) / f64::from(max_iterations.max(1))).clamp(0.0, 1.0);

        match self {
            Self::Hsv => {
                let hsv = Hsv::new(t as f32 * 360.0, 1.0, 1.0);
                let srgb = Srgb::from_color(hsv).into_format::<u8>();
                Rgb::new(srgb.red, srgb.green, srgb.blue)
            }
            Self::Grayscale => {
                let v = channel(t.sqrt());
                Rgb::new(v, v, v)
            }
            Self::Fire => {
                let t = t * 3.0;
                Rgb::new(channel(t), channel(t - 1.0), channel(t - 2.0))
            }
        }
    }

    /// The palette after this one, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Hsv => Self::Grayscale,
            Self::Grayscale => Self::Fire,
            Self::Fire => Self::Hsv,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Hsv => "hsv",
            Self::Grayscale => "grayscale",
            Self::Fire => "fire",
        }
    }
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ViewerError::validation(format!("unknown palette '{s}'")))
    }
}
