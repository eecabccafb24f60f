//! Rendering and navigation logic for the Mandelbrot viewer.
//!
//! This crate holds the escape-time kernel, colour palettes, the parallel
//! frame renderer, the pan/zoom navigator, and snapshot export.

pub mod coloring;
pub mod export;
pub mod kernel;
pub mod navigation;
pub mod render;
