//! Pan and zoom state for the interactive viewer.
//!
//! The [`Navigator`] owns the current [`ViewState`] and the viewport size,
//! tracks which movement keys are held, and raises a dirty flag whenever the
//! picture needs to be rendered again.

use std::collections::HashSet;

use tracing::debug;

use mandelbrot_shared::{Complex, NavigationConfig, ViewState};

/// A movement direction (W/A/S/D in the viewer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Unit vector in screen space (y grows downwards).
    fn unit(self) -> (f64, f64) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Left => (-1.0, 0.0),
            Self::Down => (0.0, 1.0),
            Self::Right => (1.0, 0.0),
        }
    }
}

pub struct Navigator {
    view: ViewState,
    width: u32,
    height: u32,
    settings: NavigationConfig,
    held: HashSet<Direction>,
    dirty: bool,
}

impl Navigator {
    /// Start at the home view; dirty so the first frame gets rendered.
    pub fn new(width: u32, height: u32, settings: NavigationConfig) -> Self {
        Self {
            view: ViewState::home(width, height),
            width,
            height,
            settings,
            held: HashSet::new(),
            dirty: true,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
        self.dirty = true;
    }

    /// Complex coordinate at the centre of the viewport.
    pub fn center(&self) -> Complex {
        self.view.center(self.width, self.height)
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.contains(&direction)
    }

    pub fn press(&mut self, direction: Direction) {
        self.held.insert(direction);
    }

    pub fn release(&mut self, direction: Direction) {
        self.held.remove(&direction);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    /// Advance held-key movement by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        for direction in &self.held {
            let (ux, uy) = direction.unit();
            self.view.offset_x += ux * self.settings.pan_speed * dt;
            self.view.offset_y += uy * self.settings.pan_speed * dt;
            self.dirty = true;
        }
    }

    /// Pan one `pan_step` in `direction`.
    pub fn step(&mut self, direction: Direction) {
        let (ux, uy) = direction.unit();
        self.view.offset_x += ux * self.settings.pan_step;
        self.view.offset_y += uy * self.settings.pan_step;
        self.dirty = true;
    }

    /// Zoom in by `zoom_factor`, bringing the pixel at `pivot` to the centre.
    pub fn zoom_in(&mut self, pivot_x: f64, pivot_y: f64) {
        let new_mag = self.view.magnification * self.settings.zoom_factor;
        self.zoom_to(new_mag, pivot_x, pivot_y);
    }

    /// Zoom out by `zoom_factor`, never below `min_magnification`.
    pub fn zoom_out(&mut self, pivot_x: f64, pivot_y: f64) {
        let new_mag = (self.view.magnification / self.settings.zoom_factor)
            .max(self.settings.min_magnification);
        self.zoom_to(new_mag, pivot_x, pivot_y);
    }

    fn zoom_to(&mut self, new_mag: f64, pivot_x: f64, pivot_y: f64) {
        let old_mag = self.view.magnification;

        // The pivot in pixel space at the new magnification.
        let px = (self.view.offset_x + pivot_x) / old_mag * new_mag;
        let py = (self.view.offset_y + pivot_y) / old_mag * new_mag;

        self.view = ViewState {
            offset_x: px - f64::from(self.width) / 2.0,
            offset_y: py - f64::from(self.height) / 2.0,
            magnification: new_mag,
        };
        self.dirty = true;

        debug!(magnification = new_mag, "zoomed");
    }

    /// Back to the home view.
    pub fn reset(&mut self) {
        self.view = ViewState::home(self.width, self.height);
        self.dirty = true;
    }

    /// Track a new viewport size; the offset is kept.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.dirty = true;
        }
    }

    /// Force a re-render without changing the view (e.g. new palette).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Whether a re-render is due; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn navigator() -> Navigator {
        Navigator::new(500, 500, NavigationConfig::default())
    }

    #[test]
    fn starts_dirty_then_clean() {
        let mut nav = navigator();
        assert!(nav.take_dirty());
        assert!(!nav.take_dirty());
    }

    #[test]
    fn held_keys_move_by_velocity_times_dt() {
        let mut nav = navigator();
        nav.take_dirty();

        nav.press(Direction::Right);
        nav.press(Direction::Up);
        nav.tick(0.5);
        assert!(approx(nav.view().offset_x, 5.0));
        assert!(approx(nav.view().offset_y, -5.0));
        assert!(nav.take_dirty());

        nav.release(Direction::Right);
        nav.release(Direction::Up);
        nav.tick(1.0);
        assert!(!nav.take_dirty());
        assert!(approx(nav.view().offset_x, 5.0));
    }

    #[test]
    fn opposite_keys_cancel_out() {
        let mut nav = navigator();
        nav.press(Direction::Left);
        nav.press(Direction::Right);
        nav.tick(1.0);
        assert!(approx(nav.view().offset_x, 0.0));
    }

    #[test]
    fn step_pans_by_pan_step() {
        let mut nav = navigator();
        nav.step(Direction::Down);
        assert!(approx(nav.view().offset_y, 4.0));
        nav.step(Direction::Left);
        assert!(approx(nav.view().offset_x, -4.0));
    }

    #[test]
    fn zoom_in_at_centre_keeps_the_centre() {
        let mut nav = navigator();
        let before = nav.center();
        nav.zoom_in(250.0, 250.0);
        assert_eq!(nav.view().magnification, 2.0);
        let after = nav.center();
        assert!(approx(before.re, after.re) && approx(before.im, after.im));
    }

    #[test]
    fn zoom_in_brings_pivot_to_centre() {
        let mut nav = navigator();
        let target = nav.view().pixel_to_complex(100.0, 400.0, 500, 500);
        nav.zoom_in(100.0, 400.0);
        let center = nav.center();
        assert!(approx(center.re, target.re));
        assert!(approx(center.im, target.im));
    }

    #[test]
    fn zoom_out_is_clamped_to_min_magnification() {
        let mut nav = navigator();
        nav.zoom_in(250.0, 250.0);
        nav.zoom_in(250.0, 250.0);
        nav.zoom_out(250.0, 250.0);
        assert_eq!(nav.view().magnification, 2.0);
        nav.zoom_out(250.0, 250.0);
        nav.zoom_out(250.0, 250.0);
        assert_eq!(nav.view().magnification, 1.0);
    }

    #[test]
    fn reset_restores_home_view() {
        let mut nav = navigator();
        nav.zoom_in(10.0, 10.0);
        nav.step(Direction::Right);
        nav.take_dirty();
        nav.reset();
        assert_eq!(*nav.view(), ViewState::home(500, 500));
        assert!(nav.take_dirty());
    }

    #[test]
    fn resize_marks_dirty_only_on_change() {
        let mut nav = navigator();
        nav.take_dirty();
        nav.resize(500, 500);
        assert!(!nav.take_dirty());
        nav.resize(120, 80);
        assert_eq!(nav.size(), (120, 80));
        assert!(nav.take_dirty());
    }
}
