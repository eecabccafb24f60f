//! Application configuration for the Mandelbrot viewer.
//!
//! User config lives at `~/.mandelbrot-viewer/mandelbrot-viewer.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "mandelbrot-viewer.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".mandelbrot-viewer";

/// Palette names accepted in `[view] palette`.
pub const KNOWN_PALETTES: [&str; 3] = ["hsv", "grayscale", "fire"];

// ---------------------------------------------------------------------------
// Config structs (matching mandelbrot-viewer.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Image geometry and iteration settings.
    #[serde(default)]
    pub view: ViewConfig,

    /// Pan and zoom behaviour of the interactive viewer.
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Worker threads and snapshot output.
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[view]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Image width in pixels (CLI renders).
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels (CLI renders).
    #[serde(default = "default_height")]
    pub height: u32,

    /// Iterations after which a point counts as inside the set.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Escape radius for `|z|`.
    #[serde(default = "default_escape_radius")]
    pub escape_radius: f64,

    /// Colouring scheme.
    #[serde(default = "default_palette")]
    pub palette: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_iterations: default_max_iterations(),
            escape_radius: default_escape_radius(),
            palette: default_palette(),
        }
    }
}

fn default_width() -> u32 {
    500
}
fn default_height() -> u32 {
    500
}
fn default_max_iterations() -> u32 {
    100
}
fn default_escape_radius() -> f64 {
    2.0
}
fn default_palette() -> String {
    "hsv".into()
}

/// `[navigation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Pixels per second while a movement key is held.
    #[serde(default = "default_pan_speed")]
    pub pan_speed: f64,

    /// Pixels per key press when the terminal cannot report key releases.
    #[serde(default = "default_pan_step")]
    pub pan_step: f64,

    /// Magnification multiplier per zoom step.
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f64,

    /// Zooming out stops here.
    #[serde(default = "default_min_magnification")]
    pub min_magnification: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            pan_speed: default_pan_speed(),
            pan_step: default_pan_step(),
            zoom_factor: default_zoom_factor(),
            min_magnification: default_min_magnification(),
        }
    }
}

fn default_pan_speed() -> f64 {
    10.0
}
fn default_pan_step() -> f64 {
    4.0
}
fn default_zoom_factor() -> f64 {
    2.0
}
fn default_min_magnification() -> f64 {
    1.0
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Worker threads per frame; `0` uses the available parallelism.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Where the viewer saves snapshots.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

fn default_threads() -> usize {
    10
}
fn default_snapshot_dir() -> String {
    "~/mandelbrot-snapshots".into()
}

impl AppConfig {
    /// Reject values the renderer or navigator cannot work with.
    pub fn validate(&self) -> Result<()> {
        let view = &self.view;
        if view.width == 0 || view.height == 0 {
            return Err(ViewerError::config("view width and height must be non-zero"));
        }
        if view.max_iterations == 0 {
            return Err(ViewerError::config("max_iterations must be at least 1"));
        }
        if !(view.escape_radius.is_finite() && view.escape_radius > 0.0) {
            return Err(ViewerError::config("escape_radius must be a positive number"));
        }
        if !KNOWN_PALETTES.contains(&view.palette.as_str()) {
            return Err(ViewerError::config(format!(
                "unknown palette '{}': expected one of {}",
                view.palette,
                KNOWN_PALETTES.join(", ")
            )));
        }

        let nav = &self.navigation;
        if !(nav.zoom_factor.is_finite() && nav.zoom_factor > 1.0) {
            return Err(ViewerError::config("zoom_factor must be greater than 1"));
        }
        if !(nav.min_magnification.is_finite() && nav.min_magnification > 0.0) {
            return Err(ViewerError::config("min_magnification must be positive"));
        }
        if !(nav.pan_speed >= 0.0 && nav.pan_step >= 0.0) {
            return Err(ViewerError::config("pan_speed and pan_step must not be negative"));
        }

        Ok(())
    }

    /// Worker count with `0` resolved to the machine's parallelism.
    pub fn resolved_threads(&self) -> usize {
        match self.render.threads {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.mandelbrot-viewer/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ViewerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.mandelbrot-viewer/mandelbrot-viewer.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ViewerError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ViewerError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ViewerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ViewerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ViewerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
