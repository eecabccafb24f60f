//! Shared types, error model, and configuration for the Mandelbrot viewer.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`ViewerError`] — the unified error type
//! - Domain types ([`Complex`], [`Rgb`], [`ViewState`], [`SnapshotManifest`], [`SnapshotId`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, NavigationConfig, RenderConfig, ViewConfig, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from,
};
pub use error::{Result, ViewerError};
pub use types::{
    CURRENT_SCHEMA_VERSION, Complex, Rgb, SnapshotId, SnapshotManifest, ViewState,
};
