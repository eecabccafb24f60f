//! Mandelbrot viewer TUI — interactive pan and zoom in the terminal.
//!
//! Renders the set with half-block cells (two pixels per cell), built with
//! `ratatui` + `crossterm`.

mod app;
mod widgets;

use std::fs::OpenOptions;
use std::sync::Mutex;

use color_eyre::eyre::Result;
use mandelbrot_shared::{config_dir, load_config};

/// Log file under the config directory; stdout belongs to the UI.
const LOG_FILE_NAME: &str = "viewer.log";

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = load_config()?;
    config.validate()?;
    app::run(&config)
}

/// Send tracing output to `~/.mandelbrot-viewer/viewer.log`, if writable.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let Ok(dir) = config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
    else {
        return;
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mandelbrot_core=info,mandelbrot_viewer=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}
