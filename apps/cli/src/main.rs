//! Mandelbrot CLI — headless rendering and configuration management.
//!
//! Renders views of the Mandelbrot set to PPM images with reproducible
//! JSON manifests, and manages the shared viewer config file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
