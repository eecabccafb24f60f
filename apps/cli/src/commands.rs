//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use mandelbrot_core::export::{build_manifest, read_manifest, write_manifest, write_ppm};
use mandelbrot_core::render::{RenderParams, RenderProgress, RenderedFrame, render};
use mandelbrot_shared::{
    AppConfig, Complex, SnapshotId, ViewState, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Mandelbrot — render the Mandelbrot set from the command line.
#[derive(Parser)]
#[command(
    name = "mandelbrot",
    version,
    about = "Render views of the Mandelbrot set to images and manage viewer config.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.mandelbrot-viewer/mandelbrot-viewer.toml.
    #[arg(long, global = true, env = "MANDELBROT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Render a view to a PPM image (plus a JSON manifest).
    Render(RenderArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `render`. Unset values fall back to the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct RenderArgs {
    /// Image width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Iterations after which a point counts as inside the set.
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Escape radius for |z|.
    #[arg(long)]
    pub escape_radius: Option<f64>,

    /// Palette: hsv, grayscale, or fire.
    #[arg(long)]
    pub palette: Option<String>,

    /// Worker threads (0 = all cores).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Real part of the image centre.
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["offset_x", "offset_y"])]
    pub center_re: Option<f64>,

    /// Imaginary part of the image centre.
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["offset_x", "offset_y"])]
    pub center_im: Option<f64>,

    /// Magnification (1 shows [-2, 2] on the shorter side).
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Raw pixel offset, as stored in manifests.
    #[arg(long, allow_hyphen_values = true)]
    pub offset_x: Option<f64>,

    /// Raw pixel offset, as stored in manifests.
    #[arg(long, allow_hyphen_values = true)]
    pub offset_y: Option<f64>,

    /// Re-render the view recorded in a snapshot manifest.
    #[arg(
        long,
        conflicts_with_all = [
            "width", "height", "max_iterations", "escape_radius", "palette",
            "center_re", "center_im", "zoom", "offset_x", "offset_y",
        ]
    )]
    pub from: Option<PathBuf>,

    /// Output image path.
    #[arg(short, long, default_value = "mandelbrot.ppm")]
    pub out: PathBuf,

    /// Skip writing the JSON manifest next to the image.
    #[arg(long)]
    pub no_manifest: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "mandelbrot=info,mandelbrot_core=info,mandelbrot_shared=info",
        1 => "mandelbrot=debug,mandelbrot_core=debug,mandelbrot_shared=debug",
        _ => "mandelbrot=trace,mandelbrot_core=trace,mandelbrot_shared=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render(args) => cmd_render(cli.config.as_deref(), &args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()).await,
        },
    }
}

fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

/// Merge flags over the config (or a manifest) into a view and render params.
pub(crate) fn resolve_render(
    args: &RenderArgs,
    config: &AppConfig,
) -> Result<(ViewState, RenderParams)> {
    let mut config = config.clone();
    if let Some(threads) = args.threads {
        config.render.threads = threads;
    }

    if let Some(manifest_path) = &args.from {
        let manifest = read_manifest(manifest_path)
            .wrap_err_with(|| format!("cannot replay {}", manifest_path.display()))?;
        let params = RenderParams::from_manifest(&manifest, config.resolved_threads())?;
        return Ok((manifest.view, params));
    }

    if let Some(width) = args.width {
        config.view.width = width;
    }
    if let Some(height) = args.height {
        config.view.height = height;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.view.max_iterations = max_iterations;
    }
    if let Some(escape_radius) = args.escape_radius {
        config.view.escape_radius = escape_radius;
    }
    if let Some(palette) = &args.palette {
        config.view.palette = palette.to_lowercase();
    }
    config.validate()?;

    let params = RenderParams::from_config(&config)?;
    let zoom = args.zoom.unwrap_or(1.0);
    if !(zoom.is_finite() && zoom > 0.0) {
        return Err(eyre!("zoom must be a positive number, got {zoom}"));
    }

    let view = match (args.offset_x, args.offset_y) {
        (None, None) => {
            let center = Complex::new(args.center_re.unwrap_or(0.0), args.center_im.unwrap_or(0.0));
            ViewState::centered_on(center, zoom, params.width, params.height)
        }
        (x, y) => ViewState {
            offset_x: x.unwrap_or(0.0),
            offset_y: y.unwrap_or(0.0),
            magnification: zoom,
        },
    };

    Ok((view, params))
}

async fn cmd_render(config_path: Option<&Path>, args: &RenderArgs) -> Result<()> {
    let config = load(config_path)?;
    let (view, params) = resolve_render(args, &config)?;

    let center = view.center(params.width, params.height);
    info!(
        width = params.width,
        height = params.height,
        center = %center,
        magnification = view.magnification,
        threads = params.threads,
        "rendering"
    );

    let frame = render_with_progress(view, params).await?;

    write_ppm(&frame, &args.out)?;
    println!("  Image:    {}", args.out.display());

    if !args.no_manifest {
        let image_file = args
            .out
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let manifest = build_manifest(&frame, &view, &params, SnapshotId::new(), &image_file);
        let manifest_path = args.out.with_extension("json");
        write_manifest(&manifest, &manifest_path)?;
        println!("  Manifest: {}", manifest_path.display());
    }

    println!("  Centre:   {center}");
    println!("  Zoom:     x{}", view.magnification);
    println!("  Hash:     {}", frame.pixel_hash());

    Ok(())
}

/// Render on the blocking pool while an indicatif bar tracks the bands.
async fn render_with_progress(view: ViewState, params: RenderParams) -> Result<RenderedFrame> {
    let progress = CliProgress::new();

    let frame = tokio::task::spawn_blocking(move || render(&view, &params, &progress))
        .await
        .map_err(|e| eyre!("render task failed: {e}"))??;

    Ok(frame)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar over render bands.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} Rendering [{bar:30}] {pos}/{len} bands")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }
}

impl RenderProgress for CliProgress {
    fn band_done(&self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }

    fn finished(&self, _frame: &RenderedFrame) {
        self.bar.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
