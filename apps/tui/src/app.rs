//! Core TUI application state and event loop.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::{error, info};

use mandelbrot_core::coloring::Palette;
use mandelbrot_core::export::save_snapshot;
use mandelbrot_core::navigation::{Direction as Pan, Navigator};
use mandelbrot_core::render::{RenderParams, RenderedFrame, SilentProgress, render};
use mandelbrot_shared::{AppConfig, expand_home};

use crate::widgets::{FractalView, status_bar};

/// Poll timeout while a movement key is held.
const MOVING_TICK: Duration = Duration::from_millis(16);

/// Poll timeout when idle.
const IDLE_TICK: Duration = Duration::from_millis(100);

/// Upper bound for `+`.
const MAX_ITERATIONS_LIMIT: u32 = 1 << 16;

/// Application state.
pub(crate) struct App {
    navigator: Navigator,
    params: RenderParams,
    /// Last rendered frame, sized to the viewer area.
    frame: Option<RenderedFrame>,
    last_render: Duration,
    /// Mouse position in pixel coordinates of the viewer area.
    mouse: Option<(f64, f64)>,
    /// Whether the terminal reports key releases (held-key panning).
    release_events: bool,
    snapshot_dir: PathBuf,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
}

impl App {
    pub(crate) fn new(config: &AppConfig, release_events: bool) -> Result<Self> {
        let params = RenderParams::from_config(config)?;

        Ok(Self {
            navigator: Navigator::new(params.width, params.height, config.navigation.clone()),
            params,
            frame: None,
            last_render: Duration::ZERO,
            mouse: None,
            release_events,
            snapshot_dir: expand_home(&config.render.snapshot_dir),
            should_quit: false,
            status: "Ready | press ? for help".to_string(),
            show_help: false,
        })
    }

    /// Match the navigator to the viewer area (`cols` x `rows` cells).
    fn fit_to(&mut self, cols: u16, rows: u16) {
        let width = u32::from(cols.max(1));
        let height = u32::from(rows.max(1)) * 2;
        self.navigator.resize(width, height);
        self.params.width = width;
        self.params.height = height;

        // Frame the whole set once the real viewport size is known.
        if self.frame.is_none() {
            self.navigator.reset();
        }
    }

    /// Re-render if anything changed since the last frame.
    fn refresh(&mut self) {
        if !self.navigator.take_dirty() {
            return;
        }

        let start = Instant::now();
        match render(self.navigator.view(), &self.params, &SilentProgress) {
            Ok(frame) => {
                self.last_render = start.elapsed();
                self.frame = Some(frame);
            }
            Err(e) => {
                error!(error = %e, "render failed");
                self.status = format!("Render failed: {e}");
            }
        }
    }

    /// Pixel under the mouse, or the centre of the view.
    fn pivot(&self) -> (f64, f64) {
        self.mouse.unwrap_or_else(|| {
            let (w, h) = self.navigator.size();
            (f64::from(w) / 2.0, f64::from(h) / 2.0)
        })
    }

    fn info_line(&self) -> String {
        let c = self.navigator.center();
        format!(
            "{:+.10} {:+.10}i │ x{} │ iter {} │ {} │ {} ms │ ? help",
            c.re,
            c.im,
            self.navigator.view().magnification,
            self.params.max_iterations,
            self.params.palette,
            self.last_render.as_millis(),
        )
    }

    fn save_snapshot(&mut self) {
        let Some(frame) = &self.frame else {
            self.status = "Nothing rendered yet.".to_string();
            return;
        };

        match save_snapshot(frame, self.navigator.view(), &self.params, &self.snapshot_dir) {
            Ok((manifest, path)) => {
                info!(id = %manifest.id, "snapshot saved from viewer");
                self.status = format!("Saved snapshot to {}", path.display());
            }
            Err(e) => {
                error!(error = %e, "snapshot failed");
                self.status = format!("Snapshot failed: {e}");
            }
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        // Global keybindings (always active)
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc if key.kind == KeyEventKind::Press => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
                return;
            }
            _ => {}
        }

        if let Some(direction) = movement(key.code) {
            self.handle_movement(direction, key.kind);
            return;
        }

        // Only fresh presses act; repeats and releases are ignored.
        if key.kind != KeyEventKind::Press {
            return;
        }

        // If help is showing, consume any key to dismiss
        if self.show_help {
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('e' | 'E') => {
                let (x, y) = self.pivot();
                self.navigator.zoom_in(x, y);
            }
            KeyCode::Char('q' | 'Q') => {
                let (x, y) = self.pivot();
                self.navigator.zoom_out(x, y);
            }
            KeyCode::Char('r' | 'R') => {
                self.navigator.reset();
                self.status = "View reset".to_string();
            }
            KeyCode::Char('p' | 'P') => {
                self.set_palette(self.params.palette.next());
            }
            KeyCode::Char('+' | '=') => {
                self.set_max_iterations(self.params.max_iterations.saturating_mul(2));
            }
            KeyCode::Char('-' | '_') => {
                self.set_max_iterations(self.params.max_iterations / 2);
            }
            KeyCode::Char('x' | 'X') => self.save_snapshot(),
            _ => {}
        }
    }

    fn handle_movement(&mut self, direction: Pan, kind: KeyEventKind) {
        // Releases always apply, or a key let go under the overlay stays held.
        if kind == KeyEventKind::Release {
            self.navigator.release(direction);
            return;
        }
        if self.show_help {
            return;
        }
        match (self.release_events, kind) {
            (true, KeyEventKind::Press) => self.navigator.press(direction),
            (true, KeyEventKind::Release) => self.navigator.release(direction),
            (true, KeyEventKind::Repeat) => {}
            (false, _) => self.navigator.step(direction),
        }
    }

    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent, viewer: Rect) {
        let inside = viewer.contains(Position::new(mouse.column, mouse.row));
        if !inside {
            self.mouse = None;
            return;
        }

        let x = f64::from(mouse.column - viewer.x);
        // Middle of the two pixels sharing this cell.
        let y = f64::from(mouse.row - viewer.y) * 2.0 + 1.0;
        self.mouse = Some((x, y));

        match mouse.kind {
            MouseEventKind::ScrollUp => self.navigator.zoom_in(x, y),
            MouseEventKind::ScrollDown => self.navigator.zoom_out(x, y),
            _ => {}
        }
    }

    fn set_palette(&mut self, palette: Palette) {
        self.params.palette = palette;
        self.navigator.invalidate();
        self.status = format!("Palette: {palette}");
    }

    fn set_max_iterations(&mut self, max_iterations: u32) {
        let clamped = max_iterations.clamp(1, MAX_ITERATIONS_LIMIT);
        if clamped != self.params.max_iterations {
            self.params.max_iterations = clamped;
            self.navigator.invalidate();
        }
        self.status = format!("Max iterations: {clamped}");
    }
}

fn movement(code: KeyCode) -> Option<Pan> {
    match code {
        KeyCode::Char('w' | 'W') | KeyCode::Up => Some(Pan::Up),
        KeyCode::Char('a' | 'A') | KeyCode::Left => Some(Pan::Left),
        KeyCode::Char('s' | 'S') | KeyCode::Down => Some(Pan::Down),
        KeyCode::Char('d' | 'D') | KeyCode::Right => Some(Pan::Right),
        _ => None,
    }
}

/// Entry point — sets up terminal, runs event loop, restores terminal.
pub(crate) fn run(config: &AppConfig) -> Result<()> {
    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let release_events = supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    info!(release_events, "viewer starting");

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = App::new(config, release_events).and_then(|mut app| run_app(&mut terminal, &mut app));

    // Restore terminal
    if release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let size = terminal.size()?;
        let viewer = viewer_area(Rect::new(0, 0, size.width, size.height));
        app.fit_to(viewer.width, viewer.height);

        let now = Instant::now();
        app.navigator.tick(now.duration_since(last_tick).as_secs_f64());
        last_tick = now;

        app.refresh();
        terminal.draw(|f| draw(f, app))?;

        let timeout = if [Pan::Up, Pan::Left, Pan::Down, Pan::Right]
            .into_iter()
            .any(|d| app.navigator.is_held(d))
        {
            MOVING_TICK
        } else {
            IDLE_TICK
        };

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse, viewer),
                Event::FocusLost => app.navigator.release_all(),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Split the screen into the viewer block and the status bar.
fn layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Viewer
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    (chunks[0], chunks[1])
}

fn viewer_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(" Mandelbrot Viewer ")
}

/// Inner area of the viewer block, where pixels are drawn.
fn viewer_area(area: Rect) -> Rect {
    viewer_block().inner(layout(area).0)
}

fn draw(f: &mut Frame, app: &App) {
    let (content, status) = layout(f.area());

    let block = viewer_block().title_bottom(Line::from(format!(" {} ", app.info_line())));
    let inner = block.inner(content);
    f.render_widget(block, content);
    f.render_widget(FractalView::new(app.frame.as_ref()), inner);

    // Status bar
    f.render_widget(status_bar(&app.status), status);

    // Help overlay
    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  W/A/S/D, arrows   Pan"),
        Line::from("  E / scroll up     Zoom in at mouse"),
        Line::from("  Q / scroll down   Zoom out at mouse"),
        Line::from("  R                 Reset view"),
        Line::from("  P                 Next palette"),
        Line::from("  + / -             More / fewer iterations"),
        Line::from("  X                 Save snapshot"),
        Line::from("  ?                 Toggle this help"),
        Line::from("  Esc / Ctrl-C      Quit"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help | press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
