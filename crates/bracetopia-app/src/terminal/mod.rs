use std::{
    fs::{self, File},
    io::{self, Stdout},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use bracetopia_core::{Cell, CycleSummary, World};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Sparkline, Wrap},
};
use serde::Serialize;
use supports_color::{ColorLevel, Stream, on_cached};
use tracing::info;

use crate::{
    DEFAULT_DELAY_MICROS,
    renderer::{Renderer, RendererContext},
};

const UI_TICK_MILLIS: u64 = 250;
const DEFAULT_HEADLESS_FRAMES: usize = 12;
const MAX_HEADLESS_FRAMES: usize = 360;
const HEADLESS_WIDTH: u16 = 120;
const HEADLESS_HEIGHT: u16 = 48;
const TREND_SAMPLES: usize = 96;
const QUIT_HINT: &str = "Use q or Control-C to quit.";

/// Full-screen view that advances the world once per cycle delay.
pub struct TerminalRenderer {
    cycle_delay: Duration,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(Duration::from_micros(DEFAULT_DELAY_MICROS))
    }
}

impl TerminalRenderer {
    #[must_use]
    pub const fn new(cycle_delay: Duration) -> Self {
        Self { cycle_delay }
    }

    #[must_use]
    pub const fn cycle_delay(&self) -> Duration {
        self.cycle_delay
    }
}

impl Renderer for TerminalRenderer {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn run(&self, ctx: RendererContext<'_>) -> Result<()> {
        if std::env::var_os("BRACETOPIA_TERMINAL_HEADLESS").is_some() {
            let report = self.run_headless(ctx)?;
            info!(
                target = "bracetopia::terminal",
                frames = report.summary.frame_count,
                cycles_simulated = report.summary.cycles_simulated,
                final_cycle = report.summary.final_cycle,
                total_moves = report.summary.total_moves,
                initial_happiness = report.initial.team_happiness,
                happiness_mean = report.summary.happiness_mean,
                happiness_min = report.summary.happiness_min,
                happiness_max = report.summary.happiness_max,
                "Terminal headless run completed"
            );
            return Ok(());
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to build terminal backend")?;
        terminal.hide_cursor().ok();

        let result = run_event_loop(self, &mut terminal, ctx);

        terminal.show_cursor().ok();
        if let Err(err) = disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
        if let Err(err) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::error!(?err, "failed to leave alternate screen");
        }

        result
    }
}

fn run_event_loop(
    renderer: &TerminalRenderer,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ctx: RendererContext<'_>,
) -> Result<()> {
    let mut app = TerminalApp::new(renderer, ctx);

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        let timeout = app.time_until_next_cycle(Instant::now());
        if event::poll(timeout).context("failed to poll terminal events")?
            && let Event::Key(key) = event::read()?
            && app.handle_key(key)
        {
            break;
        }

        app.maybe_step(Instant::now());
    }

    info!(
        cycle = app.world.cycle(),
        team_happiness = app.world.team_happiness(),
        "Terminal session closed"
    );
    Ok(())
}

impl TerminalRenderer {
    fn run_headless(&self, ctx: RendererContext<'_>) -> Result<HeadlessReport> {
        let backend = ratatui::backend::TestBackend::new(HEADLESS_WIDTH, HEADLESS_HEIGHT);
        let mut terminal = Terminal::new(backend).context("failed to build test backend")?;
        let mut app = TerminalApp::new(self, ctx);
        let mut report = HeadlessReport::new(&app.world.summary());
        let frames = headless_frame_budget(std::env::var("BRACETOPIA_TERMINAL_HEADLESS_FRAMES").ok());

        terminal.draw(|frame| app.draw(frame))?;
        for _ in 0..frames {
            let summary = app.step_once();
            report.record(&summary);
            terminal.draw(|frame| app.draw(frame))?;
        }

        report.finalize();

        if let Some(path) = report_file_path_from_env() {
            report.write_json(&path).with_context(|| {
                format!("failed to write headless report to {}", path.display())
            })?;
        }

        Ok(report)
    }
}

fn headless_frame_budget(raw: Option<String>) -> usize {
    raw.and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .map(|value| value.min(MAX_HEADLESS_FRAMES))
        .unwrap_or(DEFAULT_HEADLESS_FRAMES)
}

struct TerminalApp<'a> {
    world: &'a mut World,
    cycle_delay: Duration,
    paused: bool,
    help_visible: bool,
    next_cycle_at: Instant,
    palette: Palette,
}

impl<'a> TerminalApp<'a> {
    fn new(renderer: &TerminalRenderer, ctx: RendererContext<'a>) -> Self {
        Self {
            world: ctx.world,
            cycle_delay: renderer.cycle_delay,
            paused: false,
            help_visible: false,
            next_cycle_at: Instant::now() + renderer.cycle_delay,
            palette: Palette::detect(),
        }
    }

    fn time_until_next_cycle(&self, now: Instant) -> Duration {
        if self.paused {
            Duration::from_millis(UI_TICK_MILLIS)
        } else {
            self.next_cycle_at.saturating_duration_since(now)
        }
    }

    fn maybe_step(&mut self, now: Instant) {
        if self.paused || now < self.next_cycle_at {
            return;
        }
        self.step_once();
        self.next_cycle_at = now + self.cycle_delay;
    }

    fn step_once(&mut self) -> CycleSummary {
        self.world.step()
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let summary = self.world.summary();

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.draw_header(frame, outer[0], &summary);

        let grid_width = u16::try_from(self.world.grid().side() * 2 + 2).unwrap_or(u16::MAX);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(grid_width), Constraint::Min(24)])
            .split(outer[1]);

        self.draw_grid(frame, body[0]);

        let sidebar = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(4)])
            .split(body[1]);

        self.draw_stats(frame, sidebar[0], &summary);
        self.draw_trend(frame, sidebar[1]);
        self.draw_hint(frame, outer[2]);

        if self.help_visible {
            self.draw_help(frame);
        }
    }

    fn draw_header(&self, frame: &mut Frame<'_>, area: Rect, summary: &CycleSummary) {
        let status = format!(
            "Cycle {:>6}  Moves {:>4}  Team happiness {:.6}",
            summary.cycle, summary.moves, summary.team_happiness
        );
        let flag = if self.paused {
            Span::styled(" PAUSED ", self.palette.paused_style())
        } else {
            Span::styled(" RUNNING ", self.palette.running_style())
        };
        let line = Line::from(vec![
            Span::styled(status, self.palette.header_style()),
            Span::raw("  "),
            flag,
        ]);

        let paragraph = Paragraph::new(line).block(
            Block::default()
                .title(self.palette.title("Bracetopia"))
                .borders(Borders::ALL),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_grid(&self, frame: &mut Frame<'_>, area: Rect) {
        let side = self.world.grid().side();
        let block = Block::default()
            .title(self.palette.title(format!("Grid {side}×{side}")))
            .borders(Borders::ALL);

        let lines: Vec<Line<'_>> = self
            .world
            .grid()
            .rows()
            .map(|row| {
                Line::from(
                    row.iter()
                        .map(|cell| {
                            Span::styled(format!("{} ", cell.symbol()), self.palette.cell_style(*cell))
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_stats(&self, frame: &mut Frame<'_>, area: Rect, summary: &CycleSummary) {
        let census = summary.census;
        let agents = census.occupied().max(1);
        let lines = vec![
            Line::from(vec![
                Span::styled("Endline ", self.palette.cell_style(Cell::Endline)),
                Span::raw(format!(
                    "{:>5} ({:>2}%)",
                    census.endline,
                    census.endline * 100 / agents
                )),
            ]),
            Line::from(vec![
                Span::styled("Newline ", self.palette.cell_style(Cell::Newline)),
                Span::raw(format!(
                    "{:>5} ({:>2}%)",
                    census.newline,
                    census.newline * 100 / agents
                )),
            ]),
            Line::from(vec![
                Span::styled("Vacant  ", self.palette.cell_style(Cell::Vacant)),
                Span::raw(format!("{:>5}", census.vacant)),
            ]),
            Line::from(vec![
                Span::styled("Moves   ", self.palette.header_style()),
                Span::raw(format!("{:>5}", summary.moves)),
            ]),
            Line::raw(""),
            Line::styled(self.world.config().summary_line(), self.palette.accent_style()),
        ];

        let paragraph = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(self.palette.title("Census"))
                    .borders(Borders::ALL),
            );
        frame.render_widget(paragraph, area);
    }

    fn draw_trend(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(self.palette.title("Team Happiness"))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 {
            return;
        }

        let data = happiness_trend(self.world, TREND_SAMPLES);
        if data.is_empty() {
            return;
        }
        let spark = Sparkline::default()
            .style(self.palette.spark_style())
            .max(1000)
            .data(&data);
        frame.render_widget(spark, inner);
    }

    fn draw_hint(&self, frame: &mut Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled(QUIT_HINT, self.palette.header_style()),
            Span::raw("  space pause  s step  ? help"),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_help(&self, frame: &mut Frame<'_>) {
        let size = frame.area();
        let help_width = size.width.min(40);
        let help_height = size.height.min(8);
        let help_x = size.x + (size.width - help_width) / 2;
        let help_y = size.y + (size.height - help_height) / 2;
        let area = Rect::new(help_x, help_y, help_width, help_height);

        let help_lines = vec![
            Line::from(vec![Span::styled(
                "Controls",
                self.palette.header_style().add_modifier(Modifier::BOLD),
            )]),
            Line::raw(" q      Quit (also Esc, Ctrl-C)"),
            Line::raw(" space  Toggle pause"),
            Line::raw(" s      Single step"),
            Line::raw(" ?      Toggle this help"),
        ];

        let paragraph = Paragraph::new(help_lines).block(
            Block::default()
                .title(self.palette.title("Help"))
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Black).fg(Color::White)),
        );
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }

    /// Apply a key press; returns `true` when the session should end.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _)
            | (KeyCode::Char('q'), _)
            | (KeyCode::Char('Q'), _)
            | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                return true;
            }
            (KeyCode::Char(' '), _) => {
                self.paused = !self.paused;
                if !self.paused {
                    self.next_cycle_at = Instant::now() + self.cycle_delay;
                }
            }
            (KeyCode::Char('s'), _) => {
                self.paused = true;
                self.step_once();
            }
            (KeyCode::Char('?') | KeyCode::Char('h'), _) => {
                self.help_visible = !self.help_visible;
            }
            _ => {}
        }

        false
    }
}

/// Recent team happiness scaled to per-mille, oldest first.
fn happiness_trend(world: &World, limit: usize) -> Vec<u64> {
    let retained = world.history().count();
    world
        .history()
        .skip(retained.saturating_sub(limit))
        .map(|entry| (entry.team_happiness.clamp(0.0, 1.0) * 1000.0).round() as u64)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
struct HeadlessReport {
    initial: FrameStats,
    frames: Vec<FrameStats>,
    summary: ReportSummary,
}

impl HeadlessReport {
    fn new(initial: &CycleSummary) -> Self {
        Self {
            initial: FrameStats::from_summary(initial),
            frames: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    fn record(&mut self, summary: &CycleSummary) {
        self.frames.push(FrameStats::from_summary(summary));
    }

    fn finalize(&mut self) {
        self.summary = ReportSummary::from(&self.initial, &self.frames);
    }

    fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).context("failed to serialize headless report")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
struct FrameStats {
    cycle: u64,
    moves: usize,
    team_happiness: f64,
    vacant: usize,
    endline: usize,
    newline: usize,
}

impl FrameStats {
    fn from_summary(summary: &CycleSummary) -> Self {
        Self {
            cycle: summary.cycle,
            moves: summary.moves,
            team_happiness: summary.team_happiness,
            vacant: summary.census.vacant,
            endline: summary.census.endline,
            newline: summary.census.newline,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct ReportSummary {
    frame_count: usize,
    cycles_simulated: u64,
    final_cycle: u64,
    total_moves: usize,
    final_moves: usize,
    happiness_mean: f64,
    happiness_min: f64,
    happiness_max: f64,
}

impl ReportSummary {
    fn from(initial: &FrameStats, frames: &[FrameStats]) -> Self {
        let Some(final_stats) = frames.last() else {
            return Self {
                frame_count: 0,
                cycles_simulated: 0,
                final_cycle: initial.cycle,
                total_moves: 0,
                final_moves: initial.moves,
                happiness_mean: initial.team_happiness,
                happiness_min: initial.team_happiness,
                happiness_max: initial.team_happiness,
            };
        };

        let frame_count = frames.len();
        let mut min_happiness = f64::INFINITY;
        let mut max_happiness = f64::NEG_INFINITY;
        let mut happiness_sum = 0.0_f64;
        for frame in frames {
            min_happiness = min_happiness.min(frame.team_happiness);
            max_happiness = max_happiness.max(frame.team_happiness);
            happiness_sum += frame.team_happiness;
        }

        Self {
            frame_count,
            cycles_simulated: final_stats.cycle.saturating_sub(initial.cycle),
            final_cycle: final_stats.cycle,
            total_moves: frames.iter().map(|frame| frame.moves).sum(),
            final_moves: final_stats.moves,
            happiness_mean: happiness_sum / frame_count as f64,
            happiness_min: min_happiness,
            happiness_max: max_happiness,
        }
    }
}

fn report_file_path_from_env() -> Option<PathBuf> {
    std::env::var_os("BRACETOPIA_TERMINAL_HEADLESS_REPORT").and_then(|raw| {
        if raw.is_empty() {
            None
        } else {
            Some(PathBuf::from(raw))
        }
    })
}

struct Palette {
    level: Option<ColorLevel>,
}

impl Palette {
    fn detect() -> Self {
        Self {
            level: on_cached(Stream::Stdout),
        }
    }

    fn header_style(&self) -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    fn accent_style(&self) -> Style {
        Style::default().fg(Color::LightMagenta)
    }

    fn paused_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    fn running_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    fn title<T: Into<String>>(&self, title: T) -> Span<'static> {
        Span::styled(title.into(), self.header_style())
    }

    fn spark_style(&self) -> Style {
        Style::default().fg(Color::Green)
    }

    fn has_color(&self) -> bool {
        self.level.is_some()
    }

    fn cell_style(&self, cell: Cell) -> Style {
        if !self.has_color() {
            return match cell {
                Cell::Vacant => Style::default(),
                Cell::Endline | Cell::Newline => Style::default().add_modifier(Modifier::BOLD),
            };
        }
        let rich = self.level.is_some_and(|level| level.has_16m);
        let color = match (cell, rich) {
            (Cell::Vacant, _) => Color::DarkGray,
            (Cell::Endline, true) => Color::Rgb(0xF4, 0xA2, 0x61),
            (Cell::Endline, false) => Color::Yellow,
            (Cell::Newline, true) => Color::Rgb(0x2A, 0x9D, 0x8F),
            (Cell::Newline, false) => Color::Cyan,
        };
        Style::default().fg(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracetopia_core::{BracetopiaConfig, Grid};
    use ratatui::{backend::TestBackend, buffer::Buffer};

    fn small_world() -> World {
        let grid = Grid::parse(
            "n e e e e
             e e e e e
             e e e e e
             e e e e e
             e e e e .",
        )
        .expect("grid");
        let config = BracetopiaConfig {
            dimension: 5,
            ..BracetopiaConfig::default()
        };
        World::with_grid(config, grid).expect("world")
    }

    fn buffer_text(buffer: &Buffer) -> String {
        let width = usize::from(buffer.area.width);
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn draw_shows_grid_statistics_and_hint() {
        let mut world = small_world();
        let renderer = TerminalRenderer::default();
        let app = TerminalApp::new(&renderer, RendererContext { world: &mut world });

        let mut terminal =
            Terminal::new(TestBackend::new(HEADLESS_WIDTH, HEADLESS_HEIGHT)).expect("terminal");
        terminal.draw(|frame| app.draw(frame)).expect("draw");
        let text = buffer_text(terminal.backend().buffer());

        assert!(text.contains("Cycle      0"));
        assert!(text.contains("Team happiness 0.914583"));
        assert!(text.contains("n e e e e"));
        assert!(text.contains("e e e e ."));
        assert!(text.contains("Endline    23"));
        assert!(text.contains(QUIT_HINT));
    }

    #[test]
    fn keys_control_the_session() {
        let mut world = small_world();
        let renderer = TerminalRenderer::new(Duration::from_secs(60));
        let mut app = TerminalApp::new(&renderer, RendererContext { world: &mut world });

        assert!(!app.handle_key(press(KeyCode::Char(' '))));
        assert!(app.paused);
        assert_eq!(
            app.time_until_next_cycle(Instant::now()),
            Duration::from_millis(UI_TICK_MILLIS)
        );
        app.maybe_step(Instant::now() + Duration::from_secs(120));
        assert_eq!(app.world.cycle(), 0);

        assert!(!app.handle_key(press(KeyCode::Char('s'))));
        assert!(app.paused);
        assert_eq!(app.world.cycle(), 1);

        assert!(!app.handle_key(press(KeyCode::Char('?'))));
        assert!(app.help_visible);

        assert!(app.handle_key(press(KeyCode::Char('q'))));
        assert!(app.handle_key(press(KeyCode::Esc)));
        assert!(app.handle_key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
    }

    #[test]
    fn cycles_advance_only_after_the_delay() {
        let mut world = small_world();
        let renderer = TerminalRenderer::new(Duration::from_secs(60));
        let mut app = TerminalApp::new(&renderer, RendererContext { world: &mut world });

        app.maybe_step(Instant::now());
        assert_eq!(app.world.cycle(), 0);

        app.maybe_step(Instant::now() + Duration::from_secs(61));
        assert_eq!(app.world.cycle(), 1);
        assert_eq!(app.world.last_moves(), 1);
    }

    #[test]
    fn frame_budget_parses_and_caps() {
        assert_eq!(headless_frame_budget(None), DEFAULT_HEADLESS_FRAMES);
        assert_eq!(headless_frame_budget(Some(" 5 ".into())), 5);
        assert_eq!(headless_frame_budget(Some("0".into())), DEFAULT_HEADLESS_FRAMES);
        assert_eq!(headless_frame_budget(Some("many".into())), DEFAULT_HEADLESS_FRAMES);
        assert_eq!(headless_frame_budget(Some("5000".into())), MAX_HEADLESS_FRAMES);
    }

    #[test]
    fn report_summary_aggregates_frames() {
        let mut world = small_world();
        let mut report = HeadlessReport::new(&world.summary());
        for _ in 0..4 {
            let summary = world.step();
            report.record(&summary);
        }
        report.finalize();

        assert_eq!(report.summary.frame_count, 4);
        assert_eq!(report.summary.cycles_simulated, 4);
        assert_eq!(report.summary.final_cycle, 4);
        assert_eq!(report.summary.total_moves, 4);
        assert!(report.summary.happiness_min <= report.summary.happiness_mean);
        assert!(report.summary.happiness_mean <= report.summary.happiness_max);
    }

    #[test]
    fn empty_report_falls_back_to_initial_frame() {
        let world = small_world();
        let mut report = HeadlessReport::new(&world.summary());
        report.finalize();
        assert_eq!(report.summary.frame_count, 0);
        assert_eq!(report.summary.final_cycle, 0);
        assert!((report.summary.happiness_mean - world.team_happiness()).abs() < f64::EPSILON);
    }

    #[test]
    fn trend_keeps_the_most_recent_samples() {
        let mut world = small_world();
        for _ in 0..10 {
            world.step();
        }
        let trend = happiness_trend(&world, 4);
        assert_eq!(trend.len(), 4);
        assert!(trend.iter().all(|value| *value == 915));
    }
}
