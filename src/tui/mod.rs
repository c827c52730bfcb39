//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing series, a lookback window and
//! a frequency, then renders the fetched prices as a chart, a statistics
//! summary or a price table.

use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::{info, warn};

use crate::app::session::{Query, Session};
use crate::cli::TuiArgs;
use crate::data::SeriesClient;
use crate::data::registry;
use crate::domain::{DateRange, Frequency, SeriesBatch, SeriesDefinition, Window};
use crate::error::AppError;
use crate::io::pivot::PivotTable;

mod plotters_chart;

use plotters_chart::{ChartSeries, PriceChart, palette_color};

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    // Build the client before touching the terminal so configuration errors
    // print normally.
    let client = SeriesClient::from_env()?;
    let mut app = App::new(client, args)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Chart,
    Stats,
    Table,
}

impl View {
    fn next(self) -> Self {
        match self {
            View::Chart => View::Stats,
            View::Stats => View::Table,
            View::Table => View::Chart,
        }
    }

    fn title(self) -> &'static str {
        match self {
            View::Chart => "Prices",
            View::Stats => "Statistics",
            View::Table => "Table",
        }
    }
}

struct Loaded {
    range: DateRange,
    frequency: Frequency,
    batch: SeriesBatch,
    table: PivotTable,
}

struct App {
    client: SeriesClient,
    session: Session,
    defs: &'static [SeriesDefinition],
    selected: Vec<bool>,
    window: Window,
    frequency: Frequency,
    cursor: usize,
    view: View,
    table_scroll: u16,
    pending_fetch: bool,
    loaded: Option<Loaded>,
    status: String,
}

impl App {
    fn new(client: SeriesClient, args: TuiArgs) -> Result<Self, AppError> {
        let defs = registry::all();
        let wanted = crate::app::selected_series(&args.series);
        for name in &wanted {
            if registry::lookup(name).is_none() {
                return Err(crate::error::SeriesError::UnknownSeries(name.clone()).into());
            }
        }
        let selected = defs.iter().map(|d| wanted.iter().any(|w| w == d.name)).collect();

        Ok(Self {
            client,
            session: Session::new(),
            defs,
            selected,
            window: args.window,
            frequency: args.frequency,
            cursor: 0,
            view: View::Chart,
            table_scroll: 0,
            pending_fetch: true,
            loaded: None,
            status: "Fetching EIA data...".to_string(),
        })
    }

    fn window_row(&self) -> usize {
        self.defs.len()
    }

    fn frequency_row(&self) -> usize {
        self.defs.len() + 1
    }

    fn selected_names(&self) -> Vec<String> {
        self.defs
            .iter()
            .zip(&self.selected)
            .filter(|(_, on)| **on)
            .map(|(d, _)| d.name.to_string())
            .collect()
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            // Fetches block the thread. We defer them by one loop iteration so the
            // "Fetching..." status is on screen while the request (and any retry
            // backoff) is running, instead of the UI appearing frozen.
            if self.pending_fetch {
                self.pending_fetch = false;
                self.fetch();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.cursor < self.frequency_row() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') => {
                if let Some(on) = self.selected.get_mut(self.cursor) {
                    *on = !*on;
                    self.sync_frequency();
                }
            }
            KeyCode::Left => self.adjust(-1),
            KeyCode::Right => self.adjust(1),
            KeyCode::Enter | KeyCode::Char('r') => self.request_fetch(),
            KeyCode::Tab => {
                self.view = self.view.next();
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::PageDown => {
                self.table_scroll = self.table_scroll.saturating_add(10);
            }
            KeyCode::PageUp => {
                self.table_scroll = self.table_scroll.saturating_sub(10);
            }
            _ => {}
        }
        false
    }

    fn adjust(&mut self, delta: i32) {
        if self.cursor == self.window_row() {
            self.window = if delta >= 0 {
                self.window.next()
            } else {
                self.window.prev()
            };
            self.status = format!("window: {}", self.window.display_name());
        } else if self.cursor == self.frequency_row() {
            let names = self.selected_names();
            let options = self.session.available_frequencies(&names);
            self.frequency = cycle(&options, self.frequency, delta);
            self.status = format!("frequency: {}", self.frequency);
        }
    }

    /// Keep the current frequency within what the session still offers.
    ///
    /// Rejections are remembered per selection, so toggling a series can make
    /// the current frequency unavailable (or available again).
    fn sync_frequency(&mut self) {
        let names = self.selected_names();
        let options = self.session.available_frequencies(&names);
        if !options.contains(&self.frequency) {
            if let Some(first) = options.first() {
                self.frequency = *first;
            }
        }
    }

    fn request_fetch(&mut self) {
        if self.selected_names().is_empty() {
            self.status = "Select at least one series (space toggles).".to_string();
            return;
        }
        self.pending_fetch = true;
        self.status = "Fetching EIA data...".to_string();
    }

    fn fetch(&mut self) {
        let series = self.selected_names();
        if series.is_empty() {
            self.status = "Select at least one series (space toggles).".to_string();
            return;
        }
        let query = Query {
            series,
            range: self.window.ending(Local::now().date_naive()),
            frequency: self.frequency,
        };

        match self.session.load(&self.client, &query) {
            Ok(batch) => {
                let rows: usize = batch.iter().map(|(_, r)| r.len()).sum();
                self.status = if batch.has_data() {
                    format!("Loaded {rows} row(s) for {} series ({}).", batch.len(), query.range)
                } else {
                    "No data returned for the selected window.".to_string()
                };
                info!(rows, series = batch.len(), "TUI fetch complete");
                self.table_scroll = 0;
                self.loaded = Some(Loaded {
                    range: query.range,
                    frequency: query.frequency,
                    table: PivotTable::from_batch(&batch),
                    batch,
                });
            }
            Err(err) => {
                warn!(error = %err, "TUI fetch failed");
                // A 4xx from EIA almost always means the frequency does not exist
                // for one of the selected routes. The session has just recorded it,
                // so step to a frequency that has not failed yet.
                if err.is_invalid_request() {
                    let rejected = self.frequency;
                    self.sync_frequency();
                    self.status = format!(
                        "Frequency '{rejected}' not available for this selection; switched to '{}'. Press Enter to retry.",
                        self.frequency
                    );
                } else {
                    self.status = err.to_string();
                }
            }
        }
    }

    fn export(&mut self) {
        let Some(loaded) = &self.loaded else {
            self.status = "Nothing to export yet.".to_string();
            return;
        };
        if loaded.table.is_empty() {
            self.status = "No data available to export.".to_string();
            return;
        }
        let path = crate::io::export::resolve_export_path(Path::new("."), &loaded.range);
        self.status = match crate::io::export::write_pivot_csv_file(&path, &loaded.table) {
            Ok(()) => format!("Exported {} row(s) to {}", loaded.table.len(), path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("eia", Style::default().fg(Color::Cyan)),
            Span::raw(" - EIA energy prices"),
        ]));

        let loaded = match &self.loaded {
            Some(l) => format!("{} | {} | series: {}", l.range, l.frequency, l.batch.len()),
            None => "-".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "window: {} | frequency: {} | loaded: {loaded}",
                self.window.display_name(),
                self.frequency,
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(42), Constraint::Min(0)])
            .split(area);

        self.draw_settings(frame, chunks[0]);
        match self.view {
            View::Chart => self.draw_chart(frame, chunks[1]),
            View::Stats => self.draw_stats(frame, chunks[1]),
            View::Table => self.draw_table(frame, chunks[1]),
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut items: Vec<ListItem> = self
            .defs
            .iter()
            .zip(&self.selected)
            .map(|(d, on)| ListItem::new(format!("[{}] {}", if *on { 'x' } else { ' ' }, d.name)))
            .collect();
        items.push(ListItem::new(format!("Window: {}", self.window.display_name())));
        items.push(ListItem::new(format!("Frequency: {}", self.frequency)));

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(loaded) = &self.loaded else {
            self.draw_waiting(frame, area, View::Chart);
            return;
        };

        let Some((series, x_bounds, y_bounds)) = chart_series(&loaded.batch) else {
            self.draw_message(frame, area, View::Chart, "No data available to plot.");
            return;
        };

        // Plotters legends are unreadable at terminal resolution, so the legend
        // lives in the block title, colored to match each line.
        let mut legend = vec![Span::raw(" Prices ")];
        for s in &series {
            let (r, g, b) = s.color;
            legend.push(Span::styled(format!("■ {} ", s.name), Style::default().fg(Color::Rgb(r, g, b))));
        }
        let block = Block::default().title(Line::from(legend)).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let (chart_rect, insets) = chart_layout(inner);
        let widget = PriceChart {
            series: &series,
            x_bounds,
            y_bounds,
            y_label: "price",
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_price,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_stats(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(loaded) = &self.loaded else {
            self.draw_waiting(frame, area, View::Stats);
            return;
        };
        let text = crate::report::format_statistics(&loaded.batch);
        let p = Paragraph::new(text.trim_start().to_string())
            .block(Block::default().title(View::Stats.title()).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(loaded) = &self.loaded else {
            self.draw_waiting(frame, area, View::Table);
            return;
        };
        let text = crate::report::format_pivot_table(&loaded.table, loaded.table.len());
        // PageDown keeps counting past the end; clamp here so the table never
        // scrolls into blank space.
        let max_scroll = loaded.table.len() as u16;
        let p = Paragraph::new(text)
            .scroll((self.table_scroll.min(max_scroll), 0))
            .block(
                Block::default()
                    .title(format!("{} ({} rows)", View::Table.title(), loaded.table.len()))
                    .borders(Borders::ALL),
            );
        frame.render_widget(p, area);
    }

    fn draw_waiting(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: View) {
        self.draw_message(frame, area, view, "Waiting for data...");
    }

    fn draw_message(&self, frame: &mut ratatui::Frame<'_>, area: Rect, view: View, msg: &str) {
        let p = Paragraph::new(msg.to_string())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().title(view.title()).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ move  space toggle  ←/→ adjust  Enter fetch  Tab view  e export  PgUp/PgDn scroll  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Step through `options` from `current`, wrapping at both ends.
fn cycle(options: &[Frequency], current: Frequency, delta: i32) -> Frequency {
    if options.is_empty() {
        return current;
    }
    let n = options.len() as i32;
    let i = options.iter().position(|f| *f == current).map_or(0, |i| i as i32);
    let next = if options.contains(&current) {
        (i + delta.signum()).rem_euclid(n)
    } else {
        0
    };
    options[next as usize]
}

/// Build chart series for Plotters, x as days from the common era.
///
/// Plotters needs a numeric x axis; day numbers keep spacing proportional to
/// calendar time (weekends and holidays show as gaps) and convert back to dates
/// for tick labels.
fn chart_series(batch: &SeriesBatch) -> Option<(Vec<ChartSeries>, [f64; 2], [f64; 2])> {
    let mut out = Vec::new();
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for (name, result) in batch.iter().filter(|(_, r)| !r.is_empty()) {
        let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        for p in result.points() {
            if p.is_missing() {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                continue;
            }
            let x = p.date.num_days_from_ce() as f64;
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(p.value);
            y_max = y_max.max(p.value);
            current.push((x, p.value));
        }
        if !current.is_empty() {
            segments.push(current);
        }
        out.push(ChartSeries {
            name: name.to_string(),
            color: palette_color(out.len()),
            segments,
        });
    }

    if !x_min.is_finite() || !y_min.is_finite() {
        return None;
    }
    if x_max <= x_min {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    Some((out, [x_min, x_max], [y_min - pad, y_max + pad]))
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_axis_price(v: f64) -> String {
    format!("{v:.1}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_date(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.0}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("$")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
