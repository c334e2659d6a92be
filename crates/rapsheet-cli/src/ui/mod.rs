//! TUI rendering: orchestrates all panes.

pub mod record_detail;
pub mod record_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use rapsheet_core::record::Status;

use crate::app::{App, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

/// Colour used for a status everywhere it appears.
pub fn status_color(status: Status) -> Color {
  match status {
    Status::Incarcerated => Color::Red,
    Status::OnParole => Color::Yellow,
    Status::Released => Color::Green,
    Status::Wanted => Color::Magenta,
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();
  let live = if app.live { "● live" } else { "○ offline" };

  let left = Span::styled(
    format!(" rapsheet  {}", app.server_url()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{live}  {date} "),
    Style::default().fg(if app.live { Color::Green } else { Color::Gray }),
  );

  let left_width = left.width() as u16;
  let right_width = right.width() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
    .split(area);

  record_list::draw(f, cols[0], app);

  match app.selected_record() {
    Some(record) => record_detail::draw(f, cols[1], app, record),
    None => draw_empty_detail(f, cols[1], app),
  }
}

fn draw_empty_detail(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Detail ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  // The open record can vanish when a refresh no longer contains it.
  let hint = if app.selected_id.is_some() {
    "This record is no longer in the directory."
  } else {
    "Select a record and press Enter."
  };
  f.render_widget(
    Paragraph::new(Line::from(vec![Span::styled(
      hint,
      Style::default().fg(Color::DarkGray),
    )])),
    inner,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match &app.screen {
    Screen::RecordList if app.search_active => (
      "SEARCH",
      "Type to filter  Esc clear  Enter done",
    ),
    Screen::RecordList => (
      "NORMAL",
      "↑↓/jk navigate  / search  s status  c clear  r refresh  Enter detail  q quit",
    ),
    Screen::RecordDetail => (
      "DETAIL",
      "↑↓/jk scroll  Esc back  [ prev  ] next  q quit",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
