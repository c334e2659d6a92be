//! Record detail pane: right panel.

use rapsheet_core::record::{Record, Severity};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{app::App, ui::status_color};

// ─── Public entry ─────────────────────────────────────────────────────────────

/// Render `record` into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App, record: &Record) {
  let block = Block::default()
    .title(format!(" {} ", record.full_name()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let inner = block.inner(area);
  f.render_widget(block, area);

  let physical = &record.physical;
  let mut lines = vec![
    field("id", record.identifier.clone()),
    Line::from(vec![
      label("status"),
      Span::styled(
        record.status.to_string(),
        Style::default()
          .fg(status_color(record.status))
          .add_modifier(Modifier::BOLD),
      ),
    ]),
    field("born", or_unknown(&record.date_of_birth)),
    field("address", or_unknown(&record.address)),
    field("last seen", or_unknown(&record.last_seen)),
    field("photo", record.photo_url_or_placeholder()),
    Line::from(""),
    field("height", or_unknown(physical.height.as_deref().unwrap_or(""))),
    field("weight", or_unknown(physical.weight.as_deref().unwrap_or(""))),
    field("hair", or_unknown(physical.hair.as_deref().unwrap_or(""))),
    field("eyes", or_unknown(physical.eyes.as_deref().unwrap_or(""))),
    Line::from(""),
    Line::from(Span::styled(
      format!("Offenses ({})", record.offenses.len()),
      Style::default().add_modifier(Modifier::BOLD),
    )),
  ];

  if record.offenses.is_empty() {
    lines.push(Line::from(Span::styled(
      "  none on file",
      Style::default().fg(Color::DarkGray),
    )));
  }
  for offense in &record.offenses {
    lines.push(Line::from(vec![
      Span::styled(
        format!("  {}  ", offense.date.format("%Y-%m-%d")),
        Style::default().fg(Color::DarkGray),
      ),
      Span::styled(
        format!("{:<9}", offense.severity.as_ref()),
        Style::default().fg(severity_color(offense.severity)),
      ),
      Span::raw(offense.crime.clone()),
    ]));
  }

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    format!(
      "created {}  updated {}",
      record.created_at.format("%Y-%m-%d %H:%M"),
      record.updated_at.format("%Y-%m-%d %H:%M"),
    ),
    Style::default().fg(Color::DarkGray),
  )));

  let para = Paragraph::new(lines)
    .wrap(Wrap { trim: false })
    .scroll((app.detail_scroll as u16, 0));
  f.render_widget(para, inner);
}

// ─── Formatting helpers ───────────────────────────────────────────────────────

fn label(name: &str) -> Span<'static> {
  Span::styled(
    format!("{name:<11}"),
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
  )
}

fn field(name: &str, value: String) -> Line<'static> {
  Line::from(vec![label(name), Span::raw(value)])
}

fn or_unknown(value: &str) -> String {
  if value.is_empty() { "—".into() } else { value.to_owned() }
}

fn severity_color(severity: Severity) -> Color {
  match severity {
    Severity::Low => Color::Gray,
    Severity::Medium => Color::Yellow,
    Severity::High => Color::LightRed,
    Severity::Critical => Color::Red,
  }
}
