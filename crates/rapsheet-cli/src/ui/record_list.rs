//! Record list pane: left panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::{app::App, ui::status_color};

/// Render the filtered record list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let directory = &app.directory;
  let displayed = directory.displayed();
  let total = directory.base().len();
  let query = directory.query();

  let title = if query.is_empty() {
    format!(" Records ({total}) ")
  } else {
    format!(" Records ({}/{total}) ", displayed.len())
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Filter bar along the bottom edge while any filter is set.
  if (app.search_active || !query.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let cursor = if app.search_active { "_" } else { "" };
    let status = query
      .status
      .map(|s| format!("  status: {s}"))
      .unwrap_or_default();
    f.render_widget(
      Paragraph::new(format!("/{}{cursor}{status}", query.search))
        .style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  if let Some(hint) = directory.empty_hint() {
    f.render_widget(
      Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
      inner_area,
    );
    return;
  }

  let items: Vec<ListItem> = displayed
    .iter()
    .map(|record| {
      ListItem::new(Line::from(vec![
        Span::styled(
          format!("{:<10} ", record.identifier),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw(format!("{:<24} ", record.full_name())),
        Span::styled(
          format!("{:<13}", record.status.as_ref()),
          Style::default().fg(status_color(record.status)),
        ),
        Span::styled(
          record.most_recent_offense().to_string(),
          Style::default().fg(Color::Gray),
        ),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
