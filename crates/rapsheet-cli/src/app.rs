//! Application state machine and event dispatcher.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rapsheet_core::{
  directory::Directory,
  record::{Record, Status},
  sync::{Snapshot, Subscription, Synchronizer},
};
use strum::IntoEnumIterator as _;
use tokio::sync::watch;
use tracing::warn;

use crate::client::ApiClient;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the record list.
  RecordList,
  /// Focus on the record detail pane.
  RecordDetail,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Base list plus active filters; the list pane renders `displayed()`.
  pub directory: Directory,

  /// Whether the user is typing into the search box.
  pub search_active: bool,

  /// Cursor position within the displayed list.
  pub list_cursor: usize,

  /// Scroll offset within the detail pane.
  pub detail_scroll: usize,

  /// Identifier of the record open in the detail pane.
  pub selected_id: Option<String>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// `true` while the live change subscription is running.
  pub live: bool,

  sync:         Arc<Synchronizer<ApiClient>>,
  snapshots:    watch::Receiver<Snapshot>,
  subscription: Option<Subscription>,
}

impl App {
  /// Create an [`App`] with an empty base list.
  pub fn new(client: ApiClient) -> Self {
    let sync = Arc::new(Synchronizer::new(Arc::new(client)));
    let snapshots = sync.watch();
    Self {
      screen: Screen::RecordList,
      directory: Directory::new(),
      search_active: false,
      list_cursor: 0,
      detail_scroll: 0,
      selected_id: None,
      status_msg: String::new(),
      live: false,
      sync,
      snapshots,
      subscription: None,
    }
  }

  pub fn server_url(&self) -> &str { self.sync.store().base_url() }

  // ── Synchronization ───────────────────────────────────────────────────────

  /// Initial load, then start following server-side changes.
  pub async fn start(&mut self) {
    self.refresh().await;
    match self.sync.subscribe(|_| {}).await {
      Ok(sub) => {
        self.subscription = Some(sub);
        self.live = true;
      }
      Err(e) => {
        warn!(error = %e, "live updates unavailable");
        self.status_msg = format!("Live updates unavailable: {e}");
      }
    }
  }

  /// Fetch the full list now. Failures leave the current list in place.
  pub async fn refresh(&mut self) {
    self.status_msg = "Loading records…".into();
    match self.sync.refresh().await {
      Ok(_) => self.status_msg.clear(),
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
    self.poll_updates();
  }

  /// Pull in the latest applied snapshot, if any. Called once per frame.
  pub fn poll_updates(&mut self) {
    if self.live
      && self.subscription.as_ref().is_some_and(Subscription::is_finished)
    {
      self.live = false;
      self.status_msg = "Live updates stopped; press r to refresh".into();
    }
    if self.snapshots.has_changed().unwrap_or(false) {
      let snapshot = self.snapshots.borrow_and_update().clone();
      self.directory.replace_base(&snapshot);
      self.clamp_cursor();
    }
  }

  /// Stop the live subscription and wait for it to wind down.
  pub async fn shutdown(&mut self) {
    if let Some(sub) = self.subscription.take() {
      self.sync.unsubscribe(sub).await;
    }
    self.live = false;
  }

  // ── Views ─────────────────────────────────────────────────────────────────

  /// The record under the list cursor, if any.
  pub fn cursor_record(&self) -> Option<&Record> {
    self.directory.displayed().get(self.list_cursor)
  }

  /// The record open in the detail pane, looked up in the current base list
  /// so that it reflects the latest refresh.
  pub fn selected_record(&self) -> Option<&Record> {
    let id = self.selected_id.as_deref()?;
    self.directory.base().iter().find(|r| r.identifier == id)
  }

  fn clamp_cursor(&mut self) {
    let len = self.directory.displayed().len();
    self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
  }

  /// Advance the status filter: all → each status in turn → all.
  fn cycle_status(&mut self) {
    let next = match self.directory.query().status {
      None => Status::iter().next(),
      Some(current) => Status::iter().skip_while(|s| *s != current).nth(1),
    };
    self.directory.set_status(next);
    self.list_cursor = 0;
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    // Search input mode: printable keys edit the search text live.
    if self.search_active {
      self.handle_search_key(key);
      return true;
    }

    match self.screen {
      Screen::RecordList => self.handle_list_key(key).await,
      Screen::RecordDetail => self.handle_detail_key(key),
    }
  }

  fn handle_search_key(&mut self, key: KeyEvent) {
    let mut search = self.directory.query().search.clone();
    match key.code {
      KeyCode::Esc => {
        self.search_active = false;
        search.clear();
      }
      KeyCode::Enter => self.search_active = false,
      KeyCode::Backspace => {
        search.pop();
      }
      KeyCode::Char(c) => search.push(c),
      _ => return,
    }
    self.directory.set_search(search);
    self.list_cursor = 0;
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Down | KeyCode::Char('j') => {
        if self.list_cursor + 1 < self.directory.displayed().len() {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_record().map(|r| r.identifier.clone()) {
          self.selected_id = Some(id);
          self.detail_scroll = 0;
          self.screen = Screen::RecordDetail;
        }
      }

      KeyCode::Char('/') => self.search_active = true,
      KeyCode::Char('s') => self.cycle_status(),
      KeyCode::Char('c') => {
        self.directory.clear_filters();
        self.list_cursor = 0;
      }
      KeyCode::Char('r') => self.refresh().await,

      _ => {}
    }
    true
  }

  fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        self.screen = Screen::RecordList;
        self.selected_id = None;
      }

      KeyCode::Down | KeyCode::Char('j') => self.detail_scroll += 1,
      KeyCode::Up | KeyCode::Char('k') => {
        self.detail_scroll = self.detail_scroll.saturating_sub(1);
      }

      // Step through the displayed list without leaving the detail pane.
      KeyCode::Char(']') | KeyCode::PageDown => {
        if self.list_cursor + 1 < self.directory.displayed().len() {
          self.list_cursor += 1;
          self.select_cursor();
        }
      }
      KeyCode::Char('[') | KeyCode::PageUp => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
          self.select_cursor();
        }
      }

      _ => {}
    }
    true
  }

  fn select_cursor(&mut self) {
    self.selected_id = self.cursor_record().map(|r| r.identifier.clone());
    self.detail_scroll = 0;
  }
}

#[cfg(test)]
mod tests {
  use crossterm::event::KeyEventKind;

  use super::*;
  use crate::client::ApiConfig;

  fn app() -> App {
    App::new(
      ApiClient::new(ApiConfig {
        base_url: "http://127.0.0.1:9".into(),
        username: String::new(),
        password: String::new(),
      })
      .unwrap(),
    )
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent {
      code,
      modifiers: KeyModifiers::NONE,
      kind: KeyEventKind::Press,
      state: crossterm::event::KeyEventState::NONE,
    }
  }

  #[tokio::test]
  async fn status_filter_cycles_through_all_and_back() {
    let mut app = app();
    let mut seen = Vec::new();
    for _ in 0..5 {
      app.handle_key(key(KeyCode::Char('s'))).await;
      seen.push(app.directory.query().status);
    }
    assert_eq!(seen, [
      Some(Status::Incarcerated),
      Some(Status::OnParole),
      Some(Status::Released),
      Some(Status::Wanted),
      None,
    ]);
  }

  #[tokio::test]
  async fn search_mode_edits_query_live() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('/'))).await;
    assert!(app.search_active);

    for c in "doe".chars() {
      app.handle_key(key(KeyCode::Char(c))).await;
    }
    assert_eq!(app.directory.query().search, "doe");

    app.handle_key(key(KeyCode::Backspace)).await;
    app.handle_key(key(KeyCode::Enter)).await;
    assert!(!app.search_active);
    assert_eq!(app.directory.query().search, "do");

    // `q` inside search mode is text, outside it quits.
    app.handle_key(key(KeyCode::Char('/'))).await;
    assert!(app.handle_key(key(KeyCode::Char('q'))).await);
    app.handle_key(key(KeyCode::Esc)).await;
    assert!(app.directory.query().search.is_empty());
    assert!(!app.handle_key(key(KeyCode::Char('q'))).await);
  }

  #[tokio::test]
  async fn failed_refresh_reports_and_keeps_list() {
    let mut app = app();
    app.refresh().await;
    assert!(app.status_msg.starts_with("Error:"), "{}", app.status_msg);
    assert!(app.directory.base().is_empty());
    assert_eq!(app.directory.empty_hint(), Some("No records in the database."));
  }
}
