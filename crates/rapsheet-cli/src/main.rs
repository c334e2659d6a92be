//! `rapsheet`: terminal client for the rapsheet records directory.
//!
//! # Usage
//!
//! ```text
//! rapsheet --url http://localhost:8080 --user admin --password secret
//! rapsheet list --search doe --status "On Parole"
//! rapsheet add --id A-1 --first-name Jane --last-name Doe --status Wanted \
//!   --offense "Robbery|2023-05-05|High"
//! rapsheet watch
//! ```

mod app;
mod client;
mod commands;
mod sse;
mod ui;

use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use commands::{AddArgs, parse_offense, parse_status};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rapsheet_core::record::{OffenseDraft, PhysicalDescription, Status};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rapsheet", about = "Terminal client for the rapsheet records directory")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the rapsheet server (default: http://localhost:8080).
  #[arg(long, env = "RAPSHEET_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "RAPSHEET_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "RAPSHEET_PASSWORD")]
  password: Option<String>,

  /// Write logs to this file. The TUI logs nowhere without it.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print records, newest first, optionally filtered.
  List {
    /// Case-insensitive match on name, identifier or crime.
    #[arg(long)]
    search: Option<String>,
    /// Only records with this status, e.g. "On Parole".
    #[arg(long, value_parser = parse_status)]
    status: Option<Status>,
  },

  /// Create a record.
  Add {
    #[arg(long)]
    id: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long, value_parser = parse_status, default_value = "Wanted")]
    status: Status,
    #[arg(long)]
    dob: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    last_seen: Option<String>,
    #[arg(long)]
    photo_url: Option<String>,
    #[arg(long)]
    height: Option<String>,
    #[arg(long)]
    weight: Option<String>,
    #[arg(long)]
    hair: Option<String>,
    #[arg(long)]
    eyes: Option<String>,
    /// `crime|YYYY-MM-DD[|severity]`; repeat for several offenses.
    #[arg(long = "offense", value_parser = parse_offense)]
    offenses: Vec<OffenseDraft>,
  },

  /// Follow live changes, printing a line per refresh.
  Watch,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  init_tracing(args.log_file.as_deref(), args.command.is_some())?;

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };

  let client = ApiClient::new(api_config).context("building HTTP client")?;

  match args.command {
    Some(Command::List { search, status }) => commands::list(client, search, status).await,
    Some(Command::Add {
      id,
      first_name,
      last_name,
      status,
      dob,
      address,
      last_seen,
      photo_url,
      height,
      weight,
      hair,
      eyes,
      offenses,
    }) => {
      let add = AddArgs {
        id,
        first_name,
        last_name,
        status,
        date_of_birth: dob,
        address,
        last_seen,
        photo_url,
        physical: PhysicalDescription { height, weight, hair, eyes },
        offenses,
      };
      commands::add(client, add).await
    }
    Some(Command::Watch) => commands::watch(client).await,
    None => run_tui(client).await,
  }
}

/// Subcommands log to stderr; the TUI owns the terminal, so it only logs
/// when given a file.
fn init_tracing(log_file: Option<&std::path::Path>, to_stderr: bool) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  match log_file {
    Some(path) => {
      let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    }
    None if to_stderr => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    }
    None => {}
  }
  Ok(())
}

// ─── TUI ──────────────────────────────────────────────────────────────────────

async fn run_tui(client: ApiClient) -> Result<()> {
  let mut app = App::new(client);

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  app.start().await;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;
  app.shutdown().await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.poll_updates();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await
    {
      break;
    }
  }

  Ok(())
}
