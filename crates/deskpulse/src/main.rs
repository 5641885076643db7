mod config;
mod runtime;
mod sources;
mod theme;
mod ui;

use anyhow::Result;
use chrono::Local;
use config::{load_config, Config};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deskpulse_core::{Dashboard, Flow, KeyPress, Message};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use runtime::{Fetcher, Runtime, MESSAGE_QUEUE_CAPACITY};
use sources::Sources;
use std::{
    fs::OpenOptions,
    io,
    path::Path,
    sync::{Arc, Mutex},
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type DeskTerminal = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    init_logging(&config);

    let sources = Arc::new(Sources::new(&config)?);
    let (tx, rx) = mpsc::channel(MESSAGE_QUEUE_CAPACITY);
    let runtime = Runtime::new(sources, tx, config.fetch_timeout);
    let mut dashboard = Dashboard::new(Local::now(), config.cadence);
    info!(
        event = "dashboard_start",
        github_user = config.github.username.is_some(),
        spotify = config.spotify.refresh_token.is_some(),
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
    );

    let mut terminal = setup_terminal()?;
    let result = run_dashboard(&mut terminal, &mut dashboard, &runtime, rx).await;
    restore_terminal(&mut terminal)?;

    if let Err(err) = &result {
        error!(event = "dashboard_error", error = %err);
    }
    result
}

fn setup_terminal() -> Result<DeskTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut DeskTerminal) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_dashboard<F: Fetcher>(
    terminal: &mut DeskTerminal,
    dashboard: &mut Dashboard,
    runtime: &Runtime<F>,
    mut rx: mpsc::Receiver<Message>,
) -> Result<()> {
    runtime.dispatch(dashboard.start());
    let mut events = EventStream::new();

    loop {
        terminal.draw(|frame| ui::render(frame, dashboard.view()))?;

        let message = tokio::select! {
            Some(message) = rx.recv() => message,
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => match input_message(event) {
                    Some(message) => message,
                    // Resizes and ignored input only need a redraw.
                    None => continue,
                },
                Some(Err(err)) => return Err(err.into()),
                None => Message::Quit,
            },
        };

        if let Some(err) = message.failure() {
            warn!(
                event = "poll_failed",
                source = message.label(),
                status = %err.status(),
                class = err.class().as_str(),
                error = %err,
            );
        }

        match dashboard.update(message) {
            Flow::Continue(effects) => runtime.dispatch(effects),
            Flow::Quit => {
                info!(event = "dashboard_quit");
                return Ok(());
            }
        }
    }
}

fn input_message(event: Event) -> Option<Message> {
    match event {
        Event::Key(key) => key_press(key).map(Message::Key),
        _ => None,
    }
}

fn key_press(key: KeyEvent) -> Option<KeyPress> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let press = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => KeyPress::Ctrl(c),
        KeyCode::Char(c) => KeyPress::Char(c),
        _ => KeyPress::Other,
    };
    Some(press)
}

/// Logs never reach stdout while the alternate screen is up.
fn init_logging(config: &Config) {
    let level = if config.debug {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("DESKPULSE_LOG_LEVEL") {
        level
    } else {
        "info".to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.log_file.as_deref().and_then(open_log_file) {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn open_log_file(path: &Path) -> Option<std::fs::File> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("log_file_error: {}: {err}", path.display());
            None
        }
    }
}
