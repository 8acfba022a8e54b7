// gridscope - terminal client for a power-grid simulator
// Keeps a local snapshot of the grid in sync with the simulator and draws it

mod api;
mod app;
mod model;
mod push;
mod scene;
mod sync;
mod theme;
mod ui;

use anyhow::{Context, Result};
use api::{parse_server_url, HttpSimulatorApi};
use app::config::{ClientConfig, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SERVER, TICK_INTERVAL};
use app::{event::handle_key_event, AppState, Task, TaskRunner};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self as std_mpsc, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Forwards formatted log output to the notices panel
struct ChannelWriter {
    sender: Sender<String>,
}

impl io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal client for the power-grid simulator", long_about = None)]
struct Cli {
    /// Simulator base URL
    #[arg(long, default_value = DEFAULT_SERVER)]
    server: String,

    /// Scenario to load on startup
    #[arg(long)]
    scenario: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    request_timeout_ms: u64,

    /// Do not listen for push notifications; refresh with `r` only
    #[arg(long)]
    no_push: bool,

    /// Write logs to this file instead of the notices panel
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(parse_server_url(&self.server)?);
        config.request_timeout = Duration::from_millis(self.request_timeout_ms);
        config.push_enabled = !self.no_push;
        config.startup_scenario = self.scenario.clone();
        Ok(config)
    }
}

/// Install the tracing subscriber
///
/// Returns the receiving end of the log channel when logs go to the
/// notices panel rather than a file.
fn init_logging(log_file: Option<&Path>) -> Result<Option<Receiver<String>>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gridscope=info,warn"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            Ok(None)
        }
        None => {
            let (log_tx, log_rx) = std_mpsc::channel();
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .compact()
                .with_ansi(false)
                .without_time()
                .with_writer(move || ChannelWriter {
                    sender: log_tx.clone(),
                })
                .init();
            Ok(Some(log_rx))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_rx = init_logging(cli.log_file.as_deref())?;
    let config = cli.client_config()?;
    let api = Arc::new(HttpSimulatorApi::new(
        config.server.clone(),
        config.request_timeout,
    )?);
    tracing::info!(server = %config.server, push = config.push_enabled, "Starting gridscope");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let res = run_app(&mut terminal, api, config, log_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }
    Ok(())
}

fn drain_logs(app: &mut AppState, log_rx: Option<&Receiver<String>>) {
    if let Some(rx) = log_rx {
        while let Ok(output) = rx.try_recv() {
            app.push_log_output(&output);
        }
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    api: Arc<HttpSimulatorApi>,
    config: ClientConfig,
    log_rx: Option<Receiver<String>>,
) -> Result<()> {
    let mut app = AppState::new(config.push_enabled);
    terminal.draw(|f| ui::draw(f, &mut app))?;

    app.bootstrap(&*api, config.startup_scenario.as_deref())
        .await;

    let (task_tx, mut task_rx) = mpsc::unbounded_channel();
    let runner = TaskRunner::new(api, task_tx);
    runner.spawn_all(vec![Task::FetchCatalog, Task::FetchStatus]);
    runner.spawn_all(app.request_weather());

    let (push_tx, mut push_rx) = mpsc::unbounded_channel();
    if config.push_enabled {
        push::spawn_listener(config.server.clone(), push_tx);
    } else {
        drop(push_tx);
    }

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            Some(event) = push_rx.recv() => {
                let tasks = app.on_push_event(event);
                runner.spawn_all(tasks);
            }
            Some(result) = task_rx.recv() => {
                let tasks = app.on_task_result(result);
                runner.spawn_all(tasks);
            }
            _ = ticker.tick() => {
                drain_logs(&mut app, log_rx.as_ref());

                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind == KeyEventKind::Press {
                            let tasks = handle_key_event(&mut app, key.code);
                            runner.spawn_all(tasks);
                        }
                    }
                }

                terminal.draw(|f| ui::draw(f, &mut app))?;

                if !app.running {
                    return Ok(());
                }
            }
        }
    }
}
