use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use todogenius_service::{HttpService, TodoService};
use todogenius_tui::app::App;
use todogenius_tui::config::Config;
use todogenius_tui::logging;
use tracing::info;

/// How long a frame waits for input before the debouncers and remote results get a turn.
const TICK: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let config = Config::parse();
    logging::init(&config.log_path())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let service: Arc<dyn TodoService> = Arc::new(
        HttpService::with_timeout(&config.api_url, config.request_timeout())
            .context("failed to build HTTP client")?,
    );
    info!(api_url = %config.api_url, route = %config.route, "todogenius starting");

    let result = run_tui(service, runtime.handle().clone(), &config);
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

fn run_tui(
    service: Arc<dyn TodoService>,
    runtime: tokio::runtime::Handle,
    config: &Config,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(service, runtime, config.ui(), config.initial_route());
    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }
    info!("todogenius exiting");

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C always quits
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                // q quits unless we're in an input mode
                if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                    break;
                }
                app.handle_key(key);
            }
        }

        app.drain_events();
        app.tick(Instant::now());
    }

    Ok(())
}
