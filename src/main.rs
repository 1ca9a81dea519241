mod app;
mod backend;
mod cli;
mod config;
mod event;
mod model;
mod services;
mod ui;

#[cfg(test)]
mod testing;

use std::io;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::{Action, App, ChannelNotifier};
use backend::rest::RestBackend;
use cli::Invocation;
use services::{ActionContext, Notifier};

/// Logs go to a file in the data directory; the terminal belongs to the
/// dashboard.
fn init_logging() -> Result<WorkerGuard> {
    let dir = config::data_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        &dir,
        "equitydesk.log",
    ));
    let filter = EnvFilter::try_from_env("EQUITYDESK_LOG")
        .unwrap_or_else(|_| EnvFilter::new("equitydesk=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = cli::parse_args(&args)?;
    if invocation == Invocation::Help {
        cli::print_help();
        return Ok(());
    }

    let log_guard = init_logging()?;

    // Load config
    let config = config::load_config()?;
    let backend_config = config.backend()?;
    let session = config.session()?;

    let rest = Arc::new(
        RestBackend::new(
            &backend_config.url,
            backend_config.anon_key.clone(),
            session.access_token.clone(),
            config.storage.bucket.clone(),
            Duration::from_secs(backend_config.timeout_secs),
        )
        .context("Failed to build HTTP client")?,
    );
    let shutdown = CancellationToken::new();

    if let Invocation::Run(command) = invocation {
        let notifier: Arc<dyn Notifier> = Arc::new(cli::ConsoleNotifier);
        let ctx = ActionContext::new(rest.clone(), rest, session, notifier, shutdown);
        let ok = cli::run(command, &ctx).await?;
        if !ok {
            drop(log_guard);
            std::process::exit(1);
        }
        return Ok(());
    }

    // Set up action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let notifier = Arc::new(ChannelNotifier::new(action_tx.clone()));
    let ctx = ActionContext::new(rest.clone(), rest, session, notifier, shutdown.clone());
    let mut app = App::new(ctx, action_tx.clone());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Spawn event reader
    let event_tx = action_tx.clone();
    let event_shutdown = shutdown.clone();
    tokio::spawn(async move {
        event::run_event_loop(event_tx, event_shutdown).await;
    });

    tracing::info!("dashboard started");
    app.start();

    // Main loop
    loop {
        terminal.draw(|f| ui::render(f, &app))?;

        if let Some(action) = action_rx.recv().await {
            app.update(action);
            if app.should_quit {
                break;
            }
        } else {
            break;
        }
    }

    // Abandon in-flight requests
    shutdown.cancel();

    // Restore terminal
    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
