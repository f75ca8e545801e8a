use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use rapidscale_chat::{AskClient, Chat, Config};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "rapidscale", version)]
#[command(about = "Chat with the RapidScale AI assistant from your terminal")]
struct Cli {
    /// Backend endpoint that answers questions
    #[arg(short, long, env = "RAPIDSCALE_ENDPOINT")]
    endpoint: Option<String>,
    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,
    /// Pause between revealed words, in milliseconds
    #[arg(long)]
    typing_delay: Option<u64>,
    /// Write the resolved settings to the config file and exit
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(delay) = self.typing_delay {
            config.typing_delay_ms = delay;
        }
        config
    }
}

fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("rapidscale")
}

/// The terminal belongs to the UI, so logs go to a daily file.
fn init_logging() -> Result<WorkerGuard> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Could not create log directory {:?}", dir))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
        &dir,
        "rapidscale.log",
    ));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rapidscale_chat=info,rapidscale=info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging()?;

    // Load config
    let config = cli.apply(Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not read config, using defaults");
        Config::new()
    }));

    if cli.save_config {
        let path = config.save()?;
        println!("Saved settings to {}", path.display());
        return Ok(());
    }

    let client = AskClient::new(&config.endpoint, config.request_timeout())?;
    tracing::info!(endpoint = client.endpoint(), timeout = ?config.request_timeout(), "starting chat");

    let mut app = App::new(Chat::new(client, config.chat_options()));
    app.check_health();

    tui::install_panic_hook();
    let (mut terminal, _terminal_guard) = tui::init()?;
    let result = run(&mut terminal, &mut app).await;

    app.chat.teardown();
    tracing::info!("exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event),
                None => break,
            },
            _ = app.chat.advance(), if app.chat.is_busy() => {}
        }

        app.poll_health();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "rapidscale",
            "--endpoint",
            "http://example.test:9000/ask",
            "--typing-delay",
            "0",
        ]);
        let config = cli.apply(Config::new());
        assert_eq!(config.endpoint, "http://example.test:9000/ask");
        assert_eq!(config.typing_delay_ms, 0);
        assert_eq!(config.request_timeout_secs, Config::new().request_timeout_secs);
    }

    #[test]
    fn test_cli_defaults_leave_config_alone() {
        let cli = Cli::parse_from(["rapidscale", "--timeout", "5"]);
        let mut expected = Config::new();
        expected.request_timeout_secs = 5;
        if let Some(endpoint) = &cli.endpoint {
            // RAPIDSCALE_ENDPOINT may be set in the environment running the tests.
            expected.endpoint = endpoint.clone();
        }
        assert_eq!(cli.apply(Config::new()), expected);
    }
}
