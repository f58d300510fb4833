use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use inspire_core::Config;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "inspire-chat")]
#[command(version, about = "Terminal chat client for Inspire conversations")]
struct Cli {
    /// Page URL; a `conversation_id` query resumes that conversation
    #[arg(long)]
    page_url: Option<String>,
    /// Chat submission endpoint
    #[arg(long)]
    endpoint: Option<String>,
    /// CSRF token sent as X-CSRFToken; wins over INSPIRE_CSRF_TOKEN and the config file
    #[arg(long)]
    csrf_token: Option<String>,
    /// Start a new conversation instead of resuming the saved one
    #[arg(long)]
    fresh: bool,
    /// Show message text as typed, without bold/italic/code markup
    #[arg(long)]
    no_markdown: bool,
    /// Enter inserts a newline; send with Ctrl+S
    #[arg(long)]
    no_shortcuts: bool,
    /// Do not follow new messages
    #[arg(long)]
    no_auto_scroll: bool,
    /// Start in normal mode instead of typing
    #[arg(long)]
    no_auto_focus: bool,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    debug: bool,
    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags override the config file for this run only.
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.page_url {
            config.page_url = Some(url.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        let settings = &mut config.settings;
        settings.enable_markdown &= !self.no_markdown;
        settings.enable_keyboard_shortcuts &= !self.no_shortcuts;
        settings.enable_auto_scroll &= !self.no_auto_scroll;
        settings.enable_auto_focus &= !self.no_auto_focus;
    }

    /// A saved location only makes sense against the configured server.
    fn overrides_server(&self) -> bool {
        self.page_url.is_some() || self.endpoint.is_some()
    }

    fn csrf_token(&self, config: &Config) -> Option<String> {
        self.csrf_token.clone().or_else(|| config.csrf_token())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_path = logging::init(cli.log_file.clone(), cli.debug)?;

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable, using defaults");
        Config::new()
    });
    cli.apply(&mut config);
    tracing::info!(log = %log_path.display(), settings = ?config.settings, "starting");

    let mut events = EventHandler::new();
    let mut app = App::new(&config, cli.fresh, cli.csrf_token(&config), events.sender())?;
    if cli.overrides_server() {
        tracing::info!("server given on the command line; conversation location not saved");
    } else {
        app.location_store = Config::get_config_path().ok();
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
