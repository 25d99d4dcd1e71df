use std::io;
use std::sync::Arc;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use miette::{Context, IntoDiagnostic};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use pokedex::catalog::{FileQueryStore, HttpCatalogClient, QueryStore};
use pokedex::config::AppConfig;
use pokedex::tui::app::AppState;
use pokedex::tui::services::Services;

/// Query part of a deep link: `?page=3&type=Fire`, a full URL, or a bare
/// `page=3&type=Fire`.
fn deep_link_query(arg: &str) -> &str {
    match arg.split_once('?') {
        Some((_, query)) => query,
        None => arg,
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let (config, config_warning) = AppConfig::load();

    // Initialize logging (file only, the terminal belongs to the UI)
    let _log_guard = pokedex::core::logging::init_tui(&config.data_dir().join("logs"));
    log::info!("Pokedex v{} starting", pokedex::VERSION);
    if let Some(warning) = config_warning {
        log::warn!("{warning}");
    }
    log::info!("Using catalog API at {}", config.api.base_url);

    // A deep link replaces the persisted session query
    let store: Box<dyn QueryStore + Send> = match std::env::args().nth(1) {
        Some(link) => {
            let query = deep_link_query(&link);
            log::info!("Opening deep link '{query}'");
            Box::new(FileQueryStore::open_with_query(config.session_path(), query))
        }
        None => Box::new(FileQueryStore::open(config.session_path())),
    };

    let client = HttpCatalogClient::new(config.api.base_url.clone(), config.api.timeout())
        .into_diagnostic()
        .wrap_err("Failed to build catalog client")?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let services = Services::new(Arc::new(client), event_tx);
    let mut app = AppState::new(&config, store, event_rx, services);

    // Setup terminal
    enable_raw_mode().into_diagnostic()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).into_diagnostic()?;
    if config.tui.mouse_enabled {
        execute!(stdout, EnableMouseCapture).into_diagnostic()?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).into_diagnostic()?;

    // Run the app
    let result = app.run(&mut terminal, config.tui.tick_rate()).await;

    // Restore terminal
    disable_raw_mode().into_diagnostic()?;
    if config.tui.mouse_enabled {
        execute!(terminal.backend_mut(), DisableMouseCapture).into_diagnostic()?;
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen).into_diagnostic()?;
    terminal.show_cursor().into_diagnostic()?;

    log::info!("Pokedex exiting");
    result.into_diagnostic()
}
