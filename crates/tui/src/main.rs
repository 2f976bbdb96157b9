mod adapter;
mod app;
mod config;
mod events;
mod logging;
mod ui;
mod workers;

use std::{io, time::Duration};

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::{app::App, config::AppConfig, events::EventHandler};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    // The guard must be held for the lifetime of the application to ensure
    // logs are flushed
    let _log_guard = logging::init_logging();

    let config = AppConfig::from_env()?;

    // Restore the terminal before the default panic output, or the message
    // is lost to the alternate screen.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    let mut app = App::new(&config, events.sender())?;

    // Refresh the pipeline list every 15 seconds for the app's lifetime,
    // arming the cache scanner after each pass.
    let poller = workers::spawn_pipeline_poll(app.pipelines_client(), app.scanner(), events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    poller.abort();
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        let Some(event) = events.next().await else {
            break;
        };
        app.handle_event(event);
        // Coalesce bursts (fast log lines, queued keys) into one redraw.
        while let Some(event) = events.try_next() {
            app.handle_event(event);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
