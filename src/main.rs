use std::{fs::File, io::stdout};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{LevelFilter, WriteLogger};

use manga_pager::event_source::KeyboardEventSource;
use manga_pager::main_app::{App, ReaderConfig, run_app_with_event_source};
use manga_pager::panic_handler;
use manga_pager::settings;

const DEFAULT_PAGE_COUNT: usize = 24;

fn page_count_from_args() -> Result<usize> {
    match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid page count {arg:?}")),
        None => Ok(DEFAULT_PAGE_COUNT),
    }
}

fn main() -> Result<()> {
    // Initialize panic handler first, before any other setup
    panic_handler::initialize_panic_handler();

    WriteLogger::init(
        LevelFilter::Debug,
        simplelog::ConfigBuilder::new()
            .set_max_level(LevelFilter::Debug)
            .build(),
        File::create("manga-pager.log")?,
    )?;

    info!("Starting manga-pager");

    let page_count = page_count_from_args()?;

    // Load settings from ~/.manga_pager_settings.yaml
    settings::load_settings();
    let mut saved_settings = settings::get_settings();
    let mut app = App::with_page_count(page_count, ReaderConfig::from(&saved_settings))?;

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();

    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    // Restore terminal state
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    app.config().apply_to(&mut saved_settings);
    settings::set_settings(saved_settings);

    info!("Shutting down manga-pager");
    Ok(())
}
