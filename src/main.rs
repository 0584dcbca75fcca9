//! cpratings - Codeforces and CodeChef ratings in the terminal
//!
//! Shows both ratings with fallbacks, either as an interactive view with
//! manual refresh or as a one-shot report.

use std::io;
use std::panic;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use cpratings::app::App;
use cpratings::cli::{Cli, Command, Settings};
use cpratings::{logging, ui, AggregateState, RatingAggregator, RatingCache, RatingTracker};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Runs the interactive view until the user quits
async fn run_watch(tracker: Arc<RatingTracker>) -> Result<(), Box<dyn std::error::Error>> {
    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(tracker.subscribe(), tracker.config().clone());

    // Initial render shows the fallbacks while the first cycle runs
    terminal.draw(|f| ui::render(f, &app))?;

    let loader = Arc::clone(&tracker);
    tokio::spawn(async move {
        loader.load().await;
    });

    // Main event loop
    loop {
        app.sync();
        terminal.draw(|f| ui::render(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.take_refresh_request() {
            let refresher = Arc::clone(&tracker);
            tokio::spawn(async move {
                refresher.refresh().await;
            });
        }

        if app.should_quit {
            break;
        }
    }

    tracker.aggregator().shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

/// Prints one state as plain text
fn print_state(tracker: &RatingTracker, state: &AggregateState) {
    let config = tracker.config();
    println!(
        "Codeforces ({}): {}",
        config.codeforces_handle, state.ratings.codeforces
    );
    println!(
        "CodeChef ({}): {}",
        config.codechef_handle, state.ratings.codechef
    );
    if let Some(error) = &state.error {
        println!("Error: {}", error);
    }
    if let Some(updated) = state.last_updated {
        println!("Last updated: {}", updated.format("%H:%M:%S"));
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    logging::init(settings.verbosity, &settings.log_target())?;

    let aggregator = Arc::new(RatingAggregator::new(
        settings.provider_client(),
        RatingCache::with_ttl(settings.cache_ttl),
    ));
    let tracker = Arc::new(RatingTracker::new(
        Arc::clone(&aggregator),
        settings.tracker.clone(),
    ));
    info!(
        codeforces = %settings.tracker.codeforces_handle,
        codechef = %settings.tracker.codechef_handle,
        "tracking ratings"
    );

    match &settings.command {
        Command::Watch => run_watch(tracker).await?,
        Command::Show { json } => {
            let state = tracker.load().await;
            if *json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_state(&tracker, &state);
            }
        }
        Command::Probe => {
            let results = aggregator
                .probe(
                    &settings.tracker.codeforces_handle,
                    &settings.tracker.codechef_handle,
                )
                .await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
