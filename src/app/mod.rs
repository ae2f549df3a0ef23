//! TUI Application module

mod async_ops;
mod events;
mod state;
mod ui;

pub use state::{AppState, CancelChoice, Mode};

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::db::Database;

use async_ops::{AsyncCommand, AsyncHandle, AsyncResult, spawn_worker};

/// Run the composer TUI
pub fn run() -> Result<()> {
    let rt = Runtime::new()?;

    let config = Config::load()?;
    let db = Database::open()?;
    let mut state = AppState::new(config, db)?;

    // The worker runs on the runtime; spawn it from inside a runtime context
    let async_handle = rt.block_on(async { spawn_worker(state.facet_cache.clone()) });

    if let Some(account) = state.account.clone() {
        let _ = async_handle
            .cmd_tx
            .blocking_send(AsyncCommand::Login { account });
        state.set_status("Logging in...");
    } else {
        state.set_status("No account configured. Run `plume auth` first");
    }

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut state, async_handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    mut async_handle: AsyncHandle,
) -> Result<()> {
    loop {
        // Process any async results
        while let Ok(result) = async_handle.result_rx.try_recv() {
            handle_async_result(state, result);
        }

        // Debounced facet detection
        if let Some(text) = state.due_facet_request(Instant::now()) {
            let _ = async_handle
                .cmd_tx
                .blocking_send(AsyncCommand::DetectFacets { text });
        }

        terminal.draw(|frame| ui::render(frame, state))?;

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && let Some(cmd) = events::handle_key(state, key)
        {
            let _ = async_handle.cmd_tx.blocking_send(cmd);
        }

        // Tick for animations
        state.tick();

        if state.should_quit {
            let _ = async_handle.cmd_tx.blocking_send(AsyncCommand::Shutdown);
            break;
        }
    }

    Ok(())
}

fn handle_async_result(state: &mut AppState, result: AsyncResult) {
    match result {
        AsyncResult::LoggedIn { handle } => {
            state.set_status(format!("Logged in as @{handle}"));
            state.session_handle = Some(handle);
        }
        AsyncResult::FacetsDetected { rich_text } => {
            state.apply_detected(rich_text);
        }
        AsyncResult::Posted { url } => {
            state.on_posted(&url);
        }
        AsyncResult::PostFailed { error } => {
            state.on_post_failed(&error);
        }
        AsyncResult::Error { message } => {
            state.set_status(format!("❌ {message}"));
        }
        AsyncResult::Status { message } => {
            state.set_status(message);
        }
    }
}
