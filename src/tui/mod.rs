//! Terminal front end built on ratatui.
//!
//! The loop mirrors the studio's published [`SessionView`] into [`UiState`],
//! drains results from background work, draws, and then polls the terminal.
//!
//! [`SessionView`]: crate::controller::SessionView

pub mod actions;
pub mod event;
pub mod render;
pub mod state;
pub mod terminal;
pub mod widgets;

use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::studio::StudioHandle;

use state::{Command, Message, UiState};

/// Runs the UI until the user quits or the studio stops.
pub async fn run(studio: StudioHandle, initial: Option<PathBuf>) -> Result<()> {
    terminal::install_panic_hook();
    let mut term = ratatui::init();
    if let Err(e) = terminal::enable_paste() {
        warn!(error = %e, "bracketed paste unavailable, dropped files will not be detected");
    }

    let result = run_loop(&mut term, &studio, initial);

    terminal::disable_paste();
    ratatui::restore();
    result
}

fn run_loop(
    terminal: &mut ratatui::DefaultTerminal,
    studio: &StudioHandle,
    initial: Option<PathBuf>,
) -> Result<()> {
    let mut views = studio.subscribe();
    let mut state = UiState::new(views.borrow_and_update().clone());
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Message>();

    if let Some(path) = initial {
        if let Some(action) = state.run_command(Command::Upload(path)) {
            actions::execute(action, &mut state, studio, &msg_tx);
        }
    }

    while !state.should_quit {
        match views.has_changed() {
            Ok(true) => state.apply_view(views.borrow_and_update().clone()),
            Ok(false) => {}
            Err(_) => {
                warn!("studio stopped, closing the window");
                break;
            }
        }

        while let Ok(msg) = msg_rx.try_recv() {
            if let Some(action) = state.update(msg) {
                actions::execute(action, &mut state, studio, &msg_tx);
            }
        }

        terminal.draw(|frame| render::view(frame, &state))?;

        if let Some(msg) = event::poll()? {
            if let Some(action) = state.update(msg) {
                actions::execute(action, &mut state, studio, &msg_tx);
            }
        }
    }

    info!("ui closed");
    Ok(())
}
