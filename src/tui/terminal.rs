//! Terminal setup and restoration

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use std::io::stdout;

/// Install a panic hook that restores the terminal
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::execute!(stdout(), DisableBracketedPaste);
        ratatui::restore();
        original_hook(panic_info);
    }));
}

/// Dropped files arrive as a pasted path, so paste must come through as one event.
pub fn enable_paste() -> std::io::Result<()> {
    crossterm::execute!(stdout(), EnableBracketedPaste)
}

pub fn disable_paste() {
    let _ = crossterm::execute!(stdout(), DisableBracketedPaste);
}
