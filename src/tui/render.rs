//! Screen layout: header, style list, comparison strip, conversation, input
//! box and status line, with the help overlay on top when open.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::styles::DESIGN_STYLES;

use super::state::UiState;
use super::widgets::{ChatPane, ComparisonPane, Header, InputBox, StatusBar};

pub const HELP: &str = "\
/upload <path>     load a room photo (or drop the file on the window)
/style <name|n>    restyle the room (or ↑↓ and Enter)
/split <0-100>     place the divider (+n / -n to drag, or ←→)
/open <n>          open shopping link n in the browser
/export <path>     save the current design
/restart           start over
/quit              leave (Ctrl+C)

Anything else is sent to the designer as a change request.";

const SIDEBAR_WIDTH: u16 = 26;

pub fn view(frame: &mut Frame, state: &UiState) {
    let [header, body, input, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(8),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());
    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)]).areas(body);
    let [compare, chat] =
        Layout::vertical([Constraint::Length(6), Constraint::Min(3)]).areas(main);

    frame.render_widget(Header::new(&state.view), header);
    render_styles(frame, sidebar, state);
    frame.render_widget(ComparisonPane::new(&state.view, &state.split), compare);
    frame.render_widget(ChatPane::new(&state.view, state.chat_scroll), chat);
    frame.render_widget(InputBox::new(state), input);
    frame.render_widget(StatusBar::new(state), status);

    if state.show_help {
        render_help(frame, frame.area());
    }
}

fn render_styles(frame: &mut Frame, area: Rect, state: &UiState) {
    let [list_area, preview_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(area);
    let enabled = state.view.styles_enabled;

    let items: Vec<ListItem> = DESIGN_STYLES
        .iter()
        .enumerate()
        .map(|(i, style)| {
            let active = state.view.active_style.as_deref() == Some(style.name);
            let marker = if active { "●" } else { " " };
            let line = format!("{marker}{:>2} {}", i + 1, style.name);
            if enabled {
                ListItem::new(line)
            } else {
                ListItem::new(line).style(Style::new().fg(Color::DarkGray))
            }
        })
        .collect();

    let list = List::new(items)
        .block(Block::bordered().title(" Styles "))
        .highlight_style(Style::new().add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default().with_selected(Some(state.selected_style));
    frame.render_stateful_widget(list, list_area, &mut list_state);

    if let Some(style) = DESIGN_STYLES.get(state.selected_style) {
        let preview = Paragraph::new(Line::styled(style.preview_ref, Style::new().fg(Color::DarkGray)))
            .block(Block::bordered().title(" Preview "));
        frame.render_widget(preview, preview_area);
    }
}

fn render_help(frame: &mut Frame, area: Rect) {
    let width = 70.min(area.width.saturating_sub(4));
    let height = 14.min(area.height.saturating_sub(2));
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);
    let help = Paragraph::new(HELP)
        .wrap(Wrap { trim: false })
        .block(Block::bordered().title(" Help (Esc to close) ").border_style(Style::new().fg(Color::Yellow)));
    frame.render_widget(help, popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ImagePayload;
    use crate::controller::Controller;
    use crate::error::StudioError;
    use crate::service::GenerationResult;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(state: &UiState) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| view(frame, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn styled(text: &str) -> Controller {
        let mut c = Controller::new();
        c.upload(ImagePayload::new("T1JJRw==", "image/jpeg"));
        let t = c.begin_stylize("Coastal").unwrap();
        c.finish_stylize(
            t,
            Ok(GenerationResult {
                image: ImagePayload::new("R0VO", "image/png"),
                text: text.into(),
            }),
        );
        c
    }

    #[test]
    fn empty_session_invites_an_upload() {
        let screen = draw(&UiState::new(Controller::new().view()));
        assert!(screen.contains("AI Interior Designer"));
        assert!(screen.contains("Upload a photo of your room"));
        assert!(screen.contains("Mid-Century Modern"));
        assert!(screen.contains("no photo"));
    }

    #[test]
    fn model_text_cannot_reach_the_terminal_as_escapes() {
        let c = styled("hi\x1b]0;pwned\x07 [Lamp](http://a\x1b\\evil)\u{9b}2J");
        let screen = draw(&UiState::new(c.view()));
        assert!(!screen.chars().any(|ch| ch.is_control()));
        assert!(screen.contains("hi]0;pwned Lamp [1]"));
        assert!(!screen.contains("evil"));
    }

    #[test]
    fn styled_session_shows_comparison_and_active_style() {
        let c = styled("Welcome to your coastal room");
        let screen = draw(&UiState::new(c.view()));
        assert!(screen.contains("after: Coastal"));
        assert!(screen.contains("50%"));
        assert!(screen.contains("┃"));
        assert!(screen.contains("●"));
        assert!(screen.contains("Welcome to your coastal room"));
    }

    #[test]
    fn refine_failure_shows_banner_and_apology() {
        let mut c = styled("Hi");
        let t = c.begin_refine("add a piano").unwrap();
        c.finish_refine(t, Err(StudioError::RefinementFailed("Failed to refine image.".into())));
        let screen = draw(&UiState::new(c.view()));
        assert!(screen.contains("! Failed to refine image."));
        assert!(screen.contains("Sorry, I couldn't make that change."));
    }

    #[test]
    fn help_overlay_lists_commands() {
        let mut state = UiState::new(Controller::new().view());
        state.show_help = true;
        let screen = draw(&state);
        assert!(screen.contains("/export <path>"));
    }
}
