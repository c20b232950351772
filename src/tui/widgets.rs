//! Panes of the studio screen.
//!
//! Text that came from the model (chat turns, link labels, error banners) is
//! run through [`sanitize`] before it reaches a buffer, and link targets are
//! never drawn at all: a link shows its label and the number `/open` takes.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::chat::{parse_links, sanitize, Segment, Sender};
use crate::codec::ImagePayload;
use crate::comparison::SplitView;
use crate::controller::{Phase, SessionView};

use super::state::UiState;

const MUTED: Style = Style::new().fg(Color::DarkGray);
const ACCENT: Style = Style::new().fg(Color::Cyan);
const ERROR: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);
const LINK: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);

pub fn phase_label(phase: Phase) -> (&'static str, Color) {
    match phase {
        Phase::Empty => ("no photo", Color::DarkGray),
        Phase::Uploading => ("loading photo", Color::Yellow),
        Phase::Ready => ("ready", Color::Cyan),
        Phase::Generating => ("designing", Color::Yellow),
        Phase::Styled => ("styled", Color::Green),
        Phase::Refining => ("refining", Color::Yellow),
    }
}

/// Approximate decoded size of a base64 payload.
fn size_label(image: &ImagePayload) -> String {
    let bytes = image.data.len() / 4 * 3;
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{} KB", bytes.div_ceil(1024))
    }
}

pub struct Header<'a> {
    view: &'a SessionView,
}

impl<'a> Header<'a> {
    pub fn new(view: &'a SessionView) -> Self {
        Self { view }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (label, color) = phase_label(self.view.phase);
        let mut spans = vec![
            Span::styled(" AI Interior Designer ", Style::new().add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {label} "), Style::new().fg(Color::Black).bg(color)),
        ];
        if let Some(style) = &self.view.active_style {
            spans.push(Span::styled(format!("  {style}"), ACCENT));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// Before/after strip: the generated design fills the left of the divider,
/// the original the right.
pub struct ComparisonPane<'a> {
    view: &'a SessionView,
    split: &'a SplitView,
}

impl<'a> ComparisonPane<'a> {
    pub fn new(view: &'a SessionView, split: &'a SplitView) -> Self {
        Self { view, split }
    }

    fn render_strip(&self, area: Rect, buf: &mut Buffer) {
        let layout = self.split.layout(area.width as u32);
        let boundary = layout.boundary_x.min(area.width.saturating_sub(1) as u32);
        let after = Style::new().fg(Color::Green);
        for col in 0..area.width {
            let (symbol, style) = if col as u32 == boundary {
                ("┃", Style::new().add_modifier(Modifier::BOLD))
            } else if (col as u32) < layout.generated_width {
                ("█", after)
            } else {
                ("░", MUTED)
            };
            if let Some(cell) = buf.cell_mut((area.x + col, area.y)) {
                cell.set_symbol(symbol).set_style(style);
            }
        }
    }
}

impl Widget for ComparisonPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(" Compare ");
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let view = self.view;
        let Some(generated) = &view.generated else {
            let lines = match (&view.original, view.phase) {
                (_, Phase::Uploading) => vec![Line::from("Processing your image...")],
                (None, _) => vec![
                    Line::from("Upload a photo of your room and watch it transform."),
                    Line::styled("/upload <path>, or drop the file onto this window", MUTED),
                ],
                (Some(original), Phase::Generating) => vec![
                    Line::from(format!(
                        "Designing in {}...",
                        view.active_style.as_deref().unwrap_or("your style")
                    )),
                    Line::styled(format!("original: {} {}", original.media_type, size_label(original)), MUTED),
                ],
                (Some(original), _) => vec![
                    Line::from("Room photo loaded. Pick a style from the list."),
                    Line::styled(format!("original: {} {}", original.media_type, size_label(original)), MUTED),
                ],
            };
            Paragraph::new(lines).wrap(Wrap { trim: false }).render(inner, buf);
            return;
        };

        self.render_strip(Rect { height: 1, ..inner }, buf);

        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("after: {}", view.active_style.as_deref().unwrap_or("design")),
                Style::new().fg(Color::Green),
            ),
            Span::raw(format!("   {:>3}%   ", self.split.position())),
            Span::styled("before", MUTED),
        ])];
        let original = view
            .original
            .as_ref()
            .map(|o| format!("   original: {} {}", o.media_type, size_label(o)))
            .unwrap_or_default();
        lines.push(Line::styled(
            format!("design: {} {}{original}", generated.media_type, size_label(generated)),
            MUTED,
        ));
        lines.push(Line::styled("←/→ move the divider · /export <path> saves the design", MUTED));
        let rest = Rect {
            y: inner.y + 1,
            height: inner.height.saturating_sub(1),
            ..inner
        };
        Paragraph::new(lines).render(rest, buf);
    }
}

/// Conversation as display lines. Links are numbered in transcript order.
pub fn chat_lines(view: &SessionView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut link_no = 0usize;
    for turn in &view.transcript {
        let (prefix, prefix_style) = match turn.sender {
            Sender::User => ("you     ", Style::new().fg(Color::Blue).add_modifier(Modifier::BOLD)),
            Sender::Assistant => ("studio  ", Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
        };
        let mut current = vec![Span::styled(prefix, prefix_style)];

        let segments = match turn.sender {
            Sender::User => vec![Segment::Text(turn.text.as_str())],
            Sender::Assistant => parse_links(&turn.text),
        };
        for segment in segments {
            match segment {
                Segment::Text(text) => {
                    let clean = sanitize(text);
                    let mut parts = clean.split('\n');
                    if let Some(first) = parts.next() {
                        current.push(Span::raw(first.to_string()));
                    }
                    for part in parts {
                        lines.push(Line::from(std::mem::take(&mut current)));
                        current.push(Span::raw(format!("        {part}")));
                    }
                }
                Segment::Link { label, .. } => {
                    link_no += 1;
                    current.push(Span::styled(sanitize(label).replace('\n', " "), LINK));
                    current.push(Span::styled(format!(" [{link_no}]"), MUTED));
                }
            }
        }
        lines.push(Line::from(current));
    }

    match view.phase {
        Phase::Refining => lines.push(Line::styled(
            "studio is typing...",
            MUTED.add_modifier(Modifier::ITALIC),
        )),
        Phase::Generating => lines.push(Line::styled(
            format!("Designing in {}...", view.active_style.as_deref().unwrap_or("your style")),
            MUTED.add_modifier(Modifier::ITALIC),
        )),
        _ if lines.is_empty() => {
            if let Some(hint) = view.chat_hint {
                lines.push(Line::styled(hint, MUTED));
            }
        }
        _ => {}
    }
    lines
}

pub struct ChatPane<'a> {
    view: &'a SessionView,
    scroll_up: u16,
}

impl<'a> ChatPane<'a> {
    pub fn new(view: &'a SessionView, scroll_up: u16) -> Self {
        Self { view, scroll_up }
    }
}

impl Widget for ChatPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(" Conversation ");
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let lines = chat_lines(self.view);
        // Rows after wrapping, so the newest message stays at the bottom.
        let rows: usize = lines
            .iter()
            .map(|l| l.width().max(1).div_ceil(inner.width as usize))
            .sum();
        let top = rows
            .saturating_sub(inner.height as usize)
            .saturating_sub(self.scroll_up as usize);
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((top.min(u16::MAX as usize) as u16, 0))
            .render(inner, buf);
    }
}

pub struct InputBox<'a> {
    state: &'a UiState,
}

impl<'a> InputBox<'a> {
    pub fn new(state: &'a UiState) -> Self {
        Self { state }
    }

    fn placeholder(&self) -> &'static str {
        let view = &self.state.view;
        match view.phase {
            Phase::Empty => "/upload <path> to begin",
            Phase::Uploading => "Processing your image...",
            Phase::Generating | Phase::Refining => "Please wait...",
            Phase::Ready | Phase::Styled => view.chat_hint.unwrap_or("Describe a change"),
        }
    }
}

impl Widget for InputBox<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.state.view.chat_enabled { " Message " } else { " Command " };
        let block = Block::bordered().title(title).border_style(ACCENT);
        let inner = block.inner(area);
        block.render(area, buf);

        let line = if self.state.input.is_empty() {
            Line::from(vec![
                Span::styled("_", ACCENT),
                Span::styled(self.placeholder(), MUTED),
            ])
        } else {
            // Keep the tail visible when the input outgrows the box.
            let width = inner.width.saturating_sub(1) as usize;
            let chars: Vec<char> = self.state.input.chars().collect();
            let visible: String = chars[chars.len().saturating_sub(width)..].iter().collect();
            Line::from(vec![Span::raw(visible), Span::styled("_", ACCENT)])
        };
        Paragraph::new(line).render(inner, buf);
    }
}

pub struct StatusBar<'a> {
    state: &'a UiState,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a UiState) -> Self {
        Self { state }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state;
        let line = if let Some(err) = &state.view.last_error {
            Line::styled(format!(" ! {}", sanitize(err)), ERROR)
        } else if let Some(err) = state.upload.error() {
            Line::styled(format!(" ! {err}"), ERROR)
        } else if let Some(notice) = &state.notice {
            Line::styled(format!(" {}", sanitize(notice)), Style::new().fg(Color::Yellow))
        } else {
            Line::styled(
                " Enter send · ↑↓ style · ←→ divider · PgUp/PgDn scroll · F1 help · Ctrl+C quit",
                MUTED,
            )
        };
        Paragraph::new(line).render(area, buf);
    }
}
