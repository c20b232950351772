//! UI state and its update function.
//!
//! Every key, paste and background result comes in as a [`Message`]; anything
//! that has to leave the UI thread goes out as an [`Action`] for the runner to
//! carry out. Only the paste handler touches the filesystem (to tell a dropped
//! file from typed text).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::chat::{is_web_link, sanitize, transcript_links};
use crate::codec::{ImagePayload, SelectedFile};
use crate::comparison::SplitView;
use crate::controller::SessionView;
use crate::error::StudioError;
use crate::styles::{find_style, DESIGN_STYLES};
use crate::studio::Intent;
use crate::upload::UploadSurface;

/// Arrow-key step for the comparison divider, in percent.
pub const SPLIT_STEP: i32 = 5;
const SCROLL_STEP: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Char(char),
    CharCtrl(char),
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    F(u8),
}

#[derive(Debug)]
pub enum Message {
    Key(InputKey),
    /// Bracketed paste. Terminals paste the path when a file is dropped on them.
    Paste(String),
    UploadFinished(Result<(), StudioError>),
    Exported(Result<PathBuf, StudioError>),
    Tick,
}

#[derive(Debug)]
pub enum Action {
    Dispatch(Intent),
    Upload(SelectedFile),
    Export { image: Arc<ImagePayload>, path: PathBuf },
    OpenLink(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Drop(PathBuf),
    Style(String),
    Split(Option<i32>),
    Nudge(i32),
    Export(PathBuf),
    Open(usize),
    Restart,
    Help,
    Quit,
    Message(String),
    Unknown(String),
    Nothing,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Nothing;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Message(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match (name.to_ascii_lowercase().as_str(), arg.is_empty()) {
        ("upload", false) => Command::Upload(PathBuf::from(arg)),
        ("drop", false) => Command::Drop(PathBuf::from(arg)),
        ("style", false) => Command::Style(arg.to_string()),
        ("split", false) if arg.starts_with(['+', '-']) => match arg.parse() {
            Ok(delta) => Command::Nudge(delta),
            Err(_) => Command::Split(None),
        },
        ("split", _) => Command::Split(arg.parse().ok()),
        ("export", false) => Command::Export(PathBuf::from(arg)),
        ("open", false) => match arg.parse() {
            Ok(n) => Command::Open(n),
            Err(_) => Command::Unknown(line.to_string()),
        },
        ("restart" | "reset", _) => Command::Restart,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

#[derive(Debug)]
pub struct UiState {
    pub view: SessionView,
    pub input: String,
    pub split: SplitView,
    /// Highlighted row in the style list.
    pub selected_style: usize,
    /// Rows scrolled up from the newest message.
    pub chat_scroll: u16,
    pub upload: UploadSurface,
    pub notice: Option<String>,
    pub show_help: bool,
    pub should_quit: bool,
    revision: u64,
}

impl UiState {
    pub fn new(view: SessionView) -> Self {
        Self {
            revision: view.image_revision,
            view,
            input: String::new(),
            split: SplitView::default(),
            selected_style: 0,
            chat_scroll: 0,
            upload: UploadSurface::default(),
            notice: None,
            show_help: false,
            should_quit: false,
        }
    }

    pub fn apply_view(&mut self, view: SessionView) {
        // A replaced image gets a fresh comparison.
        if view.image_revision != self.revision {
            self.split = SplitView::default();
            self.revision = view.image_revision;
        }
        if view.transcript.len() != self.view.transcript.len() {
            self.chat_scroll = 0;
        }
        self.view = view;
    }

    pub fn update(&mut self, msg: Message) -> Option<Action> {
        match msg {
            Message::Key(key) => self.on_key(key),
            Message::Paste(text) => self.on_paste(&text),
            Message::UploadFinished(outcome) => {
                self.upload.record(&outcome);
                None
            }
            Message::Exported(Ok(path)) => {
                self.notice = Some(format!("Saved design to {}", path.display()));
                None
            }
            Message::Exported(Err(e)) => {
                self.notice = Some(e.to_string());
                None
            }
            Message::Tick => None,
        }
    }

    fn on_key(&mut self, key: InputKey) -> Option<Action> {
        if self.show_help {
            match key {
                InputKey::CharCtrl('c') => self.should_quit = true,
                InputKey::Esc | InputKey::Enter | InputKey::F(1) => self.show_help = false,
                _ => {}
            }
            return None;
        }
        match key {
            InputKey::CharCtrl('c' | 'q') => {
                self.should_quit = true;
                None
            }
            InputKey::F(1) => {
                self.show_help = true;
                None
            }
            InputKey::F(_) | InputKey::CharCtrl(_) => None,
            InputKey::Char(c) => {
                self.input.push(c);
                None
            }
            InputKey::Backspace => {
                self.input.pop();
                None
            }
            InputKey::Esc => {
                self.input.clear();
                self.notice = None;
                None
            }
            InputKey::Enter => {
                let line = std::mem::take(&mut self.input);
                if line.trim().is_empty() {
                    self.apply_highlighted_style()
                } else {
                    self.run_command(parse_command(&line))
                }
            }
            InputKey::Up => {
                self.selected_style = self
                    .selected_style
                    .checked_sub(1)
                    .unwrap_or(DESIGN_STYLES.len() - 1);
                None
            }
            InputKey::Down => {
                self.selected_style = (self.selected_style + 1) % DESIGN_STYLES.len();
                None
            }
            InputKey::Left => self.nudge(-SPLIT_STEP),
            InputKey::Right => self.nudge(SPLIT_STEP),
            InputKey::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(SCROLL_STEP);
                None
            }
            InputKey::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(SCROLL_STEP);
                None
            }
        }
    }

    fn on_paste(&mut self, text: &str) -> Option<Action> {
        let candidate = text
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .replace("\\ ", " ");
        if self.input.is_empty() && !candidate.is_empty() && Path::new(&candidate).is_file() {
            return self.run_command(Command::Drop(PathBuf::from(candidate)));
        }
        self.input.push_str(&sanitize(text).replace('\n', " "));
        None
    }

    pub fn run_command(&mut self, command: Command) -> Option<Action> {
        match command {
            Command::Nothing => None,
            Command::Quit => {
                self.should_quit = true;
                None
            }
            Command::Help => {
                self.show_help = true;
                None
            }
            Command::Unknown(line) => {
                self.notice = Some(format!("Unknown command: {} (F1 for help)", sanitize(&line)));
                None
            }
            Command::Upload(path) => self.upload_path(path),
            Command::Drop(path) => {
                self.upload.drag_enter();
                self.upload_path(path)
            }
            Command::Style(query) => self.select_style(&query),
            Command::Split(None) => {
                self.notice = Some("Usage: /split <0-100>".to_string());
                None
            }
            Command::Split(Some(value)) => {
                if self.has_design() {
                    self.split.set_position(value);
                }
                None
            }
            Command::Nudge(delta) => self.nudge(delta),
            Command::Export(path) => match &self.view.generated {
                None => {
                    self.notice = Some("Nothing to export yet.".to_string());
                    None
                }
                Some(image) => Some(Action::Export {
                    image: image.clone(),
                    path,
                }),
            },
            Command::Open(n) => self.open_link(n),
            Command::Restart => {
                self.notice = None;
                Some(Action::Dispatch(Intent::StartOver))
            }
            Command::Message(text) => {
                if self.view.refining {
                    self.notice = Some("Please wait for the current change to finish.".to_string());
                    None
                } else if !self.view.chat_enabled {
                    self.notice = Some("Select a style first, then describe your changes.".to_string());
                    None
                } else {
                    self.notice = None;
                    Some(Action::Dispatch(Intent::SendMessage(text)))
                }
            }
        }
    }

    fn has_design(&mut self) -> bool {
        if self.view.generated.is_none() {
            self.notice = Some("Nothing to compare yet.".to_string());
            return false;
        }
        true
    }

    fn nudge(&mut self, delta: i32) -> Option<Action> {
        if self.has_design() {
            self.split.drag_by(delta);
        }
        None
    }

    fn upload_path(&mut self, path: PathBuf) -> Option<Action> {
        // A rejected file stays here; the error shows on the status line.
        self.upload.validate(path).ok().map(Action::Upload)
    }

    fn apply_highlighted_style(&mut self) -> Option<Action> {
        let name = DESIGN_STYLES.get(self.selected_style)?.name;
        self.select_style(name)
    }

    fn select_style(&mut self, query: &str) -> Option<Action> {
        let Some(style) = find_style(query) else {
            self.notice = Some(format!("Unknown style: {}", sanitize(query)));
            return None;
        };
        if let Some(i) = DESIGN_STYLES.iter().position(|s| s.name == style.name) {
            self.selected_style = i;
        }
        if self.view.original.is_none() {
            self.notice = Some("Upload a room photo first.".to_string());
            return None;
        }
        if !self.view.styles_enabled {
            self.notice = Some("Please wait for the current design to finish.".to_string());
            return None;
        }
        self.notice = None;
        Some(Action::Dispatch(Intent::SelectStyle(style.name.to_string())))
    }

    fn open_link(&mut self, n: usize) -> Option<Action> {
        let links = transcript_links(&self.view.transcript);
        let url = n.checked_sub(1).and_then(|i| links.get(i)).map(|u| u.trim().to_string());
        match url {
            None => {
                self.notice = Some(format!("There is no link {n}."));
                None
            }
            Some(url) if !is_web_link(&url) => {
                self.notice = Some("Only web links can be opened.".to_string());
                None
            }
            Some(url) => Some(Action::OpenLink(url)),
        }
    }
}
