//! Session state machine.
//!
//! Every request is split into a `begin_*` transition that validates the guard
//! and hands back a ticket, and a `finish_*` transition that applies the
//! outcome. A ticket is only honoured while its session is still current, so
//! a reply that lands after StartOver or a fresh upload is dropped.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::ChatTurn;
use crate::codec::ImagePayload;
use crate::error::StudioError;
use crate::service::GenerationResult;

pub const HINT_SELECT_STYLE: &str = "Select a style to begin designing";
pub const HINT_REFINE: &str = "Refine your design here (e.g., 'make the rug blue')";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Uploading,
    Ready,
    Generating,
    Styled,
    Refining,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub original: Option<Arc<ImagePayload>>,
    pub generated: Option<Arc<ImagePayload>>,
    pub active_style: Option<String>,
    pub transcript: Vec<ChatTurn>,
    pub generating: bool,
    pub refining: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StylizeTicket {
    pub session: Uuid,
    pub style: String,
    pub original: Arc<ImagePayload>,
}

#[derive(Debug, Clone)]
pub struct RefineTicket {
    pub session: Uuid,
    pub instruction: String,
    pub current: Arc<ImagePayload>,
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub phase: Phase,
    pub original: Option<Arc<ImagePayload>>,
    pub generated: Option<Arc<ImagePayload>>,
    pub active_style: Option<String>,
    pub transcript: Vec<ChatTurn>,
    pub generating: bool,
    pub refining: bool,
    pub last_error: Option<String>,
    /// Bumps whenever `generated` is replaced.
    pub image_revision: u64,
    pub chat_enabled: bool,
    pub styles_enabled: bool,
    pub chat_hint: Option<&'static str>,
}

#[derive(Debug)]
pub struct Controller {
    state: SessionState,
    session: Uuid,
    uploading: bool,
    image_revision: u64,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            state: SessionState::default(),
            session: Uuid::new_v4(),
            uploading: false,
            image_revision: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    fn busy(&self) -> bool {
        self.state.generating || self.state.refining
    }

    pub fn phase(&self) -> Phase {
        let s = &self.state;
        if self.uploading {
            Phase::Uploading
        } else if s.original.is_none() {
            Phase::Empty
        } else if s.generating {
            Phase::Generating
        } else if s.refining {
            Phase::Refining
        } else if s.generated.is_some() {
            Phase::Styled
        } else {
            Phase::Ready
        }
    }

    pub fn view(&self) -> SessionView {
        let s = &self.state;
        let chat_enabled = s.generated.is_some() && !self.busy();
        let chat_hint = match (s.transcript.is_empty(), s.generated.is_some()) {
            (true, false) => Some(HINT_SELECT_STYLE),
            (true, true) => Some(HINT_REFINE),
            _ => None,
        };
        SessionView {
            phase: self.phase(),
            original: s.original.clone(),
            generated: s.generated.clone(),
            active_style: s.active_style.clone(),
            transcript: s.transcript.clone(),
            generating: s.generating,
            refining: s.refining,
            last_error: s.last_error.clone(),
            image_revision: self.image_revision,
            chat_enabled,
            styles_enabled: s.original.is_some() && !self.busy() && !self.uploading,
            chat_hint,
        }
    }

    /// Marks a file read in progress. Session data is untouched until `upload`.
    pub fn begin_upload(&mut self) -> bool {
        if self.uploading {
            return false;
        }
        self.uploading = true;
        true
    }

    pub fn abort_upload(&mut self) {
        self.uploading = false;
    }

    /// Installs a new original and clears everything derived from the old one.
    pub fn upload(&mut self, image: ImagePayload) {
        self.reset_session();
        self.state.original = Some(Arc::new(image));
        info!(session = %self.session, "original image uploaded");
    }

    pub fn start_over(&mut self) {
        self.reset_session();
        self.state.original = None;
        info!(session = %self.session, "session reset");
    }

    fn reset_session(&mut self) {
        let revision = self.image_revision;
        *self = Self::new();
        // Keep counting so a recreated comparison view never sees a stale revision.
        self.image_revision = revision + 1;
    }

    pub fn begin_stylize(&mut self, style: &str) -> Option<StylizeTicket> {
        if self.busy() || self.uploading {
            debug!(style, "style selection ignored while busy");
            return None;
        }
        let original = self.state.original.clone()?;
        self.state.active_style = Some(style.to_string());
        self.state.generated = None;
        self.state.transcript.clear();
        self.state.last_error = None;
        self.state.generating = true;
        self.image_revision += 1;
        Some(StylizeTicket {
            session: self.session,
            style: style.to_string(),
            original,
        })
    }

    /// Returns false when the ticket is stale and nothing was applied.
    pub fn finish_stylize(
        &mut self,
        ticket: StylizeTicket,
        outcome: Result<GenerationResult, StudioError>,
    ) -> bool {
        if ticket.session != self.session || !self.state.generating {
            warn!(style = %ticket.style, "discarding stale stylize result");
            return false;
        }
        self.state.generating = false;
        match outcome {
            Ok(result) => {
                let caption = if result.text.trim().is_empty() {
                    format!("Here is your room in a {} style!", ticket.style)
                } else {
                    result.text
                };
                self.state.generated = Some(Arc::new(result.image));
                self.state.transcript = vec![ChatTurn::assistant(caption)];
                self.image_revision += 1;
            }
            Err(e) => {
                warn!(kind = e.kind(), style = %ticket.style, "stylize failed");
                self.state.last_error = Some(e.to_string());
            }
        }
        true
    }

    /// Appends the user's turn right away; the reply arrives via `finish_refine`.
    pub fn begin_refine(&mut self, text: &str) -> Option<RefineTicket> {
        let text = text.trim();
        if text.is_empty() || self.busy() || self.uploading {
            return None;
        }
        let current = self.state.generated.clone()?;
        self.state.refining = true;
        self.state.last_error = None;
        self.state.transcript.push(ChatTurn::user(text));
        Some(RefineTicket {
            session: self.session,
            instruction: text.to_string(),
            current,
        })
    }

    pub fn finish_refine(
        &mut self,
        ticket: RefineTicket,
        outcome: Result<GenerationResult, StudioError>,
    ) -> bool {
        if ticket.session != self.session || !self.state.refining {
            warn!("discarding stale refine result");
            return false;
        }
        self.state.refining = false;
        match outcome {
            Ok(result) => {
                self.state.generated = Some(Arc::new(result.image));
                self.state.transcript.push(ChatTurn::assistant(result.text));
                self.image_revision += 1;
            }
            Err(e) => {
                warn!(kind = e.kind(), "refine failed");
                let message = e.to_string();
                self.state.transcript.push(ChatTurn::assistant(format!(
                    "Sorry, I couldn't make that change. {message}"
                )));
                self.state.last_error = Some(message);
            }
        }
        true
    }
}
