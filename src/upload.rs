use std::path::PathBuf;
use tracing::warn;

use crate::codec::{encode_file, SelectedFile};
use crate::error::StudioError;
use crate::studio::{Intent, StudioHandle};

/// Drop target / file picker. Keeps its own validation error; a rejected file
/// never reaches the studio.
#[derive(Debug, Default)]
pub struct UploadSurface {
    drag_over: bool,
    error: Option<String>,
}

impl UploadSurface {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn drag_over(&self) -> bool {
        self.drag_over
    }

    pub fn drag_enter(&mut self) {
        self.drag_over = true;
    }

    /// Local type check only. Returns the file when it may be handed on.
    pub fn validate(&mut self, path: impl Into<PathBuf>) -> Result<SelectedFile, StudioError> {
        self.drag_over = false;
        let file = SelectedFile::from_path(path);
        if !file.is_image() {
            let err = StudioError::UnsupportedFileType {
                declared: file.declared_type.clone(),
            };
            self.error = Some(err.to_string());
            return Err(err);
        }
        self.error = None;
        Ok(file)
    }

    pub fn record(&mut self, outcome: &Result<(), StudioError>) {
        self.error = outcome.as_ref().err().map(ToString::to_string);
    }

    /// Validates, then forwards the file and records the outcome.
    pub async fn submit(
        &mut self,
        path: impl Into<PathBuf>,
        studio: &StudioHandle,
    ) -> anyhow::Result<Result<(), StudioError>> {
        let file = match self.validate(path) {
            Ok(file) => file,
            Err(e) => return Ok(Err(e)),
        };
        let outcome = forward(file, studio).await?;
        self.record(&outcome);
        Ok(outcome)
    }
}

/// Reads a validated file and hands it to the studio, bracketing the read with
/// `BeginUpload` and `Upload` (or `AbortUpload` when the read fails). The outer
/// error means the studio is gone; the inner one is for the user.
pub async fn forward(
    file: SelectedFile,
    studio: &StudioHandle,
) -> anyhow::Result<Result<(), StudioError>> {
    if !studio.begin_upload().await? {
        return Ok(Err(StudioError::UploadInProgress));
    }
    match encode_file(&file).await {
        Ok(payload) => {
            studio.send(Intent::Upload(payload)).await?;
            Ok(Ok(()))
        }
        Err(e) => {
            warn!(kind = e.kind(), path = %file.path.display(), "could not read upload");
            studio.send(Intent::AbortUpload).await?;
            Ok(Err(e))
        }
    }
}
