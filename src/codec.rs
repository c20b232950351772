use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StudioError;

pub const IMAGE_TYPE_PREFIX: &str = "image/";

/// An image in transport-safe form: raw base64 content plus its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub data: String,
    pub media_type: String,
}

impl ImagePayload {
    pub fn new(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self::new(B64.encode(bytes), media_type)
    }

    pub fn decode(&self) -> Result<Vec<u8>, StudioError> {
        B64.decode(self.data.as_bytes())
            .map_err(|e| StudioError::InvalidImageData(format!("base64 decode: {e}")))
    }
}

/// A file handed over by the host, with the type it declares for itself.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub declared_type: String,
}

impl SelectedFile {
    /// Declares the type from the file extension, the way a file picker would.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let declared_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            path,
            declared_type,
        }
    }

    pub fn is_image(&self) -> bool {
        self.declared_type.starts_with(IMAGE_TYPE_PREFIX)
    }
}

/// Drops a `data:<type>;base64,` scheme prefix if present.
pub fn strip_data_uri_prefix(s: &str) -> &str {
    if !s.starts_with("data:") {
        return s;
    }
    match s.find(',') {
        Some(idx) => &s[(idx + 1)..],
        None => s,
    }
}

pub async fn encode_file(file: &SelectedFile) -> Result<ImagePayload, StudioError> {
    if !file.is_image() {
        return Err(StudioError::UnsupportedFileType {
            declared: file.declared_type.clone(),
        });
    }
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(StudioError::FileUnreadable)?;
    debug!(path = %file.path.display(), bytes = bytes.len(), "encoded image file");
    Ok(ImagePayload::from_bytes(&bytes, file.declared_type.clone()))
}

pub fn guess_image_extension(bytes: &[u8]) -> &'static str {
    // PNG
    if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        return "png";
    }
    // JPEG
    if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
        return "jpg";
    }
    // WEBP (RIFF....WEBP)
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "webp";
    }
    "png"
}

/// Writes the decoded image to `path`, adding a sniffed extension when it has none.
pub async fn export_image(image: &ImagePayload, path: &Path) -> Result<PathBuf, StudioError> {
    let bytes = image.decode()?;
    let target = if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(guess_image_extension(&bytes))
    };
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, bytes).await?;
    Ok(target)
}
