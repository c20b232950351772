/// Studio-wide error type.
///
/// The `Display` text of the generation variants is what the user sees; the
/// underlying transport cause is logged where it happens and never carried here.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("Please upload a valid image file (JPEG, PNG, etc.).")]
    UnsupportedFileType { declared: String },

    #[error("Could not read the image file. Please try another one.")]
    FileUnreadable(#[source] std::io::Error),

    #[error("Please wait for the current image to finish loading.")]
    UploadInProgress,

    #[error("{0}")]
    GenerationFailed(String),

    #[error("{0}")]
    RefinementFailed(String),

    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// Stable identifier used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StudioError::UnsupportedFileType { .. } => "unsupported_file_type",
            StudioError::FileUnreadable(_) => "file_unreadable",
            StudioError::UploadInProgress => "upload_in_progress",
            StudioError::GenerationFailed(_) => "generation_failed",
            StudioError::RefinementFailed(_) => "refinement_failed",
            StudioError::ConfigurationMissing(_) => "configuration_missing",
            StudioError::InvalidImageData(_) => "invalid_image_data",
            StudioError::Io(_) => "io",
        }
    }
}
