/// Convenience result type used across the engine.
pub type PosterResult<T> = Result<T, PosterError>;

/// Top-level error taxonomy used by engine APIs.
///
/// `InvalidInput` means the caller's data broke a documented contract and the
/// call must not be retried with the same input. `ImageProcessing` wraps an
/// unexpected failure of the backing raster/vector toolkit during an
/// otherwise-valid operation; retry policy belongs to the caller.
#[derive(thiserror::Error, Debug)]
pub enum PosterError {
    /// Caller-supplied data violates a documented contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backing raster/vector toolkit failed unexpectedly.
    #[error("image processing error: {0}")]
    ImageProcessing(String),

    /// Lookup for an id with no registered template.
    #[error("template '{0}' is not registered")]
    TemplateNotFound(String),

    /// Registration of a template that failed validation; carries every
    /// violation so callers can report them in one pass.
    #[error("template validation failed: {}", .0.join("; "))]
    TemplateValidation(Vec<String>),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PosterError {
    /// Build a [`PosterError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`PosterError::ImageProcessing`] value.
    pub fn image_processing(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Build a [`PosterError::TemplateNotFound`] value.
    pub fn template_not_found(id: impl Into<String>) -> Self {
        Self::TemplateNotFound(id.into())
    }

    /// The accumulated messages when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            Self::TemplateValidation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Wrap any non-`InvalidInput` failure as [`PosterError::ImageProcessing`].
///
/// Stage validation errors pass through unchanged so callers can tell a bad
/// request from a broken toolkit.
pub(crate) fn wrap_processing(err: PosterError) -> PosterError {
    match err {
        PosterError::InvalidInput(_) => err,
        PosterError::ImageProcessing(_) => err,
        other => PosterError::ImageProcessing(other.to_string()),
    }
}
