/// Result alias used throughout the crate.
pub type SlidecastResult<T> = Result<T, SlidecastError>;

/// Errors surfaced by slidecast.
#[derive(thiserror::Error, Debug)]
pub enum SlidecastError {
    /// Invalid editor input or API argument.
    #[error("validation error: {0}")]
    Validation(String),

    /// The drawing surface or audio sink could not be obtained.
    #[error("acquisition error: {0}")]
    Acquisition(String),

    /// An uploaded image could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Voice playback could not start.
    #[error("playback error: {0}")]
    Playback(String),

    /// A render was requested while another one is active.
    #[error("render rejected: {0}")]
    ConcurrentRender(String),

    /// Workspace mutation attempted while a render is active.
    #[error("workspace busy: {0}")]
    Busy(String),

    /// The capture stream failed or produced no output.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Project or config (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlidecastError {
    /// Build a [`SlidecastError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SlidecastError::Acquisition`].
    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition(msg.into())
    }

    /// Build a [`SlidecastError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`SlidecastError::Playback`].
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Build a [`SlidecastError::ConcurrentRender`].
    pub fn concurrent_render(msg: impl Into<String>) -> Self {
        Self::ConcurrentRender(msg.into())
    }

    /// Build a [`SlidecastError::Busy`].
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Build a [`SlidecastError::Encoding`].
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`SlidecastError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Per-asset failures that degrade the output instead of aborting the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Playback(_))
    }
}
