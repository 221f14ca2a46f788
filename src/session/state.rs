use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Lifecycle of the workspace's render session.
///
/// `Idle -> Preparing -> Rendering -> Finalizing -> Complete`, with any in-flight phase able to
/// drop to `Failed`. A new render may start only from `Idle`, `Complete` or `Failed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing rendered since the last reset.
    #[default]
    Idle,
    /// Decoding assets, acquiring the surface, mixing audio.
    Preparing,
    /// Frames are being drawn and captured.
    Rendering,
    /// Capture stream is closing and the artifact is being published.
    Finalizing,
    /// The last render produced the current artifact.
    Complete,
    /// The last render failed; any earlier artifact is untouched.
    Failed,
}

impl SessionState {
    /// `true` while a render is in flight.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Preparing | Self::Rendering | Self::Finalizing)
    }

    /// Whether a new render may start from this state.
    pub fn can_start(self) -> bool {
        !self.is_active()
    }

    /// Whether `self -> next` is a legal step.
    pub fn can_transition_to(self, next: Self) -> bool {
        use SessionState::*;
        match (self, next) {
            (Idle | Complete | Failed, Preparing) => true,
            (Preparing, Rendering) | (Rendering, Finalizing) | (Finalizing, Complete) => true,
            (Preparing | Rendering | Finalizing, Failed) => true,
            (Complete | Failed | Idle, Idle) => true,
            _ => false,
        }
    }

    /// Checked transition.
    pub fn transition(self, next: Self) -> SlidecastResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SlidecastError::validation(format!(
                "illegal session transition {self:?} -> {next:?}"
            )))
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Rendering => "rendering",
            Self::Finalizing => "finalizing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}
