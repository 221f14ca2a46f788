use std::sync::Arc;

use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_bytes};
use crate::foundation::error::SlidecastResult;
use crate::resources::{ResourceHandle, ResourceId, ResourceKind, ResourceRegistry};

/// Container label attached to microphone recordings.
pub const RECORDING_CONTAINER: &str = "webm";
/// Codec label attached to microphone recordings.
pub const RECORDING_CODEC: &str = "opus";

/// Where a voice clip came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceOrigin {
    /// A user-selected audio file.
    Upload {
        /// File name as selected.
        name: String,
    },
    /// A completed microphone recording.
    Recording {
        /// Container label, always [`RECORDING_CONTAINER`].
        container: &'static str,
        /// Codec label, always [`RECORDING_CODEC`].
        codec: &'static str,
    },
}

impl VoiceOrigin {
    /// Origin for a fresh microphone recording.
    pub fn recording() -> Self {
        Self::Recording {
            container: RECORDING_CONTAINER,
            codec: RECORDING_CODEC,
        }
    }

    fn ext_hint(&self) -> &str {
        match self {
            Self::Upload { name } => std::path::Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
                .unwrap_or("bin"),
            Self::Recording { container, .. } => container,
        }
    }
}

/// Encoded voice bytes shared with a render session.
#[derive(Debug)]
pub struct VoiceClip {
    id: ResourceId,
    origin: VoiceOrigin,
    bytes: Arc<[u8]>,
}

impl VoiceClip {
    /// Identifier of the owning resource handle.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Where the clip came from.
    pub fn origin(&self) -> &VoiceOrigin {
        &self.origin
    }

    /// Decode to mix-rate stereo PCM.
    pub fn decode_pcm(&self) -> SlidecastResult<AudioPcm> {
        decode_audio_bytes(&self.bytes, self.origin.ext_hint(), MIX_SAMPLE_RATE)
    }
}

/// The single active voice asset.
#[derive(Debug)]
pub struct VoiceAsset {
    handle: ResourceHandle,
    clip: Arc<VoiceClip>,
}

impl VoiceAsset {
    /// Register a new voice asset.
    pub fn new(
        registry: &ResourceRegistry,
        origin: VoiceOrigin,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let handle = registry.acquire(ResourceKind::Voice);
        let clip = Arc::new(VoiceClip {
            id: handle.id(),
            origin,
            bytes: bytes.into(),
        });
        Self { handle, clip }
    }

    /// Resource identifier.
    pub fn id(&self) -> ResourceId {
        self.handle.id()
    }

    /// Shared clip for rendering.
    pub fn clip(&self) -> &Arc<VoiceClip> {
        &self.clip
    }
}
