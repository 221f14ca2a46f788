//! Slidecast turns a short list of product benefits into a vertical, square or landscape promo
//! video, entirely on the local machine.
//!
//! - Fill a [`Workspace`] with slide images, an optional voice track and the music toggle
//! - Describe the look with a [`StyleConfig`]
//! - Call [`Workspace::start_render`] and wait on the returned [`RenderTask`]
//!
//! Each render walks the session through `Preparing`, `Rendering` and `Finalizing`: slides are
//! drawn with `vello_cpu`, the procedural music and voice are mixed to PCM, and every frame is
//! streamed to a [`FrameSink`] (by default an `ffmpeg` MP4 encoder).
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Slide entrance animation and frame scheduling.
pub mod animation;
/// Slide images, voice clips and text layout.
pub mod assets;
/// Procedural music and the two-bus mix.
pub mod audio;
/// Style parameters and the slide deck.
pub mod deck;
/// Capture streams.
pub mod encode;
/// Slide drawing onto a pixel surface.
pub mod render;
pub mod resources;
/// Render sessions and the workspace.
pub mod session;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8Premul};
pub use crate::foundation::error::{SlidecastError, SlidecastResult};

pub use crate::animation::scheduler::{ClockMode, FramePlan};
pub use crate::assets::voice::VoiceOrigin;
pub use crate::deck::slides::SlideDeck;
pub use crate::deck::style::{AspectPreset, StyleConfig};
pub use crate::encode::ffmpeg::{FfmpegEncodeOpts, FfmpegSink, is_ffmpeg_on_path};
pub use crate::encode::sink::{
    AudioInputConfig, FrameSink, InMemorySink, SinkConfig, SinkFactory,
};
pub use crate::render::surface::FrameRGBA;
pub use crate::resources::{ResourceId, ResourceKind, ResourceRegistry};
pub use crate::session::artifact::ArtifactInfo;
pub use crate::session::capture::{RenderStats, SessionOpts};
pub use crate::session::state::SessionState;
pub use crate::session::workspace::{RenderTask, Workspace};
