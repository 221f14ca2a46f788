use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::SlidecastResult;
use crate::render::surface::FrameRGBA;

/// Configuration provided to a [`FrameSink`] when a capture starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Optional raw PCM audio track to multiplex with the video.
    pub audio: Option<AudioInputConfig>,
}

/// Raw PCM audio input for sinks that encode audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInputConfig {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Capture stream contract.
///
/// `begin` is called once, then `push_frame` in strictly increasing `FrameIndex` order with no
/// gaps, then `end` once.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> SlidecastResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SlidecastResult<()>;
    /// Flush and close the stream. The encoded output is complete once this returns `Ok`.
    fn end(&mut self) -> SlidecastResult<()>;
    /// File the sink encodes into, if it produces one.
    fn output_path(&self) -> Option<&Path> {
        None
    }
}

/// Builds the capture stream for one session, given the path the artifact should be written to.
pub type SinkFactory =
    Arc<dyn Fn(&Path) -> SlidecastResult<Box<dyn FrameSink>> + Send + Sync + 'static>;

#[derive(Debug, Default)]
struct Captured {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

/// In-memory sink for tests and previews.
///
/// Clones share one capture buffer, so a caller can keep a clone and inspect what a session
/// pushed.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    inner: Arc<Mutex<Captured>>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Captured> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.lock().cfg.clone()
    }

    /// Copy of the captured frames in push order.
    pub fn frames(&self) -> Vec<(FrameIndex, FrameRGBA)> {
        self.lock().frames.clone()
    }

    /// Captured frame indices in push order.
    pub fn indices(&self) -> Vec<FrameIndex> {
        self.lock().frames.iter().map(|(i, _)| *i).collect()
    }

    /// Number of captured frames.
    pub fn frame_count(&self) -> usize {
        self.lock().frames.len()
    }

    /// Whether `end` was called after the last `begin`.
    pub fn ended(&self) -> bool {
        self.lock().ended
    }

    /// Factory handing every session a clone of this sink.
    pub fn factory(&self) -> SinkFactory {
        let sink = self.clone();
        Arc::new(move |_| Ok(Box::new(sink.clone()) as Box<dyn FrameSink>))
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SlidecastResult<()> {
        let mut c = self.lock();
        c.cfg = Some(cfg);
        c.frames.clear();
        c.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SlidecastResult<()> {
        self.lock().frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> SlidecastResult<()> {
        self.lock().ended = true;
        Ok(())
    }
}
