use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crate::animation::scheduler::entrance_eased;
use crate::assets::images::ImageStore;
use crate::assets::voice::{VoiceAsset, VoiceOrigin};
use crate::deck::slides::SlideDeck;
use crate::deck::style::StyleConfig;
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::render::slide::FrameRenderer;
use crate::render::surface::{DrawingSurface, FrameRGBA};
use crate::resources::{ResourceId, ResourceKind, ResourceRegistry};
use crate::session::artifact::{ArtifactInfo, OutputArtifact, download_name};
use crate::session::capture::{CaptureInputs, CaptureSession, SessionOpts};
use crate::session::state::SessionState;

#[derive(Debug)]
struct Shared {
    state: SessionState,
    images: ImageStore,
    voice: Option<VoiceAsset>,
    music: bool,
    artifact: Option<Arc<OutputArtifact>>,
    last_error: Option<String>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            images: ImageStore::new(),
            voice: None,
            music: true,
            artifact: None,
            last_error: None,
        }
    }
}

/// Editor-side state: uploaded assets, the music toggle, the session state and the latest artifact.
///
/// Cloning yields another handle to the same workspace. At most one render runs at a time; while
/// it does, asset mutations and [`Workspace::reset`] are rejected with
/// [`SlidecastError::Busy`].
#[derive(Clone, Debug)]
pub struct Workspace {
    registry: ResourceRegistry,
    opts: Arc<SessionOpts>,
    shared: Arc<Mutex<Shared>>,
}

impl Workspace {
    /// Empty workspace with a fresh resource registry.
    pub fn new(opts: SessionOpts) -> Self {
        Self::with_registry(ResourceRegistry::new(), opts)
    }

    /// Empty workspace issuing handles from `registry`.
    pub fn with_registry(registry: ResourceRegistry, opts: SessionOpts) -> Self {
        Self {
            registry,
            opts: Arc::new(opts),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Registry tracking every handle this workspace issued.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Session options used by renders and previews.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_idle(&self, what: &str) -> SlidecastResult<MutexGuard<'_, Shared>> {
        let sh = self.lock();
        if sh.state.is_active() {
            return Err(SlidecastError::busy(format!(
                "cannot {what} while a render is {}",
                sh.state
            )));
        }
        Ok(sh)
    }

    /// Append an uploaded image. `Ok(None)` means the image limit was reached.
    pub fn add_image(
        &self,
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> SlidecastResult<Option<ResourceId>> {
        let mut sh = self.lock_idle("add an image")?;
        Ok(sh.images.push(&self.registry, name, bytes))
    }

    /// Replace the voice track. The previous voice handle is revoked.
    pub fn set_voice(
        &self,
        origin: VoiceOrigin,
        bytes: impl Into<Arc<[u8]>>,
    ) -> SlidecastResult<ResourceId> {
        let mut sh = self.lock_idle("replace the voice")?;
        let asset = VoiceAsset::new(&self.registry, origin, bytes);
        let id = asset.id();
        let previous = sh.voice.replace(asset);
        drop(sh);
        if let Some(old) = previous {
            tracing::debug!(old = %old.id(), new = %id, "voice replaced");
        }
        Ok(id)
    }

    /// Remove the voice track.
    pub fn clear_voice(&self) -> SlidecastResult<()> {
        let previous = self.lock_idle("clear the voice")?.voice.take();
        drop(previous);
        Ok(())
    }

    /// Toggle background music for subsequent renders.
    pub fn set_music_enabled(&self, on: bool) -> SlidecastResult<()> {
        self.lock_idle("toggle music")?.music = on;
        Ok(())
    }

    /// Image ids in upload order.
    pub fn image_ids(&self) -> Vec<ResourceId> {
        self.lock().images.ids()
    }

    /// Current voice id.
    pub fn voice_id(&self) -> Option<ResourceId> {
        self.lock().voice.as_ref().map(VoiceAsset::id)
    }

    /// Background music toggle.
    pub fn music_enabled(&self) -> bool {
        self.lock().music
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Message of the last failed render, cleared when a render starts or the workspace resets.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// The published artifact, if any.
    pub fn artifact(&self) -> Option<ArtifactInfo> {
        self.lock().artifact.as_deref().map(OutputArtifact::info)
    }

    /// Copy the published artifact to `dest`.
    ///
    /// The copy runs without holding the workspace lock. A render or reset that supersedes the
    /// artifact meanwhile leaves its file in place until the copy finishes.
    pub fn save_artifact(&self, dest: &Path) -> SlidecastResult<u64> {
        let artifact = self
            .lock()
            .artifact
            .clone()
            .ok_or_else(|| SlidecastError::validation("no artifact to save"))?;
        artifact.save_to(dest)
    }

    /// Release every asset and the artifact, then return to `Idle`.
    pub fn reset(&self) -> SlidecastResult<()> {
        let mut sh = self.lock_idle("reset")?;
        let images = std::mem::take(&mut sh.images);
        let voice = sh.voice.take();
        let artifact = sh.artifact.take();
        sh.state = sh.state.transition(SessionState::Idle)?;
        sh.last_error = None;
        drop(sh);

        drop((images, voice, artifact));
        tracing::info!(live = self.registry.live_count(), "workspace reset");
        Ok(())
    }

    /// Start a render on a worker thread.
    ///
    /// Rejected with [`SlidecastError::ConcurrentRender`] while another render is active; the
    /// running render is unaffected. Style errors are reported here without changing state.
    pub fn start_render(&self, style: StyleConfig) -> SlidecastResult<RenderTask> {
        let inputs = {
            let mut sh = self.lock();
            if !sh.state.can_start() {
                return Err(SlidecastError::concurrent_render(format!(
                    "a render is already {}",
                    sh.state
                )));
            }
            style.validate()?;
            sh.state = sh.state.transition(SessionState::Preparing)?;
            sh.last_error = None;
            CaptureInputs {
                style,
                images: sh.images.sources(),
                voice: sh.voice.as_ref().map(|v| v.clip().clone()),
                music: sh.music,
            }
        };
        tracing::info!(
            images = inputs.images.len(),
            voice = inputs.voice.is_some(),
            music = inputs.music,
            "render started"
        );

        let ws = self.clone();
        let spawned = std::thread::Builder::new()
            .name("slidecast-render".to_owned())
            .spawn(move || ws.run_session(inputs));
        match spawned {
            Ok(handle) => Ok(RenderTask { handle }),
            Err(e) => {
                let err = SlidecastError::acquisition(format!("spawn render worker: {e}"));
                self.settle_failed(&err);
                Err(err)
            }
        }
    }

    /// Render on the calling thread's behalf and wait for the artifact.
    pub fn render_blocking(&self, style: StyleConfig) -> SlidecastResult<ArtifactInfo> {
        self.start_render(style)?.wait()
    }

    /// Draw one slide at entrance progress `progress` (0 to 1) without touching session state.
    pub fn preview_frame(
        &self,
        style: &StyleConfig,
        slide: usize,
        progress: f64,
    ) -> SlidecastResult<FrameRGBA> {
        style.validate()?;
        let sources = self.lock().images.sources();
        let ids = sources.iter().map(|s| s.id()).collect::<Vec<_>>();
        let deck = SlideDeck::build(&style.benefits, &ids);
        if slide >= deck.len() {
            return Err(SlidecastError::validation(format!(
                "slide {slide} out of range (deck has {})",
                deck.len()
            )));
        }

        // Only the previewed slide's image is needed.
        let decoded = sources
            .iter()
            .enumerate()
            .map(|(i, src)| {
                if i != slide {
                    return None;
                }
                src.decode()
                    .inspect_err(|e| tracing::warn!(name = src.name(), error = %e, "preview image skipped"))
                    .ok()
            })
            .collect::<Vec<_>>();

        let canvas = self.opts.canvas_for(style.canvas());
        let mut renderer = FrameRenderer::new(canvas, style, &deck, &decoded, self.opts.font.clone())?;
        let mut surface = DrawingSurface::acquire(canvas)?;
        let eased = entrance_eased(progress.clamp(0.0, 1.0));
        renderer.draw(&mut surface, slide, eased)?;
        Ok(surface.read_frame())
    }

    fn advance(&self, next: SessionState) {
        let mut sh = self.lock();
        if sh.state == next {
            return;
        }
        match sh.state.transition(next) {
            Ok(s) => {
                tracing::debug!(state = %s, "session state");
                sh.state = s;
            }
            Err(e) => tracing::warn!(error = %e, "session state update ignored"),
        }
    }

    fn settle_failed(&self, err: &SlidecastError) {
        let mut sh = self.lock();
        if sh.state.is_active() {
            sh.state = SessionState::Failed;
        }
        sh.last_error = Some(err.to_string());
        tracing::warn!(error = %err, "render failed");
    }

    fn run_session(self, inputs: CaptureInputs) -> SlidecastResult<ArtifactInfo> {
        let mut guard = FailOnUnwind {
            shared: self.shared.clone(),
            armed: true,
        };
        let title = inputs.style.title.clone();

        let mut on_state = |next: SessionState| self.advance(next);
        let captured = CaptureSession::new(&self.opts, inputs, &mut on_state).run();
        let result = captured.and_then(|out| {
            let handle = self.registry.acquire(ResourceKind::Artifact);
            OutputArtifact::new(handle, out.file, download_name(&title), out.stats)
        });

        let artifact = match result {
            Ok(a) => a,
            Err(e) => {
                self.settle_failed(&e);
                guard.armed = false;
                return Err(e);
            }
        };

        let info = artifact.info();
        let previous = {
            let mut sh = self.lock();
            sh.state = SessionState::Complete;
            sh.artifact.replace(Arc::new(artifact))
        };
        guard.armed = false;
        // Outside the lock: deletes the superseded file and revokes its handle.
        drop(previous);

        tracing::info!(
            id = %info.id,
            name = %info.download_name,
            bytes = info.byte_len,
            "artifact published"
        );
        Ok(info)
    }
}

/// Marks the session failed if the worker unwinds before settling it.
struct FailOnUnwind {
    shared: Arc<Mutex<Shared>>,
    armed: bool,
}

impl Drop for FailOnUnwind {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut sh = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        if sh.state.is_active() {
            sh.state = SessionState::Failed;
            sh.last_error = Some("render worker panicked".to_owned());
        }
    }
}

/// A render running on its worker thread.
#[derive(Debug)]
pub struct RenderTask {
    handle: JoinHandle<SlidecastResult<ArtifactInfo>>,
}

impl RenderTask {
    /// `true` once the worker has settled the session.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the render to settle.
    pub fn wait(self) -> SlidecastResult<ArtifactInfo> {
        self.handle
            .join()
            .map_err(|_| SlidecastError::encoding("render worker panicked"))?
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/workspace.rs"]
mod tests;
