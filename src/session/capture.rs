use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crate::animation::scheduler::{ClockMode, FPS, FramePlan, run_schedule};
use crate::assets::images::{ImageSource, decode_all};
use crate::assets::media::{MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::assets::voice::VoiceClip;
use crate::audio::graph::{AudioMixGraph, Bus};
use crate::audio::synth::MusicSynth;
use crate::deck::slides::SlideDeck;
use crate::deck::style::StyleConfig;
use crate::encode::ffmpeg::FfmpegEncodeOpts;
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig, SinkFactory};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::foundation::fs::{TempFileGuard, unique_temp_path};
use crate::render::slide::FrameRenderer;
use crate::render::surface::{DrawingSurface, FrameRGBA};
use crate::session::state::SessionState;

/// Runtime knobs of a capture session.
#[derive(Clone)]
pub struct SessionOpts {
    /// Tick pacing.
    pub clock: ClockMode,
    /// Bounded channel capacity between the render loop and the encoder thread.
    pub channel_capacity: usize,
    /// Pause between closing the capture stream and releasing audio/voice resources.
    pub release_delay: Duration,
    /// Font used for all slide text. Without one, text is measured approximately and not drawn.
    pub font: Option<Arc<Vec<u8>>>,
    /// Directory for encoded artifacts and audio temp files.
    pub work_dir: PathBuf,
    /// Mix sample rate.
    pub sample_rate: u32,
    /// Draft divisor applied to the preset canvas (1 renders at full size).
    pub downscale: u32,
    /// Capture stream builder.
    pub sink: SinkFactory,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            clock: ClockMode::Offline,
            channel_capacity: 4,
            release_delay: Duration::from_millis(250),
            font: None,
            work_dir: std::env::temp_dir(),
            sample_rate: MIX_SAMPLE_RATE,
            downscale: 1,
            sink: FfmpegEncodeOpts::default().factory(),
        }
    }
}

impl std::fmt::Debug for SessionOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOpts")
            .field("clock", &self.clock)
            .field("channel_capacity", &self.channel_capacity)
            .field("release_delay", &self.release_delay)
            .field("font", &self.font.as_ref().map(|f| f.len()))
            .field("work_dir", &self.work_dir)
            .field("sample_rate", &self.sample_rate)
            .field("downscale", &self.downscale)
            .finish_non_exhaustive()
    }
}

impl SessionOpts {
    /// Canvas actually rendered for `preset`: divided by `downscale`, rounded down to even sizes.
    pub fn canvas_for(&self, preset: Canvas) -> Canvas {
        let d = self.downscale.max(1);
        Canvas {
            width: (preset.width / d) & !1,
            height: (preset.height / d) & !1,
        }
    }
}

/// Counters of one completed render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames delivered to the capture stream, tail included.
    pub frames_total: u64,
    /// Frames drawn by the renderer.
    pub frames_rendered: u64,
    /// Tail frames that repeated the last drawn frame.
    pub frames_held: u64,
    /// Ticks that fired behind the real-time schedule.
    pub late_ticks: u64,
    /// Slides in the deck.
    pub slides: u64,
    /// Images that failed to decode and were left out.
    pub images_failed: u64,
    /// Whether background music was mixed in.
    pub music: bool,
    /// Whether the voice track was mixed in.
    pub voice: bool,
}

/// Everything a render reads, snapshotted when it starts.
#[derive(Clone, Debug)]
pub struct CaptureInputs {
    /// Style, immutable for the render.
    pub style: StyleConfig,
    /// Slide images in upload order.
    pub images: Vec<Arc<ImageSource>>,
    /// Voice clip, if one is set.
    pub voice: Option<Arc<VoiceClip>>,
    /// Background music toggle.
    pub music: bool,
}

/// Result of a successful capture.
#[derive(Debug)]
pub struct CaptureOutput {
    /// Encoded file written by the sink, if it writes one. Ownership passes to the caller.
    pub file: Option<PathBuf>,
    /// Render counters.
    pub stats: RenderStats,
}

struct Prepared {
    plan: FramePlan,
    surface: DrawingSurface,
    renderer: FrameRenderer,
    sink: Box<dyn FrameSink>,
    sink_cfg: SinkConfig,
    out: TempFileGuard,
    audio: TempFileGuard,
    stats: RenderStats,
}

#[derive(Debug)]
struct FrameMsg {
    idx: FrameIndex,
    frame: Arc<FrameRGBA>,
}

/// One render: Preparing, Rendering, Finalizing.
///
/// `on_state` is told about each phase as it begins. Any error aborts the capture, deletes partial
/// output, and is returned to the caller; the caller owns the transition to `Failed`.
pub struct CaptureSession<'a> {
    opts: &'a SessionOpts,
    inputs: CaptureInputs,
    on_state: &'a mut dyn FnMut(SessionState),
}

impl<'a> CaptureSession<'a> {
    /// Session over `inputs`.
    pub fn new(
        opts: &'a SessionOpts,
        inputs: CaptureInputs,
        on_state: &'a mut dyn FnMut(SessionState),
    ) -> Self {
        Self {
            opts,
            inputs,
            on_state,
        }
    }

    /// Run all phases to completion.
    pub fn run(mut self) -> SlidecastResult<CaptureOutput> {
        (self.on_state)(SessionState::Preparing);
        let prepared = self.prepare()?;
        (self.on_state)(SessionState::Rendering);
        self.capture(prepared)
    }

    #[tracing::instrument(skip_all, fields(slides = tracing::field::Empty, frames = tracing::field::Empty))]
    fn prepare(&mut self) -> SlidecastResult<Prepared> {
        let style = &self.inputs.style;
        style.validate()?;
        let canvas = self.opts.canvas_for(style.canvas());

        let ids = self.inputs.images.iter().map(|s| s.id()).collect::<Vec<_>>();
        let deck = SlideDeck::build(&style.benefits, &ids);
        let fps = Fps::new(FPS, 1)?;
        let plan = FramePlan::new(style.seconds_per_slide, deck.len(), fps)?;
        let span = tracing::Span::current();
        span.record("slides", deck.len());
        span.record("frames", plan.total_frames());

        // The surface comes first: without it nothing else is worth preparing.
        let surface = DrawingSurface::acquire(canvas)?;

        // Images past the last slide are never shown.
        let shown = deck.len().min(self.inputs.images.len());
        let decoded = decode_all(&self.inputs.images[..shown]);
        let images_failed = decoded.iter().filter(|d| d.is_none()).count() as u64;
        let renderer = FrameRenderer::new(canvas, style, &deck, &decoded, self.opts.font.clone())?;

        let (audio, audio_cfg, music, voice) = self.mix_audio(plan.duration_secs())?;

        let out = TempFileGuard::new(unique_temp_path(&self.opts.work_dir, "artifact", "mp4"));
        let out_path = out
            .path()
            .ok_or_else(|| SlidecastError::acquisition("artifact path missing"))?
            .to_path_buf();
        let sink = (self.opts.sink)(&out_path)?;

        tracing::debug!(
            canvas = ?canvas,
            images_failed,
            music,
            voice,
            "session prepared"
        );
        Ok(Prepared {
            plan,
            surface,
            renderer,
            sink,
            sink_cfg: SinkConfig {
                width: canvas.width,
                height: canvas.height,
                fps,
                audio: Some(audio_cfg),
            },
            out,
            audio,
            stats: RenderStats {
                slides: deck.len() as u64,
                images_failed,
                music,
                voice,
                ..RenderStats::default()
            },
        })
    }

    fn mix_audio(
        &mut self,
        duration_secs: f64,
    ) -> SlidecastResult<(TempFileGuard, AudioInputConfig, bool, bool)> {
        let mut graph = AudioMixGraph::new(self.opts.sample_rate, MIX_CHANNELS)?;

        if self.inputs.music {
            let music = MusicSynth::new(self.opts.sample_rate)?.render(duration_secs)?;
            graph = graph.with_music(Arc::new(music));
        }
        // The voice is consumed here; later phases never touch it.
        if let Some(clip) = self.inputs.voice.take() {
            match clip.decode_pcm() {
                Ok(pcm) => graph = graph.with_voice(Arc::new(pcm)),
                Err(e) => {
                    tracing::warn!(voice = %clip.id(), error = %e, "voice cannot play, rendering without it")
                }
            }
        }

        let path = unique_temp_path(&self.opts.work_dir, "audio_mix", "f32le");
        let guard = TempFileGuard::new(path.clone());
        graph.render_to_f32le(duration_secs, &path)?;
        let cfg = AudioInputConfig {
            path,
            sample_rate: graph.sample_rate(),
            channels: graph.channels(),
        };
        Ok((
            guard,
            cfg,
            graph.has(Bus::Music),
            graph.has(Bus::Voice),
        ))
    }

    #[tracing::instrument(skip_all, fields(frames = prepared.plan.total_frames()))]
    fn capture(self, prepared: Prepared) -> SlidecastResult<CaptureOutput> {
        let Prepared {
            plan,
            mut surface,
            mut renderer,
            mut sink,
            sink_cfg,
            mut out,
            audio,
            mut stats,
        } = prepared;
        let opts = self.opts;
        let on_state = self.on_state;
        let total = plan.total_frames();
        let writes_file = sink.output_path().is_some();
        let mut clock = opts.clock.clock(plan.fps());

        let stats = std::thread::scope(|scope| -> SlidecastResult<RenderStats> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(opts.channel_capacity.max(1));

            let enc = scope.spawn(move || -> SlidecastResult<()> {
                sink.begin(sink_cfg)?;
                let mut pushed = 0u64;
                for msg in rx {
                    sink.push_frame(msg.idx, &msg.frame)?;
                    pushed += 1;
                }
                // Producer stopped early; its error is the one reported.
                if pushed != total {
                    return Ok(());
                }
                sink.end()
            });

            let mut last: Option<Arc<FrameRGBA>> = None;
            let produced = run_schedule(&plan, clock.as_mut(), |tick| {
                let frame = match (&last, tick.hold) {
                    (Some(held), true) => held.clone(),
                    _ => {
                        renderer.draw(&mut surface, tick.slide, tick.eased)?;
                        let f = Arc::new(surface.read_frame());
                        last = Some(f.clone());
                        f
                    }
                };
                tx.send(FrameMsg {
                    idx: tick.index,
                    frame,
                })
                .map_err(|_| SlidecastError::encoding("encoder stopped accepting frames"))
            });
            if produced.is_ok() {
                on_state(SessionState::Finalizing);
            }
            drop(tx);

            let encoded = enc
                .join()
                .map_err(|_| SlidecastError::encoding("encoder thread panicked"))?;
            encoded?;
            let sched = produced?;
            stats.frames_total = sched.ticks;
            stats.frames_rendered = sched.drawn;
            stats.frames_held = sched.held;
            stats.late_ticks = sched.late;
            Ok(stats)
        })?;

        if !opts.release_delay.is_zero() {
            std::thread::sleep(opts.release_delay);
        }
        drop(audio);

        let file = if writes_file {
            let path = out
                .disarm()
                .ok_or_else(|| SlidecastError::encoding("artifact path missing"))?;
            if !path.is_file() {
                return Err(SlidecastError::encoding(format!(
                    "capture stream finished without writing '{}'",
                    path.display()
                )));
            }
            Some(path)
        } else {
            None
        };
        tracing::info!(
            frames = stats.frames_total,
            rendered = stats.frames_rendered,
            held = stats.frames_held,
            late = stats.late_ticks,
            "capture finished"
        );
        Ok(CaptureOutput { file, stats })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/capture.rs"]
mod tests;
