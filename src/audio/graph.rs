use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::assets::media::AudioPcm;
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Fixed gain of the background music bus.
pub const MUSIC_GAIN: f32 = 0.15;
/// Fixed gain of the voice bus.
pub const VOICE_GAIN: f32 = 0.9;

/// Inputs of the two-bus mix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bus {
    /// Procedural background music.
    Music,
    /// Uploaded or recorded voice-over.
    Voice,
}

impl Bus {
    /// Gain applied to everything on this bus.
    pub fn gain(self) -> f32 {
        match self {
            Self::Music => MUSIC_GAIN,
            Self::Voice => VOICE_GAIN,
        }
    }
}

#[derive(Clone, Debug)]
/// One source placed on the output timeline, in output sample frames.
pub(crate) struct AudioSegment {
    pub(crate) timeline_start_sample: u64,
    pub(crate) timeline_end_sample: u64,
    pub(crate) volume: f32,
    pub(crate) source: Arc<AudioPcm>,
}

#[derive(Clone, Debug)]
/// Everything needed to mix one output buffer.
pub(crate) struct AudioManifest {
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
    pub(crate) total_samples: u64,
    pub(crate) segments: Vec<AudioSegment>,
}

/// Two-input summing node feeding one interleaved output.
///
/// The music bus sounds only when music was attached, the voice bus only when a voice was
/// attached; with neither the output is silence of the requested length. Sources play from the
/// output's time zero at their natural rate.
#[derive(Clone, Debug)]
pub struct AudioMixGraph {
    sample_rate: u32,
    channels: u16,
    music: Option<Arc<AudioPcm>>,
    voice: Option<Arc<AudioPcm>>,
}

impl AudioMixGraph {
    /// Empty graph producing `channels` interleaved channels at `sample_rate`.
    pub fn new(sample_rate: u32, channels: u16) -> SlidecastResult<Self> {
        if sample_rate == 0 {
            return Err(SlidecastError::validation("mix sample_rate must be > 0"));
        }
        if !(1..=2).contains(&channels) {
            return Err(SlidecastError::validation("mix channels must be 1 or 2"));
        }
        Ok(Self {
            sample_rate,
            channels,
            music: None,
            voice: None,
        })
    }

    /// Attach the music bus source.
    pub fn with_music(mut self, pcm: Arc<AudioPcm>) -> Self {
        self.music = Some(pcm);
        self
    }

    /// Attach the voice bus source.
    pub fn with_voice(mut self, pcm: Arc<AudioPcm>) -> Self {
        self.voice = Some(pcm);
        self
    }

    /// Output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Output channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Whether `bus` has a source attached.
    pub fn has(&self, bus: Bus) -> bool {
        match bus {
            Bus::Music => self.music.is_some(),
            Bus::Voice => self.voice.is_some(),
        }
    }

    /// `true` when neither bus has a source.
    pub fn is_silent(&self) -> bool {
        self.music.is_none() && self.voice.is_none()
    }

    pub(crate) fn manifest(&self, total_samples: u64) -> AudioManifest {
        let segments = [(Bus::Music, &self.music), (Bus::Voice, &self.voice)]
            .into_iter()
            .filter_map(|(bus, pcm)| {
                Some(AudioSegment {
                    timeline_start_sample: 0,
                    timeline_end_sample: total_samples,
                    volume: bus.gain(),
                    source: Arc::clone(pcm.as_ref()?),
                })
            })
            .collect();
        AudioManifest {
            sample_rate: self.sample_rate,
            channels: self.channels,
            total_samples,
            segments,
        }
    }

    /// Number of output sample frames covering `duration_secs`.
    pub fn samples_for(&self, duration_secs: f64) -> u64 {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return 0;
        }
        (duration_secs * f64::from(self.sample_rate)).round() as u64
    }

    /// Mix `duration_secs` of output as interleaved `f32`, clamped to `[-1, 1]`.
    pub fn render(&self, duration_secs: f64) -> Vec<f32> {
        mix_manifest(&self.manifest(self.samples_for(duration_secs)))
    }

    /// Mix `duration_secs` of output into a raw little-endian `.f32le` file.
    #[tracing::instrument(level = "debug", skip(self, out_path))]
    pub fn render_to_f32le(&self, duration_secs: f64, out_path: &Path) -> SlidecastResult<()> {
        let mixed = self.render(duration_secs);
        write_mix_to_f32le_file(&mixed, out_path)?;
        tracing::debug!(
            samples = mixed.len(),
            music = self.has(Bus::Music),
            voice = self.has(Bus::Voice),
            path = %out_path.display(),
            "audio mix written"
        );
        Ok(())
    }
}

pub(crate) fn mix_manifest(manifest: &AudioManifest) -> Vec<f32> {
    let frames = manifest.total_samples as usize;
    let mut out = vec![0.0f32; frames * usize::from(manifest.channels)];

    for seg in &manifest.segments {
        mix_segment(&mut out, manifest, seg);
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

fn mix_segment(out: &mut [f32], manifest: &AudioManifest, seg: &AudioSegment) {
    let src = seg.source.interleaved_f32.as_slice();
    let src_channels = usize::from(seg.source.channels.max(1));
    let src_frames = src.len() / src_channels;
    if src_frames == 0 || seg.source.sample_rate == 0 {
        return;
    }
    let end = seg.timeline_end_sample.min(manifest.total_samples);

    // Sources with a different rate are resampled linearly; playback speed stays 1.0.
    let step = f64::from(seg.source.sample_rate) / f64::from(manifest.sample_rate);
    for dst_sample in seg.timeline_start_sample..end {
        let rel = (dst_sample - seg.timeline_start_sample) as f64;
        let src_pos = rel * step;
        let src_frame0 = src_pos.floor() as usize;
        if src_frame0 >= src_frames {
            break;
        }
        let src_frame1 = (src_frame0 + 1).min(src_frames - 1);
        let frac = (src_pos - src_frame0 as f64) as f32;

        let (l, r) = if src_channels == 1 {
            let v0 = src[src_frame0];
            let v1 = src[src_frame1];
            let v = v0 + ((v1 - v0) * frac);
            (v, v)
        } else {
            let i0 = src_frame0 * src_channels;
            let i1 = src_frame1 * src_channels;
            (
                src[i0] + ((src[i1] - src[i0]) * frac),
                src[i0 + 1] + ((src[i1 + 1] - src[i0 + 1]) * frac),
            )
        };

        let dst_idx = dst_sample as usize * usize::from(manifest.channels);
        if manifest.channels > 1 {
            out[dst_idx] += l * seg.volume;
            out[dst_idx + 1] += r * seg.volume;
        } else {
            out[dst_idx] += 0.5 * (l + r) * seg.volume;
        }
    }
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub(crate) fn write_mix_to_f32le_file(
    samples_interleaved: &[f32],
    out_path: &Path,
) -> SlidecastResult<()> {
    crate::foundation::fs::ensure_parent_dir(out_path)?;

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes)
        .with_context(|| format!("write mixed audio file '{}'", out_path.display()))
        .map_err(|e| SlidecastError::acquisition(format!("{e:#}")))
}

#[cfg(test)]
#[path = "../../tests/unit/audio/graph.rs"]
mod tests;
