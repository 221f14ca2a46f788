use crate::assets::media::AudioPcm;
use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Beat length in seconds.
pub const BEAT_SECS: f64 = 0.5;
/// Linear attack from silence to full level at the start of every beat.
pub const ATTACK_SECS: f64 = 0.05;
/// Linear release to silence, ending exactly at the beat boundary.
pub const RELEASE_SECS: f64 = 0.25;
/// Beats played on one chord root before advancing the cycle.
pub const BEATS_PER_CHORD: u64 = 4;
/// Music keeps playing this long past the video so the encoder never runs short.
pub const MUSIC_TAIL_MARGIN_SECS: f64 = 1.0;
/// Chord roots in cycle order (A3, F3, C3, G3).
pub const CHORD_ROOTS_HZ: [f64; 4] = [220.00, 174.61, 130.81, 196.00];
/// Interval of the secondary tone over the root (a perfect fifth).
pub const FIFTH_RATIO: f64 = 1.5;

// Peak level of each tone; both summed stay within [-1, 1].
const TONE_LEVEL: f32 = 0.5;

/// Ambient chord-cycle music generator.
///
/// Deterministic: the same duration and sample rate always produce identical samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MusicSynth {
    sample_rate: u32,
}

impl MusicSynth {
    /// Synth producing mono PCM at `sample_rate`.
    pub fn new(sample_rate: u32) -> SlidecastResult<Self> {
        if sample_rate == 0 {
            return Err(SlidecastError::validation("synth sample_rate must be > 0"));
        }
        Ok(Self { sample_rate })
    }

    /// Output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of beats started before `secs`.
    pub fn beat_count(secs: f64) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        (secs / BEAT_SECS).ceil() as u64
    }

    /// Chord root of beat `beat` (0-based).
    pub fn root_hz(beat: u64) -> f64 {
        let chord = (beat / BEATS_PER_CHORD) as usize % CHORD_ROOTS_HZ.len();
        CHORD_ROOTS_HZ[chord]
    }

    /// Envelope level at `t` seconds into a beat.
    ///
    /// 0 at the beat start, ramps to 1 over [`ATTACK_SECS`], holds, then ramps back to 0 over the
    /// final [`RELEASE_SECS`] of the beat.
    pub fn envelope(t: f64) -> f32 {
        if !(0.0..BEAT_SECS).contains(&t) {
            return 0.0;
        }
        let release_start = BEAT_SECS - RELEASE_SECS;
        let level = if t < ATTACK_SECS {
            t / ATTACK_SECS
        } else if t < release_start {
            1.0
        } else {
            (BEAT_SECS - t) / RELEASE_SECS
        };
        level.clamp(0.0, 1.0) as f32
    }

    /// Render `duration_secs + MUSIC_TAIL_MARGIN_SECS` of music as mono PCM.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn render(&self, duration_secs: f64) -> SlidecastResult<AudioPcm> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(SlidecastError::validation(
                "music duration must be finite and >= 0",
            ));
        }
        let total_secs = duration_secs + MUSIC_TAIL_MARGIN_SECS;
        let sr = f64::from(self.sample_rate);
        let frames = (total_secs * sr).round() as usize;
        let beat_frames = (BEAT_SECS * sr).round() as usize;

        let mut out = vec![0.0f32; frames];
        for beat in 0..Self::beat_count(total_secs) {
            let root = Self::root_hz(beat);
            let start = beat as usize * beat_frames;
            let end = (start + beat_frames).min(frames);
            for (i, sample) in out[start.min(frames)..end].iter_mut().enumerate() {
                let t = i as f64 / sr;
                let env = Self::envelope(t);
                if env == 0.0 {
                    continue;
                }
                let tone = sine(root, t) + triangle(root * FIFTH_RATIO, t);
                *sample = tone * TONE_LEVEL * env;
            }
        }

        tracing::debug!(frames, secs = total_secs, "music synthesized");
        Ok(AudioPcm {
            sample_rate: self.sample_rate,
            channels: 1,
            interleaved_f32: out,
        })
    }
}

fn sine(hz: f64, t: f64) -> f32 {
    (std::f64::consts::TAU * hz * t).sin() as f32
}

fn triangle(hz: f64, t: f64) -> f32 {
    let phase = (hz * t).fract();
    (4.0 * (phase - 0.5).abs() - 1.0) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/audio/synth.rs"]
mod tests;
