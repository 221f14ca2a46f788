use std::path::Path;

use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::foundation::fs::{TempFileGuard, unique_temp_path};

/// Internal audio mixing sample rate used across decode/mix/encode pipeline.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Internal mix channel count (interleaved stereo).
pub const MIX_CHANNELS: u16 = 2;

#[derive(Clone, Debug, PartialEq)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode audio from a media file to stereo interleaved `f32` PCM through `ffmpeg`.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> SlidecastResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| SlidecastError::playback(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(SlidecastError::playback(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(SlidecastError::playback(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: MIX_CHANNELS,
        interleaved_f32: pcm,
    })
}

/// Decode in-memory encoded audio (any container `ffmpeg` understands).
///
/// The bytes are spooled to a temp file first; `ffmpeg` needs a seekable input for most
/// containers.
pub fn decode_audio_bytes(
    bytes: &[u8],
    ext_hint: &str,
    sample_rate: u32,
) -> SlidecastResult<AudioPcm> {
    if bytes.is_empty() {
        return Err(SlidecastError::playback("voice clip is empty"));
    }
    let path = unique_temp_path(&std::env::temp_dir(), "voice", ext_hint);
    std::fs::write(&path, bytes).map_err(|e| {
        SlidecastError::playback(format!(
            "failed to spool voice clip to '{}': {e}",
            path.display()
        ))
    })?;
    let guard = TempFileGuard::new(path);
    let Some(path) = guard.path() else {
        return Err(SlidecastError::playback("voice temp path missing"));
    };
    decode_audio_f32_stereo(path, sample_rate)
}


// Decoding real clips shells out to `ffmpeg` and is covered by integration tests that skip when
// the tool is unavailable.
