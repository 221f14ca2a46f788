//! Capture streams.
//!
//! Sinks consume rendered frames in timeline order. A session builds one sink per render through a
//! [`sink::SinkFactory`].

/// `ffmpeg`-based MP4 output.
pub mod ffmpeg;
/// Frame sink trait and the in-memory sink.
pub mod sink;
