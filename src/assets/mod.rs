//! Input assets: slide images, voice clips, and font-backed text layout.

/// Image decoding into premultiplied RGBA.
pub mod decode;
/// Uploaded slide images.
pub mod images;
/// Audio decoding to interleaved PCM.
pub mod media;
/// Font loading and line measurement.
pub mod text;
/// Voice track assets.
pub mod voice;
