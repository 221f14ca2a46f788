pub(crate) mod paint;
/// Slide drawing.
pub mod slide;
/// Pixel surface and frame readback.
pub mod surface;
pub(crate) mod text;
/// Greedy word wrapping.
pub mod wrap;
