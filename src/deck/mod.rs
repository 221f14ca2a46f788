//! Slide deck model: editor style parameters and the slide list derived from them.

/// Slide list derived from benefit text.
pub mod slides;
/// Editor style parameters.
pub mod style;
