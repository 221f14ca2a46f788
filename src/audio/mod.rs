/// Two-bus audio mix.
pub mod graph;
/// Procedural background music.
pub mod synth;
