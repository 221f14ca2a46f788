//! Per-slide entrance animation: the easing curve and the frame scheduler.

/// Easing curve.
pub mod ease;
/// Frame plan and tick scheduling.
pub mod scheduler;
