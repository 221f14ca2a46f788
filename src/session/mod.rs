//! Render sessions: the state machine, one capture run, and the workspace that owns both.

/// Published output artifact.
pub mod artifact;
/// One capture run.
pub mod capture;
/// Session state machine.
pub mod state;
/// Editor workspace and render entry points.
pub mod workspace;
