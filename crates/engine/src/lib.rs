//! Wires clustering, camera and flight playback behind one per-frame entry
//! point for the globe renderer.

pub mod config;
pub mod globe;

pub use config::*;
pub use globe::*;
