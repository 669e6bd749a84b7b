//! Chronological multi-stop flight playback over a set of visited locations.

pub mod config;
pub mod events;
pub mod segment;
pub mod sequencer;

pub use config::*;
pub use events::*;
pub use segment::*;
pub use sequencer::*;
