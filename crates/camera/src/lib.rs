//! Globe camera: points of view and smooth, cancellable transitions.

pub mod animator;
pub mod easing;
pub mod pov;

pub use animator::*;
pub use easing::*;
pub use pov::*;
