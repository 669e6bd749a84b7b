pub mod math;

// Foundation crate: pure geometry on the globe, no engine state.
pub use math::*;
