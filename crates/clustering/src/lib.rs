pub mod cluster;
pub mod config;

pub use cluster::*;
pub use config::*;
