//! Location intake: the travel-history records the globe is built from.
//!
//! Records come from the album collaborator as JSON (or any
//! [`LocationSource`]); this crate owns their shape, sanitizing and
//! chronological ordering, nothing else.

pub mod location;
pub mod store;

pub use location::*;
pub use store::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound(String),
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "location not found: {id}"),
            CatalogError::Corrupt(msg) => write!(f, "location data corrupt: {msg}"),
            CatalogError::Io(msg) => write!(f, "location storage error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}
