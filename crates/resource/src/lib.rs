//! Artifact stores for the tagpress converter.
//!
//! This crate provides the filesystem implementation of the
//! `ArtifactStore` trait from tagpress-traits.
//!
//! ## Available Stores
//!
//! - [`FilesystemArtifactStore`]: Writes artifacts next to the output document
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the in-memory store from tagpress-traits:
//! - [`InMemoryArtifactStore`]: Keeps artifacts in memory

mod filesystem;

pub use filesystem::{ArtifactCache, FilesystemArtifactStore};

// Re-export the in-memory store from tagpress-traits for convenience
pub use tagpress_traits::InMemoryArtifactStore;
