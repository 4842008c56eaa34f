pub mod artifact;
pub mod source;

pub use artifact::{Artifact, ArtifactError, ArtifactKind, ArtifactStore, InMemoryArtifactStore};
pub use source::DocumentSource;
