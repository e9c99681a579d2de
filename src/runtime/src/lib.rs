//! A3S Pack Runtime - artifact extraction from package images.
//!
//! A package image bundles many independently versioned artifacts, one per
//! layer, described by a JSON manifest label. This crate resolves that
//! manifest, builds lazily opened artifacts, and hands them to a sink.

#![allow(clippy::result_large_err)]

pub mod oci;
pub mod package;

// Re-export common types
pub use oci::{ImageReference, ImageStore, OciImage, RegistryPuller, StoreFetcher, StoredImage};
pub use oci::{unpack_artifact, unpack_layer};
pub use package::{
    extract_artifacts, fetch_image, import_artifacts, resolve_artifact_layers, Artifact,
    ArtifactDescriptor, ArtifactInfo, ArtifactLayers, ArtifactSink, Blob, ImageFetcher,
    ImportOptions, PackageImage, ARTIFACT_LAYERS_LABEL,
};

/// A3S Pack Runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
