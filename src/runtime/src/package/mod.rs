//! Nested artifact import from package images.
//!
//! A package image carries a set of independently versioned artifacts, each
//! stored in its own layer. The `io.buildpacks.buildpack.layers` label maps
//! artifact id → version → layer metadata:
//!
//! ```text
//! {
//!   "org/a": {
//!     "1.0.0": { "api": "0.2", "layerDiffID": "sha256:…", "stacks": [...], "order": [...] }
//!   }
//! }
//! ```
//!
//! The pipeline is fetch → [`resolve_artifact_layers`] → [`extract_artifacts`]
//! → [`ArtifactSink`]. Layers are never read during extraction; each
//! [`Artifact`] owns a [`Blob`] that opens its layer on demand.

mod artifact;
mod extract;
mod import;
mod manifest;

use std::io::Read;
use std::sync::Arc;

use a3s_pack_core::error::Result;
use async_trait::async_trait;

pub use artifact::{Artifact, ArtifactDescriptor, ArtifactInfo, Blob, LayerBlob};
pub use extract::extract_artifacts;
pub use import::{fetch_image, import_artifacts, ArtifactSink, ImportOptions};
pub use manifest::{
    resolve_artifact_layers, ArtifactLayers, GroupRef, LayerInfo, OrderEntry, Stack,
    ARTIFACT_LAYERS_LABEL,
};

/// An already-fetched image that artifacts can be extracted from.
pub trait PackageImage: Send + Sync {
    /// Reference the image was fetched under.
    fn name(&self) -> &str;

    /// Content identifier of the image (manifest digest).
    fn identifier(&self) -> Result<String>;

    /// Read a label. `Ok(None)` when the label is not set.
    fn label(&self, name: &str) -> Result<Option<String>>;

    /// Open the uncompressed layer whose diff ID is `diff_id`.
    fn open_layer(&self, diff_id: &str) -> Result<Box<dyn Read + Send>>;
}

/// Retrieves package images by reference.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch `reference`.
    ///
    /// `local` prefers the local image store over the registry; `pull` allows
    /// contacting the registry at all. Their exact policy belongs to the
    /// implementation.
    async fn fetch(&self, reference: &str, local: bool, pull: bool)
        -> Result<Arc<dyn PackageImage>>;
}
