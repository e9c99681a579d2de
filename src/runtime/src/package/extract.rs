//! Build artifacts from a resolved artifact layer manifest.

use std::sync::Arc;

use a3s_pack_core::error::Result;

use super::artifact::{Artifact, ArtifactDescriptor, LayerBlob};
use super::manifest::ArtifactLayers;
use super::PackageImage;

/// Build one [`Artifact`] per (id, version) pair in `layers`.
///
/// No layer is opened here. Each artifact's blob captures its own diff ID,
/// full name and the image name, and opens the layer only when asked.
/// Artifacts come out sorted by (id, version).
pub fn extract_artifacts(
    image: &Arc<dyn PackageImage>,
    layers: &ArtifactLayers,
) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::with_capacity(layers.len());

    for (id, version, layer) in layers.iter() {
        let descriptor = ArtifactDescriptor::from_layer_info(id, version, layer);
        let blob = LayerBlob::new(
            Arc::clone(image),
            &layer.layer_diff_id,
            &descriptor.info.full_name(),
        );

        tracing::debug!(
            artifact = %descriptor.info,
            diff_id = %layer.layer_diff_id,
            "Extracted artifact"
        );

        artifacts.push(Artifact::new(descriptor, Box::new(blob)));
    }

    Ok(artifacts)
}
