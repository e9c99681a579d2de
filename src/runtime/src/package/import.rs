//! Import every artifact of a package image into a sink.

use std::sync::Arc;
use std::time::Duration;

use a3s_pack_core::error::{PackError, Result};

use super::artifact::Artifact;
use super::extract::extract_artifacts;
use super::manifest::{resolve_artifact_layers, ARTIFACT_LAYERS_LABEL};
use super::{ImageFetcher, PackageImage};

/// Receives the artifacts of an imported package.
pub trait ArtifactSink {
    fn add_artifact(&mut self, artifact: Artifact);
}

impl ArtifactSink for Vec<Artifact> {
    fn add_artifact(&mut self, artifact: Artifact) {
        self.push(artifact);
    }
}

/// Options for [`import_artifacts`].
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// The package is fetched for publishing; skip the local store.
    pub publish: bool,
    /// Never contact a registry.
    pub no_pull: bool,
    /// Upper bound on the fetch.
    pub timeout: Option<Duration>,
}

/// Fetch `reference` with the flags and time limit in `options`.
///
/// `publish` disables the local store and `no_pull` disables the registry.
/// Fetch errors are returned as the fetcher produced them.
pub async fn fetch_image<F>(
    reference: &str,
    fetcher: &F,
    options: &ImportOptions,
) -> Result<Arc<dyn PackageImage>>
where
    F: ImageFetcher + ?Sized,
{
    let fetch = fetcher.fetch(reference, !options.publish, !options.no_pull);
    match options.timeout {
        Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
            PackError::TimeoutError(format!(
                "fetching image {} did not finish within {:?}",
                reference, limit
            ))
        })?,
        None => fetch.await,
    }
}

/// Fetch `reference` and hand every artifact it carries to `sink`.
///
/// The image must carry the artifact layer label. Artifacts reach the sink
/// only after all of them were extracted.
pub async fn import_artifacts<S, F>(
    reference: &str,
    sink: &mut S,
    fetcher: &F,
    options: &ImportOptions,
) -> Result<()>
where
    S: ArtifactSink + ?Sized,
    F: ImageFetcher + ?Sized,
{
    let image = fetch_image(reference, fetcher, options).await?;

    let layers = resolve_artifact_layers(image.as_ref())?.ok_or_else(|| {
        PackError::LabelMissing {
            label: ARTIFACT_LAYERS_LABEL.to_string(),
            reference: reference.to_string(),
        }
    })?;

    let artifacts = extract_artifacts(&image, &layers)?;

    let digest = match image.identifier() {
        Ok(digest) => Some(digest),
        Err(e) => {
            tracing::debug!(image = %image.name(), error = %e, "Image identifier unavailable");
            None
        }
    };
    tracing::info!(
        reference = %reference,
        image = %image.name(),
        digest = ?digest,
        count = artifacts.len(),
        "Importing package artifacts"
    );

    for artifact in artifacts {
        sink.add_artifact(artifact);
    }

    Ok(())
}
