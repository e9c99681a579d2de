//! Anonymous OCI registry pulls.
//!
//! Uses the `oci-distribution` crate to download a package image into an OCI
//! image layout directory that [`OciImage`](super::OciImage) can load.

use std::path::Path;

use a3s_pack_core::error::{PackError, Result};
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::manifest::{ImageIndexEntry, OciDescriptor};
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::{Client, Reference};

use super::reference::ImageReference;

/// Pulls package images from container registries.
pub struct RegistryPuller {
    client: Client,
}

impl Default for RegistryPuller {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryPuller {
    pub fn new() -> Self {
        let config = ClientConfig {
            protocol: ClientProtocol::Https,
            platform_resolver: Some(Box::new(linux_platform_resolver)),
            ..Default::default()
        };
        Self {
            client: Client::new(config),
        }
    }

    /// Pull `reference` into `target_dir` as an OCI image layout.
    ///
    /// Returns the manifest digest.
    pub async fn pull(&self, reference: &ImageReference, target_dir: &Path) -> Result<String> {
        let oci_ref = to_oci_reference(reference)?;
        let registry = reference.registry.as_str();

        tracing::info!(
            reference = %reference,
            target = %target_dir.display(),
            "Pulling image from registry"
        );

        let blobs_dir = target_dir.join("blobs").join("sha256");
        std::fs::create_dir_all(&blobs_dir)
            .map_err(|e| registry_error(registry, "Failed to create blobs directory", e))?;

        let (manifest, manifest_digest) = self
            .client
            .pull_image_manifest(&oci_ref, &RegistryAuth::Anonymous)
            .await
            .map_err(|e| registry_error(registry, "Failed to pull manifest", e))?;

        let manifest_json = serde_json::to_vec(&manifest)?;
        write_blob(&blobs_dir, &manifest_digest, &manifest_json)
            .map_err(|e| registry_error(registry, "Failed to write manifest", e))?;

        self.pull_blob(&oci_ref, &manifest.config, &blobs_dir, registry)
            .await?;
        for layer in &manifest.layers {
            tracing::debug!(digest = %layer.digest, size = layer.size, "Pulling layer");
            self.pull_blob(&oci_ref, layer, &blobs_dir, registry).await?;
        }

        std::fs::write(
            target_dir.join("oci-layout"),
            r#"{"imageLayoutVersion":"1.0.0"}"#,
        )
        .map_err(|e| registry_error(registry, "Failed to write oci-layout", e))?;

        let index = serde_json::json!({
            "schemaVersion": 2,
            "manifests": [{
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "digest": manifest_digest,
                "size": manifest_json.len()
            }]
        });
        std::fs::write(
            target_dir.join("index.json"),
            serde_json::to_string_pretty(&index)?,
        )
        .map_err(|e| registry_error(registry, "Failed to write index.json", e))?;

        tracing::info!(
            reference = %reference,
            digest = %manifest_digest,
            "Image pulled"
        );

        Ok(manifest_digest)
    }

    async fn pull_blob(
        &self,
        oci_ref: &Reference,
        descriptor: &OciDescriptor,
        blobs_dir: &Path,
        registry: &str,
    ) -> Result<()> {
        let mut data: Vec<u8> = Vec::new();
        self.client
            .pull_blob(oci_ref, descriptor, &mut data)
            .await
            .map_err(|e| {
                registry_error(
                    registry,
                    &format!("Failed to pull blob {}", descriptor.digest),
                    e,
                )
            })?;

        write_blob(blobs_dir, &descriptor.digest, &data).map_err(|e| {
            registry_error(
                registry,
                &format!("Failed to write blob {}", descriptor.digest),
                e,
            )
        })
    }
}

fn write_blob(blobs_dir: &Path, digest: &str, data: &[u8]) -> std::io::Result<()> {
    let hex = digest.strip_prefix("sha256:").unwrap_or(digest);
    std::fs::write(blobs_dir.join(hex), data)
}

fn registry_error(registry: &str, what: &str, err: impl std::fmt::Display) -> PackError {
    PackError::RegistryError {
        registry: registry.to_string(),
        message: format!("{}: {}", what, err),
    }
}

fn to_oci_reference(reference: &ImageReference) -> Result<Reference> {
    let ref_str = match (&reference.tag, &reference.digest) {
        (_, Some(digest)) => format!("{}/{}@{}", reference.registry, reference.repository, digest),
        (Some(tag), None) => format!("{}/{}:{}", reference.registry, reference.repository, tag),
        (None, None) => format!("{}/{}:latest", reference.registry, reference.repository),
    };

    ref_str.parse::<Reference>().map_err(|e| {
        PackError::OciImageError(format!("Invalid OCI reference '{}': {}", ref_str, e))
    })
}

/// Select the linux image matching the host architecture from an index.
fn linux_platform_resolver(manifests: &[ImageIndexEntry]) -> Option<String> {
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };

    manifests
        .iter()
        .find(|entry| {
            entry
                .platform
                .as_ref()
                .map_or(false, |p| p.os == "linux" && p.architecture == arch)
        })
        .map(|entry| entry.digest.clone())
}
