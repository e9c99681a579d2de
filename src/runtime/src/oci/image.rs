//! OCI image layout loading.
//!
//! Reads an on-disk OCI image layout and exposes it as a [`PackageImage`]:
//! labels come from the image configuration, layers are addressed by their
//! diff ID (digest of the uncompressed tar).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use a3s_pack_core::error::{PackError, Result};
use flate2::read::GzDecoder;
use oci_spec::image::{ImageConfiguration, ImageIndex, ImageManifest};

use crate::package::PackageImage;

/// Compression of a layer blob, derived from its media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerCompression {
    None,
    Gzip,
    Zstd,
}

impl LayerCompression {
    fn from_media_type(media_type: &str) -> Self {
        if media_type.ends_with("gzip") {
            LayerCompression::Gzip
        } else if media_type.ends_with("zstd") {
            LayerCompression::Zstd
        } else {
            LayerCompression::None
        }
    }
}

/// A layer blob on disk.
#[derive(Debug, Clone)]
pub struct LayerBlobRef {
    pub digest: String,
    pub path: PathBuf,
    pub compression: LayerCompression,
}

/// An OCI image loaded from an image layout directory.
#[derive(Debug)]
pub struct OciImage {
    name: String,
    root_dir: PathBuf,
    manifest_digest: String,
    labels: HashMap<String, String>,
    /// diff ID → layer blob, from `rootfs.diff_ids[i]` ↔ `manifest.layers[i]`
    layers: HashMap<String, LayerBlobRef>,
    diff_ids: Vec<String>,
}

impl OciImage {
    /// Load an OCI image from a directory.
    ///
    /// The directory must contain a valid OCI image layout:
    /// - oci-layout file
    /// - index.json
    /// - blobs/<algorithm>/ directory with manifest, config, and layers
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let root_dir = path.as_ref().to_path_buf();

        Self::validate_oci_layout(&root_dir)?;

        let index: ImageIndex = Self::load_json(&root_dir.join("index.json"), "index.json")?;
        let manifest_digest = index
            .manifests()
            .first()
            .ok_or_else(|| PackError::OciImageError("No manifests in index.json".to_string()))?
            .digest()
            .to_string();

        let manifest: ImageManifest = Self::load_json(
            &Self::blob_path(&root_dir, &manifest_digest),
            "manifest",
        )?;

        let config_digest = manifest.config().digest().to_string();
        let config: ImageConfiguration =
            Self::load_json(&Self::blob_path(&root_dir, &config_digest), "config")?;

        let diff_ids = config.rootfs().diff_ids().clone();
        if diff_ids.len() != manifest.layers().len() {
            return Err(PackError::OciImageError(format!(
                "Image in {} has {} layers but {} diff IDs",
                root_dir.display(),
                manifest.layers().len(),
                diff_ids.len()
            )));
        }

        let layers = diff_ids
            .iter()
            .zip(manifest.layers())
            .map(|(diff_id, layer)| {
                let blob = LayerBlobRef {
                    digest: layer.digest().to_string(),
                    path: Self::blob_path(&root_dir, layer.digest()),
                    compression: LayerCompression::from_media_type(
                        &layer.media_type().to_string(),
                    ),
                };
                (diff_id.clone(), blob)
            })
            .collect();

        let labels = config
            .config()
            .as_ref()
            .and_then(|c| c.labels().clone())
            .unwrap_or_default();

        Ok(Self {
            name: root_dir.display().to_string(),
            root_dir,
            manifest_digest,
            labels,
            layers,
            diff_ids,
        })
    }

    /// Name the image after the reference it was fetched under.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn manifest_digest(&self) -> &str {
        &self.manifest_digest
    }

    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }

    /// Diff IDs in layer order, bottom to top.
    pub fn diff_ids(&self) -> &[String] {
        &self.diff_ids
    }

    pub fn layer(&self, diff_id: &str) -> Option<&LayerBlobRef> {
        self.layers.get(diff_id)
    }

    fn validate_oci_layout(root_dir: &Path) -> Result<()> {
        for required in ["oci-layout", "index.json", "blobs"] {
            if !root_dir.join(required).exists() {
                return Err(PackError::OciImageError(format!(
                    "Not a valid OCI layout: missing {} in {}",
                    required,
                    root_dir.display()
                )));
            }
        }
        Ok(())
    }

    fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PackError::OciImageError(format!(
                "Failed to read {} at {}: {}",
                what,
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| PackError::OciImageError(format!("Failed to parse {}: {}", what, e)))
    }

    /// Path of a blob by digest ("sha256:abc…" → blobs/sha256/abc…).
    fn blob_path(root_dir: &Path, digest: &str) -> PathBuf {
        let (algorithm, hash) = digest.split_once(':').unwrap_or(("sha256", digest));
        root_dir.join("blobs").join(algorithm).join(hash)
    }
}

impl PackageImage for OciImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn identifier(&self) -> Result<String> {
        Ok(self.manifest_digest.clone())
    }

    fn label(&self, name: &str) -> Result<Option<String>> {
        Ok(self.labels.get(name).cloned())
    }

    fn open_layer(&self, diff_id: &str) -> Result<Box<dyn Read + Send>> {
        let layer = self.layers.get(diff_id).ok_or_else(|| {
            PackError::OciImageError(format!(
                "Layer with diff ID {} not found in image {}",
                diff_id, self.name
            ))
        })?;

        let file = File::open(&layer.path).map_err(|e| {
            PackError::OciImageError(format!(
                "Failed to open layer blob {}: {}",
                layer.path.display(),
                e
            ))
        })?;
        let reader = BufReader::new(file);

        tracing::debug!(
            diff_id = %diff_id,
            digest = %layer.digest,
            compression = ?layer.compression,
            "Opened layer blob"
        );

        match layer.compression {
            LayerCompression::None => Ok(Box::new(reader)),
            LayerCompression::Gzip => Ok(Box::new(GzDecoder::new(reader))),
            LayerCompression::Zstd => Err(PackError::OciImageError(format!(
                "Layer {} is zstd-compressed, which is not supported",
                layer.digest
            ))),
        }
    }
}
