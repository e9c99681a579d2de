//! Artifact descriptors and their lazily opened layer content.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use a3s_pack_core::error::{PackError, Result};
use serde::Serialize;

use super::manifest::{LayerInfo, OrderEntry, Stack};
use super::PackageImage;

/// Identity of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArtifactInfo {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl ArtifactInfo {
    /// `id@version`, or just `id` when the version is empty.
    pub fn full_name(&self) -> String {
        if self.version.is_empty() {
            self.id.clone()
        } else {
            format!("{}@{}", self.id, self.version)
        }
    }
}

impl fmt::Display for ArtifactInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// Descriptor of one artifact version found in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    pub api: String,
    pub info: ArtifactInfo,
    pub stacks: Vec<Stack>,
    pub order: Vec<OrderEntry>,
}

impl ArtifactDescriptor {
    pub fn from_layer_info(id: &str, version: &str, layer: &LayerInfo) -> Self {
        Self {
            api: layer.api.clone(),
            info: ArtifactInfo {
                id: id.to_string(),
                version: version.to_string(),
                homepage: layer.homepage.clone(),
            },
            stacks: layer.stacks.clone(),
            order: layer.order.clone(),
        }
    }

    pub fn stack_ids(&self) -> BTreeSet<&str> {
        self.stacks.iter().map(|s| s.id.as_str()).collect()
    }

    /// Composite artifacts reference other artifacts through an order.
    pub fn is_composite(&self) -> bool {
        !self.order.is_empty()
    }
}

/// Content that is opened on demand.
///
/// No resource is held until [`Blob::open`] is called; every call opens a
/// fresh stream, which is closed when dropped.
pub trait Blob: Send + Sync {
    fn open(&self) -> Result<Box<dyn Read + Send>>;
}

/// Blob backed by one layer of a package image.
pub struct LayerBlob {
    image: Arc<dyn PackageImage>,
    diff_id: String,
    artifact: String,
    image_name: String,
}

impl LayerBlob {
    pub fn new(image: Arc<dyn PackageImage>, diff_id: &str, artifact: &str) -> Self {
        let image_name = image.name().to_string();
        Self {
            image,
            diff_id: diff_id.to_string(),
            artifact: artifact.to_string(),
            image_name,
        }
    }

    pub fn diff_id(&self) -> &str {
        &self.diff_id
    }
}

impl Blob for LayerBlob {
    fn open(&self) -> Result<Box<dyn Read + Send>> {
        tracing::debug!(
            artifact = %self.artifact,
            diff_id = %self.diff_id,
            image = %self.image_name,
            "Opening artifact layer"
        );

        self.image
            .open_layer(&self.diff_id)
            .map_err(|e| PackError::LayerOpenError {
                artifact: self.artifact.clone(),
                diff_id: self.diff_id.clone(),
                image: self.image_name.clone(),
                source: Box::new(e),
            })
    }
}

impl fmt::Debug for LayerBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerBlob")
            .field("diff_id", &self.diff_id)
            .field("artifact", &self.artifact)
            .field("image", &self.image_name)
            .finish()
    }
}

/// An artifact: its descriptor plus the blob holding its content.
pub struct Artifact {
    descriptor: ArtifactDescriptor,
    blob: Box<dyn Blob>,
}

impl Artifact {
    pub fn new(descriptor: ArtifactDescriptor, blob: Box<dyn Blob>) -> Self {
        Self { descriptor, blob }
    }

    pub fn descriptor(&self) -> &ArtifactDescriptor {
        &self.descriptor
    }

    pub fn info(&self) -> &ArtifactInfo {
        &self.descriptor.info
    }

    /// Open the artifact's content as an uncompressed tar stream.
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        self.blob.open()
    }

    pub fn into_parts(self) -> (ArtifactDescriptor, Box<dyn Blob>) {
        (self.descriptor, self.blob)
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::testing::FakeImage;

    fn layer_info(diff_id: &str) -> LayerInfo {
        LayerInfo {
            api: "0.2".to_string(),
            layer_diff_id: diff_id.to_string(),
            stacks: vec![Stack {
                id: "io.buildpacks.stacks.bionic".to_string(),
                mixins: Vec::new(),
            }],
            order: Vec::new(),
            homepage: Some("https://example.com/a".to_string()),
        }
    }

    #[test]
    fn test_full_name() {
        let info = ArtifactInfo {
            id: "org/a".to_string(),
            version: "1.0.0".to_string(),
            homepage: None,
        };
        assert_eq!(info.full_name(), "org/a@1.0.0");
        assert_eq!(info.to_string(), "org/a@1.0.0");

        let unversioned = ArtifactInfo {
            version: String::new(),
            ..info
        };
        assert_eq!(unversioned.full_name(), "org/a");
    }

    #[test]
    fn test_descriptor_from_layer_info() {
        let descriptor = ArtifactDescriptor::from_layer_info("org/a", "1.0.0", &layer_info("sha256:aaa"));
        assert_eq!(descriptor.api, "0.2");
        assert_eq!(descriptor.info.id, "org/a");
        assert_eq!(descriptor.info.version, "1.0.0");
        assert_eq!(descriptor.info.homepage.as_deref(), Some("https://example.com/a"));
        assert_eq!(
            descriptor.stack_ids(),
            BTreeSet::from(["io.buildpacks.stacks.bionic"])
        );
        assert!(!descriptor.is_composite());
    }

    #[test]
    fn test_layer_blob_reads_content() {
        let image: Arc<dyn PackageImage> =
            Arc::new(FakeImage::new("org/pkg").with_layer("sha256:aaa", b"layer-bytes"));
        let blob = LayerBlob::new(image, "sha256:aaa", "org/a@1.0.0");

        let mut content = String::new();
        blob.open().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "layer-bytes");
    }

    #[test]
    fn test_layer_blob_opens_every_time() {
        let fake = Arc::new(FakeImage::new("org/pkg").with_layer("sha256:aaa", b"x"));
        let blob = LayerBlob::new(fake.clone(), "sha256:aaa", "org/a@1.0.0");

        drop(blob.open().unwrap());
        drop(blob.open().unwrap());
        assert_eq!(fake.opened(), vec!["sha256:aaa", "sha256:aaa"]);
    }

    #[test]
    fn test_layer_blob_open_failure_is_contextual() {
        let image: Arc<dyn PackageImage> = Arc::new(FakeImage::new("registry.example/org/pkg"));
        let blob = LayerBlob::new(image, "sha256:aaa", "org/a@1.0.0");

        let err = blob.open().err().unwrap();
        assert!(matches!(err, PackError::LayerOpenError { .. }));
        let msg = err.to_string();
        assert!(msg.contains("org/a"));
        assert!(msg.contains("1.0.0"));
        assert!(msg.contains("sha256:aaa"));
        assert!(msg.contains("registry.example/org/pkg"));
    }

    #[test]
    fn test_artifact_serializes_descriptor() {
        let descriptor = ArtifactDescriptor::from_layer_info("org/a", "1.0.0", &layer_info("sha256:aaa"));
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["info"]["id"], "org/a");
        assert_eq!(json["info"]["version"], "1.0.0");
        assert_eq!(json["api"], "0.2");
        assert_eq!(json["stacks"][0]["id"], "io.buildpacks.stacks.bionic");
    }
}
