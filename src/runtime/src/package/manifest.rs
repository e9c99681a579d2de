//! Artifact layer manifest carried in a package image label.

use std::collections::{BTreeMap, BTreeSet};

use a3s_pack_core::error::{PackError, Result};
use serde::{Deserialize, Serialize};

use super::PackageImage;

/// Label holding the artifact layer manifest.
pub const ARTIFACT_LAYERS_LABEL: &str = "io.buildpacks.buildpack.layers";

/// Layer metadata for one artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Artifact API version
    pub api: String,

    /// Diff ID of the layer holding the artifact
    #[serde(rename = "layerDiffID")]
    pub layer_diff_id: String,

    /// Stacks (platforms) the artifact supports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<Stack>,

    /// Group order for composite artifacts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<OrderEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// A supported stack. Decodes from `{"id": …, "mixins": […]}` or a bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StackRepr")]
pub struct Stack {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StackRepr {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        mixins: Vec<String>,
    },
}

impl From<StackRepr> for Stack {
    fn from(repr: StackRepr) -> Self {
        match repr {
            StackRepr::Id(id) => Stack {
                id,
                mixins: Vec::new(),
            },
            StackRepr::Full { id, mixins } => Stack { id, mixins },
        }
    }
}

/// One alternative group in a composite artifact's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    #[serde(default)]
    pub group: Vec<GroupRef>,
}

/// Reference to an artifact inside an order group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// Artifact id → version → layer metadata.
///
/// Backed by ordered maps, so iteration is sorted by (id, version).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactLayers(BTreeMap<String, BTreeMap<String, LayerInfo>>);

impl ArtifactLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and validate a label value.
    pub fn decode(raw: &str) -> std::result::Result<Self, String> {
        let layers: ArtifactLayers = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        layers.validate()?;
        Ok(layers)
    }

    /// Insert layer metadata, returning what was previously stored for the pair.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        version: impl Into<String>,
        info: LayerInfo,
    ) -> Option<LayerInfo> {
        self.0
            .entry(id.into())
            .or_default()
            .insert(version.into(), info)
    }

    pub fn get(&self, id: &str, version: &str) -> Option<&LayerInfo> {
        self.0.get(id).and_then(|versions| versions.get(version))
    }

    /// Number of (id, version) pairs.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(id, version, info)` in (id, version) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &LayerInfo)> {
        self.0.iter().flat_map(|(id, versions)| {
            versions
                .iter()
                .map(move |(version, info)| (id.as_str(), version.as_str(), info))
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for (id, version, info) in self.iter() {
            if info.layer_diff_id.trim().is_empty() {
                return Err(format!("artifact {id}@{version} has an empty layerDiffID"));
            }
            if info.api.trim().is_empty() {
                return Err(format!("artifact {id}@{version} has an empty api"));
            }
        }
        Ok(())
    }
}

impl LayerInfo {
    /// IDs of the supported stacks.
    pub fn stack_ids(&self) -> BTreeSet<&str> {
        self.stacks.iter().map(|s| s.id.as_str()).collect()
    }
}

/// Read the artifact layer manifest from `image`.
///
/// Returns `Ok(None)` when the label is absent or empty. A label that is
/// present but does not decode is an error naming the label and the image.
pub fn resolve_artifact_layers<I>(image: &I) -> Result<Option<ArtifactLayers>>
where
    I: PackageImage + ?Sized,
{
    let raw = match image.label(ARTIFACT_LAYERS_LABEL)? {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => {
            tracing::debug!(image = %image.name(), label = ARTIFACT_LAYERS_LABEL, "Label not set");
            return Ok(None);
        }
    };

    let layers = ArtifactLayers::decode(&raw).map_err(|message| PackError::DecodeError {
        label: ARTIFACT_LAYERS_LABEL.to_string(),
        reference: image.name().to_string(),
        message,
    })?;

    tracing::debug!(
        image = %image.name(),
        artifacts = layers.len(),
        "Resolved artifact layer manifest"
    );

    Ok(Some(layers))
}
