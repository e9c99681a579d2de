//! OCI image reference parsing.
//!
//! Normalizes references like `ghcr.io/org/pkg:1.0` so the image store can key
//! images by one canonical string.

use a3s_pack_core::error::{PackError, Result};

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Default tag when neither tag nor digest is specified.
const DEFAULT_TAG: &str = "latest";

/// Parsed OCI image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname, with optional port
    pub registry: String,
    /// Repository path (e.g., "library/nginx", "org/pkg")
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse `[registry/]repository[:tag][@digest]`.
    ///
    /// A first path component is a registry when it contains `.` or `:` or is
    /// `localhost`. Docker Hub single-component names get the `library/`
    /// prefix, and the tag defaults to `latest` unless a digest is given.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(PackError::OciImageError("Empty image reference".to_string()));
        }

        let (name_tag, digest) = match reference.split_once('@') {
            Some((name, digest)) => {
                if !digest.contains(':') {
                    return Err(PackError::OciImageError(format!(
                        "Invalid digest format in reference '{}': expected algorithm:hex",
                        reference
                    )));
                }
                (name, Some(digest.to_string()))
            }
            None => (reference, None),
        };

        // A tag colon can only appear after the last slash; earlier colons
        // belong to a registry port.
        let last_segment_start = name_tag.rfind('/').map_or(0, |pos| pos + 1);
        let (name, tag) = match name_tag[last_segment_start..].rfind(':') {
            Some(colon) => {
                let split = last_segment_start + colon;
                (&name_tag[..split], Some(name_tag[split + 1..].to_string()))
            }
            None => (name_tag, None),
        };

        if name.is_empty() || tag.as_deref() == Some("") {
            return Err(PackError::OciImageError(format!(
                "Invalid image reference '{}'",
                reference
            )));
        }

        let (registry, repository) = Self::split_registry_repository(name)?;
        let tag = match (tag, &digest) {
            (None, None) => Some(DEFAULT_TAG.to_string()),
            (tag, _) => tag,
        };

        Ok(ImageReference {
            registry,
            repository,
            tag,
            digest,
        })
    }

    fn split_registry_repository(name: &str) -> Result<(String, String)> {
        if let Some((first, rest)) = name.split_once('/') {
            if first.contains('.') || first.contains(':') || first == "localhost" {
                if rest.is_empty() {
                    return Err(PackError::OciImageError(format!(
                        "Empty repository in reference '{}'",
                        name
                    )));
                }
                return Ok((first.to_string(), rest.to_string()));
            }
            return Ok((DEFAULT_REGISTRY.to_string(), name.to_string()));
        }

        Ok((DEFAULT_REGISTRY.to_string(), format!("library/{}", name)))
    }

    /// Canonical `registry/repository[:tag][@digest]` string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.repository);
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}
