//! Disk-based OCI image store.
//!
//! Keeps image layouts on disk under `sha256/<manifest digest>/`, with an
//! in-memory index keyed by canonical reference and persisted to
//! `index.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use a3s_pack_core::error::{PackError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Metadata for a stored OCI image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredImage {
    /// Canonical image reference (e.g., "ghcr.io/org/pkg:1.0")
    pub reference: String,
    /// Manifest digest (e.g., "sha256:abc123...")
    pub digest: String,
    pub size_bytes: u64,
    pub stored_at: DateTime<Utc>,
    /// Path to the OCI image layout on disk
    pub path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreIndex {
    images: Vec<StoredImage>,
}

/// Disk-based image store with a persistent index.
pub struct ImageStore {
    store_dir: PathBuf,
    /// reference → StoredImage
    index: RwLock<HashMap<String, StoredImage>>,
}

impl ImageStore {
    /// Open a store, creating the directory and loading any existing index.
    pub fn new(store_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(store_dir).map_err(|e| {
            PackError::OciImageError(format!(
                "Failed to create image store directory {}: {}",
                store_dir.display(),
                e
            ))
        })?;

        let index = Self::load_index(store_dir)?;
        Ok(Self {
            store_dir: store_dir.to_path_buf(),
            index: RwLock::new(index),
        })
    }

    pub fn get(&self, reference: &str) -> Option<StoredImage> {
        self.index.read().get(reference).cloned()
    }

    pub fn get_by_digest(&self, digest: &str) -> Option<StoredImage> {
        self.index
            .read()
            .values()
            .find(|img| img.digest == digest)
            .cloned()
    }

    /// Store the OCI layout in `source_dir` under `reference`.
    ///
    /// Content is shared by digest; a layout already present for `digest` is
    /// not copied again.
    pub fn put(&self, reference: &str, digest: &str, source_dir: &Path) -> Result<StoredImage> {
        let digest_hex = digest.strip_prefix("sha256:").unwrap_or(digest);
        let target_dir = self.store_dir.join("sha256").join(digest_hex);

        if !target_dir.exists() {
            copy_dir_recursive(source_dir, &target_dir).map_err(|e| {
                PackError::OciImageError(format!("Failed to copy image to store: {}", e))
            })?;
        }

        let stored = StoredImage {
            reference: reference.to_string(),
            digest: digest.to_string(),
            size_bytes: dir_size(&target_dir),
            stored_at: Utc::now(),
            path: target_dir,
        };

        self.index
            .write()
            .insert(reference.to_string(), stored.clone());
        self.save_index()?;

        tracing::debug!(reference = %reference, digest = %digest, "Stored image");
        Ok(stored)
    }

    /// Remove an image; its content is deleted once no reference uses it.
    pub fn remove(&self, reference: &str) -> Result<()> {
        let mut index = self.index.write();
        let image = index.remove(reference).ok_or_else(|| {
            PackError::OciImageError(format!("Image not found: {}", reference))
        })?;
        let digest_still_used = index.values().any(|img| img.digest == image.digest);
        drop(index);

        if !digest_still_used && image.path.exists() {
            std::fs::remove_dir_all(&image.path).map_err(|e| {
                PackError::OciImageError(format!(
                    "Failed to remove image directory {}: {}",
                    image.path.display(),
                    e
                ))
            })?;
        }

        self.save_index()
    }

    /// All stored images, sorted by reference.
    pub fn list(&self) -> Vec<StoredImage> {
        let mut images: Vec<StoredImage> = self.index.read().values().cloned().collect();
        images.sort_by(|a, b| a.reference.cmp(&b.reference));
        images
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    fn load_index(store_dir: &Path) -> Result<HashMap<String, StoredImage>> {
        let index_path = store_dir.join("index.json");
        if !index_path.exists() {
            return Ok(HashMap::new());
        }

        let data = std::fs::read_to_string(&index_path).map_err(|e| {
            PackError::OciImageError(format!(
                "Failed to read image store index {}: {}",
                index_path.display(),
                e
            ))
        })?;

        let store_index: StoreIndex = serde_json::from_str(&data).map_err(|e| {
            PackError::OciImageError(format!("Failed to parse image store index: {}", e))
        })?;

        // Drop entries whose layout directory has gone away
        Ok(store_index
            .images
            .into_iter()
            .filter(|image| image.path.exists())
            .map(|image| (image.reference.clone(), image))
            .collect())
    }

    fn save_index(&self) -> Result<()> {
        let store_index = StoreIndex {
            images: self.list(),
        };
        let data = serde_json::to_string_pretty(&store_index)?;
        let index_path = self.store_dir.join("index.json");

        std::fs::write(&index_path, data).map_err(|e| {
            PackError::OciImageError(format!(
                "Failed to write image store index {}: {}",
                index_path.display(),
                e
            ))
        })
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let mut total = 0;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                total += dir_size(&path);
            } else if let Ok(meta) = path.metadata() {
                total += meta.len();
            }
        }
    }
    total
}
