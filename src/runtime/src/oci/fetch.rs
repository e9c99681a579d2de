//! Image fetching backed by the local image store and, optionally, a registry.
//!
//! | local | pull | behavior                                                  |
//! |-------|------|-----------------------------------------------------------|
//! | true  | false| store only; a missing image is an error                   |
//! | true  | true | pull and refresh the store; without a registry, use store |
//! | false | *    | pull from the registry                                    |

use std::sync::Arc;

use a3s_pack_core::error::{PackError, Result};
use async_trait::async_trait;

use super::image::OciImage;
use super::reference::ImageReference;
use super::registry::RegistryPuller;
use super::store::ImageStore;
use crate::package::{ImageFetcher, PackageImage};

/// [`ImageFetcher`] over an [`ImageStore`].
pub struct StoreFetcher {
    store: Arc<ImageStore>,
    puller: Option<RegistryPuller>,
}

impl StoreFetcher {
    /// Fetcher that never contacts a registry.
    pub fn local(store: Arc<ImageStore>) -> Self {
        Self {
            store,
            puller: None,
        }
    }

    pub fn with_registry(store: Arc<ImageStore>, puller: RegistryPuller) -> Self {
        Self {
            store,
            puller: Some(puller),
        }
    }

    fn load_stored(&self, reference: &str, key: &str) -> Result<Option<Arc<dyn PackageImage>>> {
        match self.store.get(key) {
            Some(stored) => {
                tracing::debug!(
                    reference = %key,
                    digest = %stored.digest,
                    "Using stored image"
                );
                let image = OciImage::from_path(&stored.path)?.with_name(reference);
                Ok(Some(Arc::new(image)))
            }
            None => Ok(None),
        }
    }

    async fn pull_and_store(
        &self,
        puller: &RegistryPuller,
        reference: &str,
        parsed: &ImageReference,
    ) -> Result<Arc<dyn PackageImage>> {
        let key = parsed.full_reference();
        let tmp_dir = self.store.store_dir().join("tmp").join(sanitize(&key));
        if tmp_dir.exists() {
            std::fs::remove_dir_all(&tmp_dir)?;
        }

        let pulled = puller.pull(parsed, &tmp_dir).await;
        let stored = pulled.and_then(|digest| self.store.put(&key, &digest, &tmp_dir));
        let _ = std::fs::remove_dir_all(&tmp_dir);
        let stored = stored?;

        let image = OciImage::from_path(&stored.path)?.with_name(reference);
        Ok(Arc::new(image))
    }
}

#[async_trait]
impl ImageFetcher for StoreFetcher {
    async fn fetch(
        &self,
        reference: &str,
        local: bool,
        pull: bool,
    ) -> Result<Arc<dyn PackageImage>> {
        let parsed = ImageReference::parse(reference).map_err(|e| PackError::FetchError {
            reference: reference.to_string(),
            message: e.to_string(),
        })?;
        let key = parsed.full_reference();

        if local && !pull {
            return self.load_stored(reference, &key)?.ok_or_else(|| PackError::FetchError {
                reference: reference.to_string(),
                message: "image not found locally and pulling is disabled".to_string(),
            });
        }

        match &self.puller {
            Some(puller) => self.pull_and_store(puller, reference, &parsed).await,
            None if local => self.load_stored(reference, &key)?.ok_or_else(|| {
                PackError::FetchError {
                    reference: reference.to_string(),
                    message: "image not found locally and no registry is configured"
                        .to_string(),
                }
            }),
            None => Err(PackError::FetchError {
                reference: reference.to_string(),
                message: "remote image requested but no registry is configured".to_string(),
            }),
        }
    }
}

fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}
