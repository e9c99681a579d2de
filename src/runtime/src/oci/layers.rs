//! Layer unpacking.
//!
//! Unpacks an uncompressed layer stream (tar) into a directory.

use std::io::Read;
use std::path::Path;

use a3s_pack_core::error::{PackError, Result};
use tar::Archive;

use crate::package::Artifact;

/// Unpack a tar stream into `target_dir`, creating it if needed.
pub fn unpack_layer(reader: impl Read, target_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(target_dir).map_err(|e| {
        PackError::OciImageError(format!(
            "Failed to create target directory {}: {}",
            target_dir.display(),
            e
        ))
    })?;

    let mut archive = Archive::new(reader);
    archive.unpack(target_dir).map_err(|e| {
        PackError::OciImageError(format!(
            "Failed to extract layer to {}: {}",
            target_dir.display(),
            e
        ))
    })?;

    Ok(())
}

/// Open an artifact's layer and unpack it into `target_dir`.
///
/// The layer stream is closed before returning, on success and on error.
pub fn unpack_artifact(artifact: &Artifact, target_dir: &Path) -> Result<()> {
    let reader = artifact.open()?;
    unpack_layer(reader, target_dir)?;

    tracing::debug!(
        artifact = %artifact.info(),
        target = %target_dir.display(),
        "Unpacked artifact"
    );

    Ok(())
}
