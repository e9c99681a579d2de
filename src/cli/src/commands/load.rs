//! `a3s-pack load` command.
//!
//! Loaded images are only served from the store when registry pulls are off
//! (`--no-pull` or `pull_registry: false`); otherwise the registry copy wins.

use std::path::PathBuf;

use a3s_pack_runtime::{ImageReference, OciImage};
use clap::Args;

use super::Context;
use crate::output;

#[derive(Args)]
pub struct LoadArgs {
    /// OCI image layout directory
    pub path: PathBuf,

    /// Reference to store the image under
    #[arg(short, long)]
    pub tag: String,
}

pub async fn execute(args: LoadArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let image = OciImage::from_path(&args.path)?;
    let reference = ImageReference::parse(&args.tag)?;

    let store = ctx.open_image_store()?;
    let stored = store.put(
        &reference.full_reference(),
        image.manifest_digest(),
        &args.path,
    )?;

    tracing::info!(
        reference = %stored.reference,
        digest = %stored.digest,
        "Loaded image"
    );
    println!(
        "Loaded image: {} ({})",
        stored.reference,
        output::format_bytes(stored.size_bytes)
    );
    Ok(())
}
