//! `a3s-pack inspect` command.

use a3s_pack_core::PackError;
use a3s_pack_runtime::package::{
    fetch_image, resolve_artifact_layers, ArtifactLayers, ARTIFACT_LAYERS_LABEL,
};
use a3s_pack_runtime::{ImageFetcher, ImportOptions};
use clap::Args;

use super::Context;
use crate::output;

#[derive(Args)]
pub struct InspectArgs {
    /// Package image reference (e.g., "ghcr.io/org/pkg:1.0")
    pub image: String,

    /// Print the artifact layer manifest as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: InspectArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = ctx.fetcher()?;
    let layers = load_manifest(&args.image, &fetcher, &ctx.import_options()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&layers)?);
        return Ok(());
    }

    println!("{}", render_table(&layers));
    Ok(())
}

/// Fetch `reference` and read its artifact layer manifest.
async fn load_manifest<F>(
    reference: &str,
    fetcher: &F,
    options: &ImportOptions,
) -> a3s_pack_core::Result<ArtifactLayers>
where
    F: ImageFetcher + ?Sized,
{
    let image = fetch_image(reference, fetcher, options).await?;
    resolve_artifact_layers(image.as_ref())?.ok_or_else(|| PackError::LabelMissing {
        label: ARTIFACT_LAYERS_LABEL.to_string(),
        reference: reference.to_string(),
    })
}

fn render_table(layers: &ArtifactLayers) -> comfy_table::Table {
    let mut table = output::new_table(&["ID", "VERSION", "API", "STACKS", "DIFF ID"]);
    for (id, version, info) in layers.iter() {
        table.add_row([
            id.to_string(),
            version.to_string(),
            info.api.clone(),
            output::format_stacks(&info.stack_ids()),
            output::short_digest(&info.layer_diff_id),
        ]);
    }
    table
}
