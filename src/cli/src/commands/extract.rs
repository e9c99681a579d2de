//! `a3s-pack extract` command.

use std::path::{Component, Path, PathBuf};

use a3s_pack_runtime::package::{import_artifacts, Artifact, ArtifactInfo};
use a3s_pack_runtime::unpack_artifact;
use clap::Args;

use super::Context;

#[derive(Args)]
pub struct ExtractArgs {
    /// Package image reference
    pub image: String,

    /// Directory to unpack artifacts into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Only extract this artifact ("id" or "id@version")
    #[arg(long)]
    pub artifact: Option<String>,
}

pub async fn execute(args: ExtractArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = ctx.fetcher()?;
    let mut artifacts: Vec<Artifact> = Vec::new();
    import_artifacts(&args.image, &mut artifacts, &fetcher, &ctx.import_options()).await?;

    let selector = args.artifact.as_deref().map(Selector::parse);
    let selected: Vec<&Artifact> = artifacts
        .iter()
        .filter(|a| selector.as_ref().map_or(true, |s| s.matches(a.info())))
        .collect();

    if selected.is_empty() {
        return Err(match args.artifact {
            Some(wanted) => format!("artifact {wanted} not found in {}", args.image).into(),
            None => format!("package {} carries no artifacts", args.image).into(),
        });
    }

    let targets = selected
        .iter()
        .map(|artifact| artifact_dir(&args.output, artifact.info()))
        .collect::<Result<Vec<_>, _>>()?;

    for (artifact, target) in selected.into_iter().zip(targets) {
        unpack_artifact(artifact, &target)?;
        println!("{} -> {}", artifact.info(), target.display());
    }

    Ok(())
}

/// Artifact filter from `id` or `id@version`.
struct Selector<'a> {
    id: &'a str,
    version: Option<&'a str>,
}

impl<'a> Selector<'a> {
    fn parse(raw: &'a str) -> Self {
        match raw.rsplit_once('@') {
            Some((id, version)) => Self {
                id,
                version: Some(version),
            },
            None => Self {
                id: raw,
                version: None,
            },
        }
    }

    fn matches(&self, info: &ArtifactInfo) -> bool {
        info.id == self.id && self.version.map_or(true, |v| info.version == v)
    }
}

/// `<root>/<id with '/' replaced by '_'>/<version>`.
///
/// Id and version come from the image label, so each must stay a single
/// plain path component below `root`.
fn artifact_dir(root: &Path, info: &ArtifactInfo) -> Result<PathBuf, String> {
    let id = info.id.replace('/', "_");
    for (what, segment) in [("id", id.as_str()), ("version", info.version.as_str())] {
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(format!(
                    "artifact {} has an unusable {} {:?} for an output path",
                    info, what, segment
                ))
            }
        }
    }
    Ok(root.join(id).join(&info.version))
}
