//! `a3s-pack images` command.

use a3s_pack_runtime::{ImageReference, StoredImage};
use clap::Args;

use super::Context;
use crate::output;

#[derive(Args)]
pub struct ImagesArgs {
    /// Only show image references (one per line)
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(args: ImagesArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let images = ctx.open_image_store()?.list();

    if args.quiet {
        for image in &images {
            println!("{}", image.reference);
        }
        return Ok(());
    }

    let mut table = output::new_table(&["REPOSITORY", "TAG", "DIGEST", "SIZE", "STORED"]);
    for image in &images {
        table.add_row(image_row(image));
    }
    println!("{table}");
    Ok(())
}

fn image_row(image: &StoredImage) -> [String; 5] {
    let (repository, tag) = match ImageReference::parse(&image.reference) {
        Ok(r) => (
            format!("{}/{}", r.registry, r.repository),
            r.tag.unwrap_or_else(|| "<none>".to_string()),
        ),
        Err(_) => (image.reference.clone(), "<none>".to_string()),
    };

    [
        repository,
        tag,
        output::short_digest(&image.digest),
        output::format_bytes(image.size_bytes),
        output::format_ago(&image.stored_at),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_row() {
        let image = StoredImage {
            reference: "ghcr.io/org/pkg:1.0".to_string(),
            digest: "sha256:0123456789abcdef0123".to_string(),
            size_bytes: 2048,
            stored_at: chrono::Utc::now(),
            path: "/tmp/store/sha256/0123".into(),
        };

        let row = image_row(&image);
        assert_eq!(row[0], "ghcr.io/org/pkg");
        assert_eq!(row[1], "1.0");
        assert_eq!(row[2], "sha256:0123456789ab");
        assert_eq!(row[3], "2.0 KB");
    }

    #[test]
    fn test_image_row_digest_only_reference() {
        let image = StoredImage {
            reference: "ghcr.io/org/pkg@sha256:abc".to_string(),
            digest: "sha256:abc".to_string(),
            size_bytes: 10,
            stored_at: chrono::Utc::now(),
            path: "/tmp/store/sha256/abc".into(),
        };

        let row = image_row(&image);
        assert_eq!(row[1], "<none>");
    }
}
