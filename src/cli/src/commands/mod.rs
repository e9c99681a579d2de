//! CLI command definitions and dispatch.

mod extract;
mod images;
mod inspect;
mod load;

use std::path::PathBuf;
use std::sync::Arc;

use a3s_pack_core::PackConfig;
use a3s_pack_runtime::{ImageStore, ImportOptions, RegistryPuller, StoreFetcher};
use clap::{Parser, Subcommand};

/// A3S Pack: inspect and extract the artifacts bundled in package images.
#[derive(Parser)]
#[command(name = "a3s-pack", version, about)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Fetch the package for publishing (bypass the local image store)
    #[arg(long, global = true)]
    pub publish: bool,

    /// Never pull from a registry
    #[arg(long, global = true)]
    pub no_pull: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// List the artifacts carried by a package image
    Inspect(inspect::InspectArgs),
    /// Unpack the artifacts of a package image into a directory
    Extract(extract::ExtractArgs),
    /// Add an OCI image layout directory to the image store
    ///
    /// With `pull_registry` enabled (the default), `inspect` and `extract`
    /// refresh images from the registry. Pass `--no-pull`, or set
    /// `pull_registry: false`, to use a loaded image as stored.
    Load(load::LoadArgs),
    /// List stored images
    Images(images::ImagesArgs),
}

/// Settings shared by every command.
pub(crate) struct Context {
    pub config: PackConfig,
    pub publish: bool,
    pub no_pull: bool,
}

impl Context {
    pub fn open_image_store(&self) -> Result<ImageStore, Box<dyn std::error::Error>> {
        Ok(ImageStore::new(&self.config.store_dir)?)
    }

    /// Fetcher over the image store, pulling from registries when allowed.
    pub fn fetcher(&self) -> Result<StoreFetcher, Box<dyn std::error::Error>> {
        let store = Arc::new(self.open_image_store()?);
        if self.config.pull_registry && !self.no_pull {
            Ok(StoreFetcher::with_registry(store, RegistryPuller::new()))
        } else {
            Ok(StoreFetcher::local(store))
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            publish: self.publish,
            no_pull: self.no_pull || !self.config.pull_registry,
            timeout: self.config.fetch_timeout(),
        }
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli, config: PackConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context {
        config,
        publish: cli.publish,
        no_pull: cli.no_pull,
    };

    match cli.command {
        Command::Inspect(args) => inspect::execute(args, &ctx).await,
        Command::Extract(args) => extract::execute(args, &ctx).await,
        Command::Load(args) => load::execute(args, &ctx).await,
        Command::Images(args) => images::execute(args, &ctx).await,
    }
}
