//! OCI image support for package images.
//!
//! Package images are stored as OCI image layouts:
//!
//! ```text
//! image/
//! ├── oci-layout           (OCI layout marker)
//! ├── index.json           (Image index)
//! └── blobs/
//!     └── sha256/
//!         ├── <manifest>   (Image manifest)
//!         ├── <config>     (Image configuration, carries labels)
//!         └── <layers>     (One layer per artifact)
//! ```

pub mod fetch;
mod image;
mod layers;
pub mod reference;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::StoreFetcher;
pub use image::{LayerBlobRef, LayerCompression, OciImage};
pub use layers::{unpack_artifact, unpack_layer};
pub use reference::ImageReference;
pub use registry::RegistryPuller;
pub use store::{ImageStore, StoredImage};
