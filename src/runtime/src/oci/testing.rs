//! OCI image layout fixtures for tests.
//!
//! Only depends on external crates so integration tests can include it with
//! `#[path]`.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

/// Build an uncompressed tar archive holding `files`.
pub fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn sha256_digest(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Digests of a written layout.
#[derive(Debug, Clone)]
pub struct WrittenLayout {
    pub manifest_digest: String,
    pub diff_ids: Vec<String>,
}

/// Writes a single-manifest OCI image layout.
#[derive(Default)]
pub struct LayoutBuilder {
    labels: Vec<(String, String)>,
    /// (uncompressed tar, gzip it)
    layers: Vec<(Vec<u8>, bool)>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels.push((key.to_string(), value.to_string()));
        self
    }

    pub fn layer(mut self, files: &[(&str, &[u8])], gzip: bool) -> Self {
        self.layers.push((tar_bytes(files), gzip));
        self
    }

    /// Diff ID a layer built from `files` will get.
    pub fn diff_id_of(files: &[(&str, &[u8])]) -> String {
        sha256_digest(&tar_bytes(files))
    }

    pub fn write(self, dir: &Path) -> WrittenLayout {
        let blobs = dir.join("blobs").join("sha256");
        std::fs::create_dir_all(&blobs).unwrap();
        std::fs::write(dir.join("oci-layout"), r#"{"imageLayoutVersion":"1.0.0"}"#).unwrap();

        let write_blob = |data: &[u8]| -> String {
            let digest = sha256_digest(data);
            std::fs::write(blobs.join(digest.trim_start_matches("sha256:")), data).unwrap();
            digest
        };

        let mut diff_ids = Vec::new();
        let mut layer_descriptors = Vec::new();
        for (tar, compress) in &self.layers {
            diff_ids.push(sha256_digest(tar));
            let (blob, media_type) = if *compress {
                (gzip(tar), "application/vnd.oci.image.layer.v1.tar+gzip")
            } else {
                (tar.clone(), "application/vnd.oci.image.layer.v1.tar")
            };
            let digest = write_blob(&blob);
            layer_descriptors.push(serde_json::json!({
                "mediaType": media_type,
                "digest": digest,
                "size": blob.len(),
            }));
        }

        let labels: serde_json::Map<String, serde_json::Value> = self
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        let config = serde_json::to_vec(&serde_json::json!({
            "architecture": "amd64",
            "os": "linux",
            "config": { "Labels": labels },
            "rootfs": { "type": "layers", "diff_ids": diff_ids },
            "history": [],
        }))
        .unwrap();
        let config_digest = write_blob(&config);

        let manifest = serde_json::to_vec(&serde_json::json!({
            "schemaVersion": 2,
            "mediaType": "application/vnd.oci.image.manifest.v1+json",
            "config": {
                "mediaType": "application/vnd.oci.image.config.v1+json",
                "digest": config_digest,
                "size": config.len(),
            },
            "layers": layer_descriptors,
        }))
        .unwrap();
        let manifest_digest = write_blob(&manifest);

        let index = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": "application/vnd.oci.image.index.v1+json",
            "manifests": [{
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "digest": manifest_digest,
                "size": manifest.len(),
            }],
        });
        std::fs::write(dir.join("index.json"), serde_json::to_vec(&index).unwrap()).unwrap();

        WrittenLayout {
            manifest_digest,
            diff_ids,
        }
    }
}
