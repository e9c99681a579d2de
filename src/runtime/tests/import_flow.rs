//! End-to-end import of a package image from the local image store.

#[path = "../src/oci/testing.rs"]
mod testing;

use std::sync::Arc;

use a3s_pack_core::PackError;
use a3s_pack_runtime::oci::{unpack_artifact, ImageStore, StoreFetcher};
use a3s_pack_runtime::package::{import_artifacts, Artifact, ImportOptions, ARTIFACT_LAYERS_LABEL};
use tempfile::TempDir;
use testing::LayoutBuilder;

const DETECT_A: &[(&str, &[u8])] = &[("org_a/1.0.0/bin/detect", b"#!/bin/sh\necho a\n")];
const DETECT_B: &[(&str, &[u8])] = &[("org_b/2.0.0/bin/detect", b"#!/bin/sh\necho b\n")];

fn package_label() -> String {
    format!(
        r#"{{
            "org/b": {{ "2.0.0": {{ "api": "0.2", "layerDiffID": "{b}", "stacks": [{{"id": "io.stacks.bionic"}}] }} }},
            "org/a": {{ "1.0.0": {{ "api": "0.2", "layerDiffID": "{a}",
                "order": [{{ "group": [{{ "id": "org/b", "version": "2.0.0" }}] }}] }} }}
        }}"#,
        a = LayoutBuilder::diff_id_of(DETECT_A),
        b = LayoutBuilder::diff_id_of(DETECT_B),
    )
}

fn local_fetcher(tmp: &TempDir, label: Option<&str>) -> StoreFetcher {
    let layout_dir = tmp.path().join("layout");
    let mut builder = LayoutBuilder::new()
        .layer(DETECT_A, true)
        .layer(DETECT_B, false);
    if let Some(label) = label {
        builder = builder.label(ARTIFACT_LAYERS_LABEL, label);
    }
    let written = builder.write(&layout_dir);

    let store = ImageStore::new(&tmp.path().join("store")).unwrap();
    store
        .put("ghcr.io/org/pkg:1.0", &written.manifest_digest, &layout_dir)
        .unwrap();
    StoreFetcher::local(Arc::new(store))
}

#[tokio::test]
async fn test_import_and_unpack_all_artifacts() {
    let tmp = TempDir::new().unwrap();
    let fetcher = local_fetcher(&tmp, Some(&package_label()));
    let options = ImportOptions {
        no_pull: true,
        ..Default::default()
    };

    let mut sink: Vec<Artifact> = Vec::new();
    import_artifacts("ghcr.io/org/pkg:1.0", &mut sink, &fetcher, &options)
        .await
        .unwrap();

    let names: Vec<String> = sink.iter().map(|a| a.info().full_name()).collect();
    assert_eq!(names, vec!["org/a@1.0.0", "org/b@2.0.0"]);
    assert!(sink[0].descriptor().is_composite());
    assert_eq!(sink[1].descriptor().stacks.len(), 1);

    let out = tmp.path().join("out");
    for artifact in &sink {
        unpack_artifact(artifact, &out).unwrap();
    }
    assert_eq!(
        std::fs::read_to_string(out.join("org_a/1.0.0/bin/detect")).unwrap(),
        "#!/bin/sh\necho a\n"
    );
    assert_eq!(
        std::fs::read_to_string(out.join("org_b/2.0.0/bin/detect")).unwrap(),
        "#!/bin/sh\necho b\n"
    );
}

#[tokio::test]
async fn test_artifacts_can_be_opened_repeatedly() {
    let tmp = TempDir::new().unwrap();
    let fetcher = local_fetcher(&tmp, Some(&package_label()));
    let options = ImportOptions {
        no_pull: true,
        ..Default::default()
    };

    let mut sink: Vec<Artifact> = Vec::new();
    import_artifacts("ghcr.io/org/pkg:1.0", &mut sink, &fetcher, &options)
        .await
        .unwrap();

    for _ in 0..2 {
        let mut reader = sink[1].open().unwrap();
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut buf).unwrap();
        assert_eq!(buf, testing::tar_bytes(DETECT_B));
    }
}

#[tokio::test]
async fn test_import_without_label_fails() {
    let tmp = TempDir::new().unwrap();
    let fetcher = local_fetcher(&tmp, None);
    let options = ImportOptions {
        no_pull: true,
        ..Default::default()
    };

    let mut sink: Vec<Artifact> = Vec::new();
    let err = import_artifacts("ghcr.io/org/pkg:1.0", &mut sink, &fetcher, &options)
        .await
        .unwrap_err();

    assert!(matches!(err, PackError::LabelMissing { .. }));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_import_unknown_image_fails_with_fetch_error() {
    let tmp = TempDir::new().unwrap();
    let fetcher = local_fetcher(&tmp, Some(&package_label()));
    let options = ImportOptions {
        no_pull: true,
        ..Default::default()
    };

    let mut sink: Vec<Artifact> = Vec::new();
    let err = import_artifacts("ghcr.io/org/missing:1.0", &mut sink, &fetcher, &options)
        .await
        .unwrap_err();

    assert!(matches!(err, PackError::FetchError { .. }));
    assert!(sink.is_empty());
}
