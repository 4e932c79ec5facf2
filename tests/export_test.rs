//! Static export tests

mod common;

use std::sync::Arc;

use racecard::config::SiteConfig;
use racecard::export::StaticExporter;
use racecard::models::Manifest;
use racecard::render::PageRenderer;
use racecard::resolver::{Candidate, FileTransport, ManifestResolver};

use common::{write_public_file, RACES_JSON};

#[tokio::test]
async fn test_export_resolved_site() {
    let public = tempfile::tempdir().unwrap();
    write_public_file(public.path(), "data/races.json", RACES_JSON);
    write_public_file(public.path(), "pdf/r1.pdf", "%PDF-1.4");

    let resolver = ManifestResolver::new(
        Arc::new(FileTransport::new(public.path())),
        vec![Candidate::races("/data/races.json")],
    );
    let manifest = resolver.resolve().await;

    let out = tempfile::tempdir().unwrap();
    let renderer = PageRenderer::new(SiteConfig::default()).unwrap();
    let report = StaticExporter::new(&renderer, out.path(), "raceId")
        .with_public_dir(public.path())
        .export(&manifest)
        .unwrap();

    assert_eq!(report.fragments.len(), 2);
    // data/races.json and pdf/r1.pdf
    assert_eq!(report.copied_assets, 2);
    assert!(out.path().join("pdf/r1.pdf").exists());

    let fragment = std::fs::read_to_string(out.path().join("fragments/r2.html")).unwrap();
    assert!(fragment.contains(r#"data-race-id="r2""#));

    let index = std::fs::read_to_string(&report.index).unwrap();
    assert!(index.contains(r#"data-fragment="fragments/r2.html""#));

    // The written manifest is the normalized one and resolves again
    let written = std::fs::read_to_string(out.path().join("data/races.json")).unwrap();
    let reparsed: Manifest = serde_json::from_str(&written).unwrap();
    assert_eq!(reparsed, manifest);
}

#[test]
fn test_missing_public_dir_is_skipped() {
    let out = tempfile::tempdir().unwrap();
    let renderer = PageRenderer::new(SiteConfig::default()).unwrap();

    let report = StaticExporter::new(&renderer, out.path(), "raceId")
        .with_public_dir(&out.path().join("does-not-exist"))
        .export(&Manifest::empty())
        .unwrap();

    assert_eq!(report.copied_assets, 0);
    assert!(report.index.exists());
}
