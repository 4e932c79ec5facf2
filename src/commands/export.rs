use anyhow::{Context, Result};
use std::path::PathBuf;

use racecard::config::Config;
use racecard::export::StaticExporter;
use racecard::render::PageRenderer;
use racecard::resolver::ManifestResolver;

/// Resolve the manifest once and write a static copy of the site
pub async fn export(config: Config, output: Option<PathBuf>) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| config.export.output_dir.clone());

    let resolver = ManifestResolver::from_config(&config).context("Failed to create resolver")?;
    let resolution = resolver.resolve_detailed().await;

    if !resolution.is_resolved() {
        tracing::warn!("No candidate produced a manifest; exporting the empty page");
    }

    let renderer = PageRenderer::new(config.site.clone()).context("Failed to load templates")?;
    let report = StaticExporter::new(&renderer, &output_dir, &config.selection.query_param)
        .with_public_dir(&config.source.public_dir)
        .export(&resolution.manifest)?;

    println!("Exported to {}", output_dir.display());
    println!("  Index: {}", report.index.display());
    println!("  Fragments: {}", report.fragments.len());
    println!("  Manifest: {}", report.manifest.display());
    println!("  Assets copied: {}", report.copied_assets);
    if let Some(source) = resolution.source {
        println!("  Source: {}", source.location);
    }

    Ok(())
}
