//! Static site export
//!
//! Writes a self-contained copy of the race card that any static file host
//! can serve:
//!
//! ```text
//! out/
//! ├── index.html              page with the first race selected
//! ├── fragments/<id>.html     one race card per race
//! ├── data/races.json         the resolved manifest, normalized
//! └── ...                     everything from the public directory
//! ```
//!
//! The exported page reads the selection key from the query on load and
//! swaps in the matching fragment, so shared links keep working without a
//! server.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::Manifest;
use crate::render::{fragment_file_name, FragmentLinks, PageRenderer};
use crate::selection::{QueryState, SelectionCoordinator};

/// Files written by one export
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub index: PathBuf,
    pub manifest: PathBuf,
    pub fragments: Vec<PathBuf>,
    pub copied_assets: usize,
}

/// Renders the race card into a directory
pub struct StaticExporter<'a> {
    renderer: &'a PageRenderer,
    output_dir: PathBuf,
    query_param: String,
    public_dir: Option<PathBuf>,
}

impl<'a> StaticExporter<'a> {
    /// Create an exporter writing into `output_dir`
    pub fn new(renderer: &'a PageRenderer, output_dir: &Path, query_param: &str) -> Self {
        Self {
            renderer,
            output_dir: output_dir.to_path_buf(),
            query_param: query_param.to_string(),
            public_dir: None,
        }
    }

    /// Also copy static assets (PDFs, images) from `public_dir`
    pub fn with_public_dir(mut self, public_dir: &Path) -> Self {
        self.public_dir = Some(public_dir.to_path_buf());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export `manifest`
    ///
    /// Public assets are copied first so the generated files win over any
    /// same-named file in the public directory.
    pub fn export(&self, manifest: &Manifest) -> Result<ExportReport> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory: {}", self.output_dir.display())
        })?;

        let copied_assets = match &self.public_dir {
            Some(public_dir) if public_dir.is_dir() => self.copy_public(public_dir)?,
            Some(public_dir) => {
                tracing::warn!(path = %public_dir.display(), "Public directory not found, skipping assets");
                0
            }
            None => 0,
        };

        let fragments_dir = self.output_dir.join("fragments");
        fs::create_dir_all(&fragments_dir).context("Failed to create fragments directory")?;

        let mut fragments = Vec::with_capacity(manifest.len());
        for race in manifest.iter() {
            let html = self.renderer.render_fragment(race)?;
            let path = fragments_dir.join(fragment_file_name(&race.id));
            write_file(&path, html.as_bytes())?;
            fragments.push(path);
        }

        let coordinator = SelectionCoordinator::new(
            manifest.clone(),
            QueryState::new(),
            self.query_param.as_str(),
        );
        let index_html = self.renderer.render_page(&coordinator, FragmentLinks::Static)?;
        let index = self.output_dir.join("index.html");
        write_file(&index, index_html.as_bytes())?;

        let data_dir = self.output_dir.join("data");
        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;
        let manifest_path = data_dir.join("races.json");
        let json = serde_json::to_vec_pretty(manifest).context("Failed to serialize manifest")?;
        write_file(&manifest_path, &json)?;

        tracing::info!(
            output = %self.output_dir.display(),
            races = manifest.len(),
            assets = copied_assets,
            "Exported static site"
        );

        Ok(ExportReport {
            index,
            manifest: manifest_path,
            fragments,
            copied_assets,
        })
    }

    fn copy_public(&self, public_dir: &Path) -> Result<usize> {
        let public_root = fs::canonicalize(public_dir)
            .with_context(|| format!("Failed to resolve public directory: {}", public_dir.display()))?;
        let output_root = fs::canonicalize(&self.output_dir).with_context(|| {
            format!("Failed to resolve output directory: {}", self.output_dir.display())
        })?;

        if output_root == public_root {
            bail!(
                "Output directory must differ from the public directory: {}",
                public_dir.display()
            );
        }

        // An output directory inside the public tree is left out of the copy
        let nested_output = output_root
            .strip_prefix(&public_root)
            .ok()
            .map(|relative| public_dir.join(relative));
        if let Some(nested) = &nested_output {
            tracing::warn!(path = %nested.display(), "Output directory is inside the public directory, skipping it");
        }

        let mut copied = 0;

        let walker = WalkDir::new(public_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| nested_output.as_deref() != Some(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable public entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(public_dir)
                .context("Asset outside public directory")?;
            let target = self.output_dir.join(relative);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }

            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Wrote export file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::models::RaceRecord;

    #[test]
    fn test_export_layout() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PageRenderer::new(SiteConfig::default()).unwrap();
        let manifest =
            Manifest::from_races(vec![RaceRecord::new("r1", "A"), RaceRecord::new("r 2", "B")])
                .unwrap();

        let exporter = StaticExporter::new(&renderer, dir.path(), "raceId");
        let report = exporter.export(&manifest).unwrap();

        assert!(report.index.exists());
        assert_eq!(report.fragments.len(), 2);
        assert!(dir.path().join("fragments/r1.html").exists());
        assert!(dir.path().join("fragments/r%202.html").exists());

        let index = fs::read_to_string(&report.index).unwrap();
        assert!(index.contains(r#"data-fragment="fragments/r1.html" selected"#));
        assert!(index.contains(r#"data-fragment="fragments/r%25202.html""#));

        let json = fs::read_to_string(&report.manifest).unwrap();
        let reparsed: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, manifest);
    }

    #[test]
    fn test_export_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PageRenderer::new(SiteConfig::default()).unwrap();

        let report = StaticExporter::new(&renderer, dir.path(), "raceId")
            .export(&Manifest::empty())
            .unwrap();

        assert!(report.fragments.is_empty());
        let index = fs::read_to_string(&report.index).unwrap();
        assert!(index.contains(&SiteConfig::default().empty_message));
    }

    #[test]
    fn test_export_copies_public_assets() {
        let public = tempfile::tempdir().unwrap();
        fs::create_dir_all(public.path().join("pdf")).unwrap();
        fs::write(public.path().join("pdf/r1.pdf"), b"%PDF-1.4").unwrap();

        let out = tempfile::tempdir().unwrap();
        let renderer = PageRenderer::new(SiteConfig::default()).unwrap();
        let report = StaticExporter::new(&renderer, out.path(), "raceId")
            .with_public_dir(public.path())
            .export(&Manifest::empty())
            .unwrap();

        assert_eq!(report.copied_assets, 1);
        assert!(out.path().join("pdf/r1.pdf").exists());
    }

    #[test]
    fn test_output_inside_public_is_not_copied() {
        let public = tempfile::tempdir().unwrap();
        fs::create_dir_all(public.path().join("pdf")).unwrap();
        fs::write(public.path().join("pdf/r1.pdf"), b"%PDF-1.4").unwrap();
        // Left over from an earlier export
        fs::create_dir_all(public.path().join("out/pdf")).unwrap();
        fs::write(public.path().join("out/pdf/r1.pdf"), b"%PDF-1.4").unwrap();

        let output = public.path().join("out");
        let renderer = PageRenderer::new(SiteConfig::default()).unwrap();
        let report = StaticExporter::new(&renderer, &output, "raceId")
            .with_public_dir(public.path())
            .export(&Manifest::empty())
            .unwrap();

        assert_eq!(report.copied_assets, 1);
        assert!(output.join("pdf/r1.pdf").exists());
        assert!(!output.join("out").exists());
    }

    #[test]
    fn test_output_equal_to_public_rejected() {
        let public = tempfile::tempdir().unwrap();
        fs::write(public.path().join("a.txt"), b"a").unwrap();

        let renderer = PageRenderer::new(SiteConfig::default()).unwrap();
        let result = StaticExporter::new(&renderer, public.path(), "raceId")
            .with_public_dir(public.path())
            .export(&Manifest::empty());

        assert!(result.is_err());
        assert_eq!(fs::read(public.path().join("a.txt")).unwrap(), b"a");
    }
}
