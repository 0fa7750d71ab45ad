use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use surface_core::db::{ProjectConfig, ProjectLayout, SurfaceDb};
use surface_core::manifest::ExpectedManifest;
use surface_core::metadata::DocumentSource;
use surface_core::registry::SurfaceRegistry;
use surface_core::scanner::ScanOutput;
use surface_core::services::check::scan_source;

use crate::canonicalize_or_current;

/// Load the project config JSON from disk (delegates to core helper).
pub fn load_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    surface_core::db::load_project_config(layout)
}

/// Resolve the DB path (respecting relative/absolute config) and open a SurfaceDb (delegates to core helper).
pub fn open_project_db(layout: &ProjectLayout) -> Result<(ProjectConfig, PathBuf, SurfaceDb)> {
    surface_core::db::open_project_db(layout)
}

/// Canonicalize `root` and compute its layout.
pub fn project_layout(root: &str) -> Result<ProjectLayout> {
    Ok(ProjectLayout::new(canonicalize_or_current(root)?))
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {what} to JSON"))?;
    println!("{}", serialized);
    Ok(())
}

/// The metadata document to scan: the `--metadata` flag wins over the config.
pub fn resolve_metadata_path(
    layout: &ProjectLayout,
    config: &ProjectConfig,
    flag: Option<&str>,
) -> Result<PathBuf> {
    let raw = flag.or(config.metadata.as_deref()).ok_or_else(|| {
        anyhow!(
            "No metadata document given; pass --metadata or set \"metadata\" in {}",
            layout.project_config_path.display()
        )
    })?;
    Ok(layout.resolve(raw))
}

/// The expected manifest, if one is configured or passed via `--manifest`.
pub fn resolve_manifest_path(
    layout: &ProjectLayout,
    config: &ProjectConfig,
    flag: Option<&str>,
) -> Option<PathBuf> {
    flag.or(config.manifest.as_deref()).map(|raw| layout.resolve(raw))
}

pub fn load_manifest(path: &Path) -> Result<ExpectedManifest> {
    ExpectedManifest::load(path)
        .with_context(|| format!("Failed to load expected manifest {}", path.display()))
}

/// Scan a metadata document from disk.
pub fn scan_document(path: &Path, parallel: bool) -> Result<ScanOutput> {
    let source = DocumentSource::new(path);
    scan_source(&source, parallel)
        .with_context(|| format!("Failed to scan metadata document {}", path.display()))
}

/// Scan a metadata document and build its registry. Scan diagnostics are
/// returned alongside so callers can report them.
pub fn build_registry(path: &Path, parallel: bool) -> Result<(SurfaceRegistry, ScanOutput)> {
    let output = scan_document(path, parallel)?;
    let registry = SurfaceRegistry::build(output.descriptors.iter().cloned())
        .with_context(|| format!("Failed to build registry from {}", path.display()))?;
    Ok((registry, output))
}
