use std::fs;

use anyhow::{Context, Result};
use serde::Serialize;
use surface_core::db::{CheckRunRecord, ProjectConfig, ProjectLayout, SnapshotRecord, SurfaceDb};
use surface_core::verify::VerifyOptions;
use tracing::info;

use crate::canonicalize_or_current;
use crate::commands::{open_project_db, print_dir_status, print_json};
use crate::infer_project_name;

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub metadata: Option<String>,
    pub manifest: Option<String>,
    pub verify: VerifyOptions,
    pub layout: ProjectInfoLayout,
    pub snapshots: Vec<SnapshotRecord>,
    pub last_check: Option<CheckRunRecord>,
}

#[derive(Serialize)]
pub struct ProjectInfoLayout {
    pub meta_dir: String,
    pub metadata_dir: String,
    pub manifests_dir: String,
    pub reports_dir: String,
}

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    // Derive project name if not provided.
    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    // Ensure directories exist.
    for (label, dir) in [
        ("meta dir", &layout.meta_dir),
        ("metadata dir", &layout.metadata_dir),
        ("manifests dir", &layout.manifests_dir),
        ("reports dir", &layout.reports_dir),
    ] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {label}: {}", dir.display()))?;
    }

    // Build project config.
    let db_path_rel = layout.db_path_relative_string();
    let config = ProjectConfig::new(&project_name, db_path_rel);

    // Serialize and write config JSON.
    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the project database immediately so follow-on commands can rely on it.
    SurfaceDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;
    info!(name = %project_name, root = %layout.root.display(), "project initialized");

    println!("Initialized native surface project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Metadata dir: {}", layout.metadata_dir.display());
    println!("  Manifests dir: {}", layout.manifests_dir.display());
    println!("  Reports dir: {}", layout.reports_dir.display());

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let (config, _db_path, db) = open_project_db(&layout)?;
    let snapshots = db.list_snapshots().context("Failed to list snapshots")?;
    let last_check = db.list_check_runs().context("Failed to list check runs")?.pop();

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: config.name.clone(),
            root: layout.root.display().to_string(),
            config_file: layout.project_config_path.display().to_string(),
            config_version: config.config_version.clone(),
            db_path: config.db.path.clone(),
            metadata: config.metadata.clone(),
            manifest: config.manifest.clone(),
            verify: config.verify.clone(),
            layout: ProjectInfoLayout {
                meta_dir: layout.meta_dir.display().to_string(),
                metadata_dir: layout.metadata_dir.display().to_string(),
                manifests_dir: layout.manifests_dir.display().to_string(),
                reports_dir: layout.reports_dir.display().to_string(),
            },
            snapshots,
            last_check,
        };
        return print_json(&snapshot, "project info");
    }

    println!("Native Surface Project Info");
    println!("===========================");
    println!("Name: {}", config.name);
    println!("Root: {}", layout.root.display());
    println!("Config file: {}", layout.project_config_path.display());
    println!("Config version: {}", config.config_version);
    println!("DB path (config): {}", config.db.path);
    println!("Metadata: {}", config.metadata.as_deref().unwrap_or("(not set)"));
    println!("Manifest: {}", config.manifest.as_deref().unwrap_or("(not set)"));
    println!("Overload policy: {:?}", config.verify.overload_policy);
    println!();

    // Basic directory existence checks.
    println!("Directories:");
    print_dir_status("Meta dir (.surface)", &layout.meta_dir);
    print_dir_status("Metadata dir", &layout.metadata_dir);
    print_dir_status("Manifests dir", &layout.manifests_dir);
    print_dir_status("Reports dir", &layout.reports_dir);
    println!();
    println!("Snapshots: {}", snapshots.len());
    for snap in &snapshots {
        println!("- {} ({} symbols, {})", snap.label, snap.descriptor_count, snap.created_at);
    }
    if let Some(run) = last_check {
        println!(
            "Last check: {} at {} ({} violations)",
            run.status.as_str(),
            run.finished_at,
            run.violation_count
        );
    }

    Ok(())
}
