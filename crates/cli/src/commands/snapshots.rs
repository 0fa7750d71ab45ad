use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use surface_core::db::SurfaceDb;
use surface_core::snapshot::Snapshot;
use surface_core::verify::{OverloadPolicy, Verifier};
use tracing::info;

use crate::commands::{
    build_registry, load_manifest, open_project_db, print_json, project_layout,
    resolve_manifest_path, resolve_metadata_path,
};

/// Scan the metadata document and store the resulting surface under `label`.
pub fn snapshot_save_command(root: &str, label: &str, metadata: Option<&str>) -> Result<()> {
    let layout = project_layout(root)?;
    let (config, _db_path, db) = open_project_db(&layout)?;
    let path = resolve_metadata_path(&layout, &config, metadata)?;
    let (registry, output) = build_registry(&path, false)?;

    let snapshot = Snapshot::capture(&registry, label);
    db.insert_snapshot(&snapshot).with_context(|| format!("Failed to store snapshot '{label}'"))?;
    info!(label, symbols = snapshot.len(), "snapshot saved");

    println!("Saved snapshot:");
    println!("  Label: {}", snapshot.label);
    println!("  Symbols: {}", snapshot.len());
    println!("  Hash: {}", snapshot.content_hash);
    if !output.diagnostics.is_empty() {
        println!("  Scan diagnostics: {} (run `check` for details)", output.diagnostics.len());
    }
    Ok(())
}

/// List stored snapshots, oldest first.
pub fn snapshot_list_command(root: &str, json: bool) -> Result<()> {
    let layout = project_layout(root)?;
    let (_config, _db_path, db) = open_project_db(&layout)?;
    let snapshots = db.list_snapshots().context("Failed to list snapshots")?;

    if json {
        return print_json(&snapshots, "snapshots");
    }

    println!("Snapshots ({}):", snapshots.len());
    if snapshots.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for snap in snapshots {
        println!(
            "  - {} [{} symbols] created={} hash={}",
            snap.label, snap.descriptor_count, snap.created_at, snap.content_hash
        );
    }
    Ok(())
}

/// Print every descriptor of one snapshot.
pub fn snapshot_show_command(root: &str, label: &str, json: bool) -> Result<()> {
    let layout = project_layout(root)?;
    let (_config, _db_path, db) = open_project_db(&layout)?;
    let snapshot = load_snapshot(&db, label)?;

    if json {
        return print_json(&snapshot, "snapshot");
    }

    println!("Snapshot {} ({} symbols)", snapshot.label, snapshot.len());
    println!("Created: {}", snapshot.created_at);
    println!("Hash: {}", snapshot.content_hash);
    for desc in &snapshot.descriptors {
        println!("  - {}  [{}]", desc, desc.location());
    }
    Ok(())
}

/// Write one snapshot as JSON, e.g. to hand to the native build.
pub fn snapshot_export_command(root: &str, label: &str, out: &str) -> Result<()> {
    let layout = project_layout(root)?;
    let (_config, _db_path, db) = open_project_db(&layout)?;
    let snapshot = load_snapshot(&db, label)?;

    let out_path = layout.resolve(out);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let body = snapshot.to_json().context("Failed to serialize snapshot")?;
    fs::write(&out_path, body)
        .with_context(|| format!("Failed to write snapshot to {}", out_path.display()))?;

    println!("Exported snapshot {} to {}", label, out_path.display());
    Ok(())
}

/// Re-verify a stored snapshot against the project's policy and manifest.
pub fn snapshot_verify_command(
    root: &str,
    label: &str,
    manifest: Option<&str>,
    forbid_overloads: bool,
) -> Result<()> {
    let layout = project_layout(root)?;
    let (config, _db_path, db) = open_project_db(&layout)?;
    let snapshot = load_snapshot(&db, label)?;
    let manifest = resolve_manifest_path(&layout, &config, manifest)
        .as_deref()
        .map(load_manifest)
        .transpose()?;

    let mut options = config.verify.clone();
    if forbid_overloads {
        options.overload_policy = OverloadPolicy::Forbid;
    }
    let violations = Verifier::new(options).verify_snapshot(&snapshot, manifest.as_ref());
    if violations.is_empty() {
        println!("Snapshot {label}: no violations.");
        return Ok(());
    }
    println!("Snapshot {label}: {} violation(s)", violations.len());
    for violation in &violations {
        println!("  - {violation}");
    }
    bail!("Snapshot '{label}' failed verification")
}

pub(crate) fn load_snapshot(db: &SurfaceDb, label: &str) -> Result<Snapshot> {
    db.load_snapshot(label)
        .with_context(|| format!("Failed to load snapshot '{label}'"))?
        .ok_or_else(|| anyhow!("No snapshot labelled '{label}'"))
}
