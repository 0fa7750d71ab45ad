use anyhow::{bail, Result};
use surface_core::snapshot::{diff, DiffResult, Snapshot};

use crate::commands::snapshots::load_snapshot;
use crate::commands::{build_registry, open_project_db, print_json, project_layout, resolve_metadata_path};

/// Label used for the surface scanned from the working tree.
pub const WORKING_TREE_LABEL: &str = "working-tree";

/// Compare a stored snapshot against another snapshot or the current metadata.
pub fn diff_command(
    root: &str,
    old: &str,
    new: Option<&str>,
    metadata: Option<&str>,
    json: bool,
    fail_on_breaking: bool,
) -> Result<()> {
    let layout = project_layout(root)?;
    let (config, _db_path, db) = open_project_db(&layout)?;
    let old_snapshot = load_snapshot(&db, old)?;
    let new_snapshot = match new {
        Some(label) => load_snapshot(&db, label)?,
        None => {
            let path = resolve_metadata_path(&layout, &config, metadata)?;
            let (registry, _output) = build_registry(&path, false)?;
            Snapshot::capture(&registry, WORKING_TREE_LABEL)
        }
    };

    let result = diff(&old_snapshot, &new_snapshot);
    if json {
        print_json(&result, "diff")?;
    } else {
        print_diff(&old_snapshot.label, &new_snapshot.label, &result);
    }

    if fail_on_breaking && result.is_breaking() {
        bail!(
            "Breaking surface change between '{}' and '{}': {} removed, {} changed",
            old_snapshot.label,
            new_snapshot.label,
            result.removed.len(),
            result.changed.len()
        );
    }
    Ok(())
}

fn print_diff(old: &str, new: &str, result: &DiffResult) {
    println!("Surface diff {old} -> {new}");
    if result.is_empty() {
        println!("  (no changes)");
        return;
    }
    for desc in &result.added {
        println!("  + {desc}");
    }
    for desc in &result.removed {
        println!("  - {desc}");
    }
    for change in &result.changed {
        let fields: Vec<String> = change.fields.iter().map(|f| format!("{f:?}")).collect();
        println!("  ~ {} -> {} ({})", change.old, change.new, fields.join(", "));
    }
    if result.is_breaking() {
        println!("Breaking: yes");
    }
}
