use anyhow::{Context, Result};

use crate::commands::{open_project_db, print_json, project_layout};

/// List recorded check runs, oldest first.
pub fn list_runs_command(root: &str, json: bool) -> Result<()> {
    let layout = project_layout(root)?;
    let (_config, _db_path, db) = open_project_db(&layout)?;
    let runs = db.list_check_runs().context("Failed to list check runs")?;

    if json {
        return print_json(&runs, "check runs");
    }

    println!("Check runs ({}):", runs.len());
    if runs.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for run in runs {
        let snapshot = run.snapshot_label.as_deref().unwrap_or("-");
        println!(
            "  - {} [{}] symbols={} diagnostics={} violations={} snapshot={} finished={}",
            run.source,
            run.status.as_str(),
            run.descriptor_count,
            run.diagnostic_count,
            run.violation_count,
            snapshot,
            run.finished_at
        );
    }
    Ok(())
}
