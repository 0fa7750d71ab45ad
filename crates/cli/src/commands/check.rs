use anyhow::{bail, Context, Result};
use surface_core::db::ProjectContext;
use surface_core::metadata::DocumentSource;
use surface_core::services::check::{CheckOptions, CheckReport, CheckRequest, CheckRunner};
use surface_core::verify::OverloadPolicy;

use crate::canonicalize_or_current;
use crate::commands::scan::print_diagnostics;
use crate::commands::{load_manifest, print_json, resolve_manifest_path, resolve_metadata_path};

/// Flags accepted by `check`; anything unset falls back to the project config.
#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    pub metadata: Option<String>,
    pub manifest: Option<String>,
    pub forbid_overloads: bool,
    pub save_snapshot: Option<String>,
    pub parallel: bool,
    pub json: bool,
}

/// Scan, build and verify; fails when any violation is found.
pub fn check_command(root: &str, args: &CheckArgs) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;

    let metadata_path = resolve_metadata_path(&ctx.layout, &ctx.config, args.metadata.as_deref())?;
    let manifest_path = resolve_manifest_path(&ctx.layout, &ctx.config, args.manifest.as_deref());
    let manifest = manifest_path.as_deref().map(load_manifest).transpose()?;

    let mut verify = ctx.config.verify.clone();
    if args.forbid_overloads {
        verify.overload_policy = OverloadPolicy::Forbid;
    }
    let request = CheckRequest {
        manifest_path: manifest_path.as_ref().map(|p| p.display().to_string()),
        snapshot_label: args.save_snapshot.clone(),
        options: CheckOptions { verify, parallel: args.parallel },
    };

    let source = DocumentSource::new(&metadata_path);
    let report = CheckRunner { ctx: &ctx }
        .run(&source, manifest.as_ref(), &request)
        .with_context(|| format!("Surface check of {} did not complete", metadata_path.display()))?;

    if args.json {
        print_json(&report, "check report")?;
    } else {
        print_report(&report, args.save_snapshot.as_deref());
    }

    if !report.passed() {
        bail!("Surface check failed with {} violation(s)", report.violations.len());
    }
    Ok(())
}

fn print_report(report: &CheckReport, saved: Option<&str>) {
    println!("Checked {} ({} native-callable symbols)", report.source, report.registry.len());
    print_diagnostics(&report.diagnostics);
    if let Some(label) = saved {
        println!("Saved snapshot: {label}");
    }
    if report.violations.is_empty() {
        println!("No violations.");
        return;
    }
    println!("Violations ({}):", report.violations.len());
    for violation in &report.violations {
        println!("  - {violation}");
        for subject in &violation.subjects {
            match &subject.location {
                Some(loc) => println!("      {} at {}", subject.key, loc),
                None => println!("      {}", subject.key),
            }
        }
    }
}
