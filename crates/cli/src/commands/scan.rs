use anyhow::Result;
use surface_core::scanner::ScanDiagnostic;

use crate::commands::{load_project_config, print_json, project_layout, resolve_metadata_path, scan_document};

/// Scan the metadata document and list what native code can call.
pub fn scan_command(root: &str, metadata: Option<&str>, json: bool, parallel: bool) -> Result<()> {
    let layout = project_layout(root)?;
    let config = load_project_config(&layout)?;
    let path = resolve_metadata_path(&layout, &config, metadata)?;
    let output = scan_document(&path, parallel)?;

    if json {
        return print_json(&output, "scan output");
    }

    println!("Native-callable symbols ({}):", output.descriptors.len());
    if output.descriptors.is_empty() {
        println!("  (none)");
    }
    for desc in &output.descriptors {
        println!("  - {}  [{}]", desc, desc.location());
    }
    print_diagnostics(&output.diagnostics);
    Ok(())
}

pub(crate) fn print_diagnostics(diagnostics: &[ScanDiagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("Diagnostics ({}):", diagnostics.len());
    for diag in diagnostics {
        println!("  - {} [{}]", diag.message, diag.location);
    }
}
