//! Surface scanning: turn managed metadata into symbol descriptors.
//!
//! Scanning is fail-soft. A malformed member yields a diagnostic and the scan
//! moves on; nothing here returns an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metadata::{MemberKind, MemberMetadata, TypeMetadata};
use crate::model::{SourceLocation, SymbolDescriptor, SymbolKey, SymbolKind};

/// Category of a per-member scan finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The member could not be turned into a descriptor and was skipped.
    InvalidDescriptor,
    /// The marker sits somewhere native code cannot use it.
    MarkerMisuse,
}

/// A finding about one member, collected during the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
    pub kind: DiagnosticKind,
    pub owning_type: String,
    pub member_name: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    pub location: SourceLocation,
    pub message: String,
}

impl ScanDiagnostic {
    /// Key of the member this diagnostic is about.
    pub fn key(&self) -> SymbolKey {
        SymbolKey::new(
            self.owning_type.clone(),
            self.member_name.clone(),
            self.parameter_types.iter().cloned(),
        )
    }
}

/// Descriptors for every marked member plus the diagnostics gathered on the way.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanOutput {
    pub descriptors: Vec<SymbolDescriptor>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl ScanOutput {
    pub fn misuse_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == DiagnosticKind::MarkerMisuse).count()
    }
}

/// Scan `types` in input order, members in declaration order.
pub fn scan(types: &[TypeMetadata]) -> ScanOutput {
    let mut out = ScanOutput::default();
    for ty in types {
        let partial = scan_type(ty);
        out.descriptors.extend(partial.descriptors);
        out.diagnostics.extend(partial.diagnostics);
    }
    debug!(
        types = types.len(),
        descriptors = out.descriptors.len(),
        diagnostics = out.diagnostics.len(),
        "surface scan finished"
    );
    out
}

/// Parallel variant of [`scan`]; output is identical to the sequential scan.
///
/// Types are scanned independently and the merged results are re-sorted by
/// (type index, member index) so completion order never leaks into the output.
#[cfg(feature = "parallel")]
pub fn scan_parallel(types: &[TypeMetadata]) -> ScanOutput {
    use rayon::prelude::*;

    let mut descriptors: Vec<(usize, usize, SymbolDescriptor)> = Vec::new();
    let mut diagnostics: Vec<(usize, usize, ScanDiagnostic)> = Vec::new();

    let per_type: Vec<(usize, Vec<Finding>)> =
        types.par_iter().enumerate().map(|(ti, ty)| (ti, scan_type_findings(ty))).collect();

    for (ti, findings) in per_type {
        for finding in findings {
            match finding {
                Finding::Descriptor(mi, d) => descriptors.push((ti, mi, d)),
                Finding::Diagnostic(mi, d) => diagnostics.push((ti, mi, d)),
            }
        }
    }
    // Stable sorts keep the emit order of findings for the same member.
    descriptors.sort_by_key(|(ti, mi, _)| (*ti, *mi));
    diagnostics.sort_by_key(|(ti, mi, _)| (*ti, *mi));

    let out = ScanOutput {
        descriptors: descriptors.into_iter().map(|(_, _, d)| d).collect(),
        diagnostics: diagnostics.into_iter().map(|(_, _, d)| d).collect(),
    };
    debug!(
        types = types.len(),
        descriptors = out.descriptors.len(),
        diagnostics = out.diagnostics.len(),
        "parallel surface scan finished"
    );
    out
}

/// Scan a single type.
pub fn scan_type(ty: &TypeMetadata) -> ScanOutput {
    let mut out = ScanOutput::default();
    for finding in scan_type_findings(ty) {
        match finding {
            Finding::Descriptor(_, d) => out.descriptors.push(d),
            Finding::Diagnostic(_, d) => out.diagnostics.push(d),
        }
    }
    out
}

enum Finding {
    Descriptor(usize, SymbolDescriptor),
    Diagnostic(usize, ScanDiagnostic),
}

fn scan_type_findings(ty: &TypeMetadata) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (index, member) in ty.members.iter().enumerate() {
        let Some(marker) = &member.marker else {
            continue;
        };
        let location = member_location(ty, member, index);

        let kind = match member.kind {
            MemberKind::Constructor => SymbolKind::Constructor,
            MemberKind::Method => SymbolKind::Method,
            MemberKind::Field => {
                let diag = diagnostic(
                    DiagnosticKind::MarkerMisuse,
                    ty,
                    member,
                    location,
                    format!(
                        "{}.{} is a field; the native-callable marker only applies to constructors and methods",
                        ty.name, member.name
                    ),
                );
                warn!(owning_type = %ty.name, member = %member.name, "marker on field");
                findings.push(Finding::Diagnostic(index, diag));
                continue;
            }
        };

        if !member.visibility.is_native_accessible() {
            let diag = diagnostic(
                DiagnosticKind::MarkerMisuse,
                ty,
                member,
                location.clone(),
                format!(
                    "{}.{} is {} but marked native-callable; native code cannot reach it",
                    ty.name,
                    member.name,
                    member.visibility.as_str()
                ),
            );
            warn!(owning_type = %ty.name, member = %member.name, "marker on non-public member");
            findings.push(Finding::Diagnostic(index, diag));
        }

        let built = SymbolDescriptor::builder(ty.name.clone(), member.name.clone(), kind)
            .params(member.parameter_types.iter().cloned())
            .returns(member.return_type.clone())
            .binding_name(marker.binding_override().map(str::to_string))
            .location(location.clone())
            .build();

        match built {
            Ok(desc) => findings.push(Finding::Descriptor(index, desc)),
            Err(err) => {
                warn!(owning_type = %ty.name, member = %member.name, error = %err, "skipping member");
                let diag = diagnostic(
                    DiagnosticKind::InvalidDescriptor,
                    ty,
                    member,
                    location,
                    err.to_string(),
                );
                findings.push(Finding::Diagnostic(index, diag));
            }
        }
    }
    findings
}

fn member_location(ty: &TypeMetadata, member: &MemberMetadata, index: usize) -> SourceLocation {
    member
        .location
        .clone()
        .unwrap_or_else(|| SourceLocation::new(format!("{}#{}[{}]", ty.name, member.name, index)))
}

fn diagnostic(
    kind: DiagnosticKind,
    ty: &TypeMetadata,
    member: &MemberMetadata,
    location: SourceLocation,
    message: String,
) -> ScanDiagnostic {
    ScanDiagnostic {
        kind,
        owning_type: ty.name.clone(),
        member_name: member.name.clone(),
        parameter_types: member.parameter_types.clone(),
        location,
        message,
    }
}
