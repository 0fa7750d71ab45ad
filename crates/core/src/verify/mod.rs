//! Consistency verification over a built registry.
//!
//! Every check runs and every finding is returned; whether a non-empty result
//! fails a build is up to the caller.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::manifest::ExpectedManifest;
use crate::model::{SourceLocation, SymbolDescriptor, SymbolKey};
use crate::registry::{find_key_collisions, KeyCollision, SurfaceRegistry};
use crate::scanner::{DiagnosticKind, ScanDiagnostic};
use crate::snapshot::Snapshot;

/// How the native calling convention treats overloaded members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverloadPolicy {
    /// Overloads are fine as long as their erased parameter lists differ.
    #[default]
    Allow,
    /// The native layer binds by name only; any overload collides.
    Forbid,
}

/// Verifier settings, usually taken from the project config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerifyOptions {
    #[serde(default)]
    pub overload_policy: OverloadPolicy,
    /// Managed type -> the native type it is passed as. Types not listed
    /// map to themselves.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub erasure: BTreeMap<String, String>,
}

impl VerifyOptions {
    pub fn forbid_overloads() -> Self {
        Self { overload_policy: OverloadPolicy::Forbid, ..Self::default() }
    }

    pub fn erase<'a>(&'a self, ty: &'a str) -> &'a str {
        self.erasure.get(ty).map(String::as_str).unwrap_or(ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DuplicateBinding,
    SignatureCollision,
    MissingExpectedSymbol,
    MarkerMisuse,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::DuplicateBinding => "duplicate_binding",
            ViolationKind::SignatureCollision => "signature_collision",
            ViolationKind::MissingExpectedSymbol => "missing_expected_symbol",
            ViolationKind::MarkerMisuse => "marker_misuse",
        }
    }
}

/// A symbol implicated in a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub key: SymbolKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Subject {
    fn of(desc: &SymbolDescriptor) -> Self {
        Self { key: desc.key().clone(), location: Some(desc.location().clone()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub subjects: Vec<Subject>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Verifier {
    options: VerifyOptions,
}

impl Verifier {
    pub fn new(options: VerifyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Verify a registry built from a live scan.
    pub fn verify(
        &self,
        registry: &SurfaceRegistry,
        expected: Option<&ExpectedManifest>,
        scan_diagnostics: &[ScanDiagnostic],
    ) -> Vec<Violation> {
        self.verify_descriptors(registry.all(), Vec::new(), expected, scan_diagnostics)
    }

    /// Verify a stored snapshot. Snapshots are untrusted, so key uniqueness is
    /// checked again here; the other checks see the first descriptor per key.
    pub fn verify_snapshot(
        &self,
        snapshot: &Snapshot,
        expected: Option<&ExpectedManifest>,
    ) -> Vec<Violation> {
        let collisions = find_key_collisions(&snapshot.descriptors);
        let mut seen = HashSet::new();
        let unique: Vec<SymbolDescriptor> = snapshot
            .descriptors
            .iter()
            .filter(|d| seen.insert(d.key().clone()))
            .cloned()
            .collect();
        self.verify_descriptors(&unique, collisions, expected, &[])
    }

    fn verify_descriptors(
        &self,
        descriptors: &[SymbolDescriptor],
        key_collisions: Vec<KeyCollision>,
        expected: Option<&ExpectedManifest>,
        scan_diagnostics: &[ScanDiagnostic],
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        violations.extend(key_collisions.into_iter().map(key_collision_violation));
        violations.extend(check_binding_names(descriptors));
        violations.extend(self.check_signatures(descriptors));
        if let Some(manifest) = expected {
            violations.extend(check_expected(descriptors, manifest));
        }
        violations.extend(check_marker_misuse(scan_diagnostics));
        debug!(
            descriptors = descriptors.len(),
            violations = violations.len(),
            policy = ?self.options.overload_policy,
            "verification finished"
        );
        violations
    }

    fn check_signatures(&self, descriptors: &[SymbolDescriptor]) -> Vec<Violation> {
        let mut out = Vec::new();
        for group in group_by(descriptors, |d| (d.owning_type(), d.member_name())) {
            if group.len() < 2 {
                continue;
            }
            let first = group[0];
            match self.options.overload_policy {
                OverloadPolicy::Forbid => out.push(Violation {
                    kind: ViolationKind::SignatureCollision,
                    subjects: group.iter().map(|d| Subject::of(d)).collect(),
                    message: format!(
                        "{}.{} has {} native-callable overloads but the native layer does not support overloading",
                        first.owning_type(),
                        first.member_name(),
                        group.len()
                    ),
                }),
                OverloadPolicy::Allow => {
                    let erased = group_by(&group, |d| {
                        d.parameter_types().iter().map(|p| self.options.erase(p)).collect::<Vec<_>>()
                    });
                    for bucket in erased.into_iter().filter(|b| b.len() > 1) {
                        let shape: Vec<&str> =
                            bucket[0].parameter_types().iter().map(|p| self.options.erase(p)).collect();
                        out.push(Violation {
                            kind: ViolationKind::SignatureCollision,
                            subjects: bucket.iter().map(|d| Subject::of(d)).collect(),
                            message: format!(
                                "{}.{} overloads are ambiguous to native callers: all take ({})",
                                first.owning_type(),
                                first.member_name(),
                                shape.join(", ")
                            ),
                        });
                    }
                }
            }
        }
        out
    }
}

fn key_collision_violation(collision: KeyCollision) -> Violation {
    let message = format!("{} is declared {} times", collision.key, collision.locations.len());
    Violation {
        kind: ViolationKind::DuplicateBinding,
        subjects: collision
            .locations
            .into_iter()
            .map(|loc| Subject { key: collision.key.clone(), location: Some(loc) })
            .collect(),
        message,
    }
}

/// Distinct members of one type exporting the same binding name.
fn check_binding_names(descriptors: &[SymbolDescriptor]) -> Vec<Violation> {
    let mut out = Vec::new();
    for group in group_by(descriptors, |d| (d.owning_type(), d.binding_name())) {
        let mut members: Vec<&str> = Vec::new();
        for desc in &group {
            if !members.contains(&desc.member_name()) {
                members.push(desc.member_name());
            }
        }
        if members.len() < 2 {
            continue;
        }
        out.push(Violation {
            kind: ViolationKind::DuplicateBinding,
            subjects: group.iter().map(|d| Subject::of(d)).collect(),
            message: format!(
                "binding name '{}' on {} is claimed by {}",
                group[0].binding_name(),
                group[0].owning_type(),
                members.join(", ")
            ),
        });
    }
    out
}

fn check_expected(descriptors: &[SymbolDescriptor], manifest: &ExpectedManifest) -> Vec<Violation> {
    let present: HashSet<&SymbolKey> = descriptors.iter().map(SymbolDescriptor::key).collect();
    manifest
        .required
        .iter()
        .map(|entry| entry.key())
        .filter(|key| !present.contains(key))
        .map(|key| Violation {
            kind: ViolationKind::MissingExpectedSymbol,
            message: format!("native layer requires {key} but it is not native-callable"),
            subjects: vec![Subject { key, location: None }],
        })
        .collect()
}

fn check_marker_misuse(diagnostics: &[ScanDiagnostic]) -> Vec<Violation> {
    diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::MarkerMisuse)
        .map(|d| Violation {
            kind: ViolationKind::MarkerMisuse,
            subjects: vec![Subject { key: d.key(), location: Some(d.location.clone()) }],
            message: d.message.clone(),
        })
        .collect()
}

/// Group items by a derived key, keeping groups in first-seen order and items
/// in input order.
fn group_by<'a, T, K, F>(items: &'a [T], mut key_fn: F) -> Vec<Vec<&'a T>>
where
    K: Eq + std::hash::Hash,
    F: FnMut(&'a T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<&'a T>> = Vec::new();
    for item in items {
        let slot = *slots.entry(key_fn(item)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }
    groups
}
