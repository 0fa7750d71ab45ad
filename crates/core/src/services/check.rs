//! Scan → build → verify, as one call.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{CheckRunRecord, CheckRunStatus, DbError, ProjectContext};
use crate::manifest::ExpectedManifest;
use crate::metadata::{MetadataError, MetadataSource};
use crate::registry::{RegistryError, SurfaceRegistry};
use crate::scanner::{self, ScanDiagnostic, ScanOutput};
use crate::snapshot::Snapshot;
use crate::verify::{Verifier, Violation, VerifyOptions};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub verify: VerifyOptions,
    /// Scan types on the rayon pool (no effect without the `parallel` feature).
    pub parallel: bool,
}

/// Everything a check produced. Plain data; printing is the caller's job.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub source: String,
    #[serde(rename = "descriptors")]
    pub registry: SurfaceRegistry,
    pub diagnostics: Vec<ScanDiagnostic>,
    pub violations: Vec<Violation>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Scan a metadata source, sequentially or in parallel.
pub fn scan_source(
    source: &dyn MetadataSource,
    parallel: bool,
) -> Result<ScanOutput, MetadataError> {
    let types = source.types()?;
    debug!(source = source.name(), types = types.len(), parallel, "scanning metadata source");
    #[cfg(feature = "parallel")]
    {
        if parallel {
            return Ok(scanner::scan_parallel(&types));
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;
    Ok(scanner::scan(&types))
}

/// A single check over one metadata source.
pub struct SurfaceCheck<'a> {
    pub source: &'a dyn MetadataSource,
    pub manifest: Option<&'a ExpectedManifest>,
    pub options: CheckOptions,
}

impl<'a> SurfaceCheck<'a> {
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self { source, manifest: None, options: CheckOptions::default() }
    }

    pub fn with_manifest(mut self, manifest: Option<&'a ExpectedManifest>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(&self) -> Result<CheckReport, CheckError> {
        let ScanOutput { descriptors, diagnostics } =
            scan_source(self.source, self.options.parallel)?;
        let registry = SurfaceRegistry::build(descriptors)?;
        let violations =
            Verifier::new(self.options.verify.clone()).verify(&registry, self.manifest, &diagnostics);
        if violations.is_empty() {
            info!(source = self.source.name(), symbols = registry.len(), "surface check passed");
        } else {
            warn!(
                source = self.source.name(),
                symbols = registry.len(),
                violations = violations.len(),
                "surface check found violations"
            );
        }
        Ok(CheckReport {
            source: self.source.name().to_string(),
            registry,
            diagnostics,
            violations,
        })
    }
}

/// What a project-bound check should do besides verifying.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    /// Manifest path as given by the user, recorded with the run.
    pub manifest_path: Option<String>,
    /// Store the scanned surface under this label.
    pub snapshot_label: Option<String>,
    pub options: CheckOptions,
}

/// Coordinator that ties project context + check pipeline to persist run results.
pub struct CheckRunner<'a> {
    pub ctx: &'a ProjectContext,
}

impl<'a> CheckRunner<'a> {
    pub fn run(
        &self,
        source: &dyn MetadataSource,
        manifest: Option<&ExpectedManifest>,
        request: &CheckRequest,
    ) -> Result<CheckReport, CheckError> {
        let started_at = Utc::now().to_rfc3339();
        let outcome = SurfaceCheck::new(source)
            .with_manifest(manifest)
            .with_options(request.options.clone())
            .run();

        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                self.record(CheckRunRecord {
                    source: source.name().to_string(),
                    manifest: request.manifest_path.clone(),
                    snapshot_label: None,
                    status: CheckRunStatus::Errored,
                    descriptor_count: 0,
                    diagnostic_count: 0,
                    violation_count: 0,
                    started_at,
                    finished_at: Utc::now().to_rfc3339(),
                });
                return Err(err);
            }
        };

        if let Some(label) = &request.snapshot_label {
            let snapshot = Snapshot::capture(&report.registry, label.clone());
            self.ctx.db.insert_snapshot(&snapshot)?;
            debug!(label = %label, symbols = snapshot.len(), "snapshot stored");
        }

        self.record(CheckRunRecord {
            source: report.source.clone(),
            manifest: request.manifest_path.clone(),
            snapshot_label: request.snapshot_label.clone(),
            status: if report.passed() { CheckRunStatus::Passed } else { CheckRunStatus::Failed },
            descriptor_count: report.registry.len(),
            diagnostic_count: report.diagnostics.len(),
            violation_count: report.violations.len(),
            started_at,
            finished_at: Utc::now().to_rfc3339(),
        });

        Ok(report)
    }

    // Run history is bookkeeping; a failed insert must not change the check outcome.
    fn record(&self, record: CheckRunRecord) {
        if let Err(err) = self.ctx.db.insert_check_run(&record) {
            warn!(error = %err, "failed to record check run");
        }
    }
}
