use serde::{Deserialize, Serialize};

/// Summary row for a stored snapshot (without its descriptors).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotRecord {
    /// Unique label (e.g., a build id or release tag).
    pub label: String,
    pub created_at: String,
    pub content_hash: String,
    pub descriptor_count: usize,
}

/// Outcome of a check run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckRunStatus {
    /// No violations.
    Passed,
    /// Verification produced at least one violation.
    Failed,
    /// The pipeline could not finish (unreadable metadata, key collisions).
    Errored,
}

impl CheckRunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckRunStatus::Passed => "passed",
            CheckRunStatus::Failed => "failed",
            CheckRunStatus::Errored => "errored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "passed" => Some(CheckRunStatus::Passed),
            "failed" => Some(CheckRunStatus::Failed),
            "errored" => Some(CheckRunStatus::Errored),
            _ => None,
        }
    }
}

/// Record describing one check run for bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckRunRecord {
    /// Name of the metadata source that was scanned.
    pub source: String,
    /// Manifest path, if one was checked.
    pub manifest: Option<String>,
    /// Snapshot label written by this run, if any.
    pub snapshot_label: Option<String>,
    pub status: CheckRunStatus,
    pub descriptor_count: usize,
    pub diagnostic_count: usize,
    pub violation_count: usize,
    pub started_at: String,
    pub finished_at: String,
}
