//! Snapshots: versioned, immutable copies of a registry's descriptor set.
//!
//! Persisting snapshots is the caller's business (see `db`); this module only
//! defines the value and how two of them compare (see [`diff`]).

mod diff;

pub use diff::{diff, diff_descriptors, ChangedField, DescriptorChange, DiffResult};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::model::SymbolDescriptor;
use crate::registry::{RegistryError, SurfaceRegistry};

/// Latest snapshot format this crate writes and the newest it will read.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported snapshot format version {found}; newest supported is {supported}")]
    UnsupportedFormatVersion { found: u32, supported: u32 },
    #[error("Snapshot '{label}' content hash mismatch (stored {stored}, computed {computed})")]
    HashMismatch { label: String, stored: String, computed: String },
}

/// Point-in-time copy of a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub label: String,
    /// RFC 3339 capture time.
    pub created_at: String,
    /// SHA-256 over the descriptor set; see [`content_hash`].
    pub content_hash: String,
    pub descriptors: Vec<SymbolDescriptor>,
}

impl Snapshot {
    /// Capture the current contents of `registry`.
    pub fn capture(registry: &SurfaceRegistry, label: impl Into<String>) -> Self {
        Self::from_descriptors(label, Utc::now().to_rfc3339(), registry.all().to_vec())
    }

    pub fn from_descriptors(
        label: impl Into<String>,
        created_at: impl Into<String>,
        descriptors: Vec<SymbolDescriptor>,
    ) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            label: label.into(),
            created_at: created_at.into(),
            content_hash: content_hash(&descriptors),
            descriptors,
        }
    }

    /// Parse a snapshot from JSON, rejecting formats newer than this crate
    /// and bodies whose hash does not match their content.
    pub fn from_json(body: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(body)?;
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedFormatVersion {
                found: snapshot.format_version,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        let computed = content_hash(&snapshot.descriptors);
        if computed != snapshot.content_hash {
            return Err(SnapshotError::HashMismatch {
                label: snapshot.label,
                stored: snapshot.content_hash,
                computed,
            });
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuild a registry from the stored descriptors.
    pub fn to_registry(&self) -> Result<SurfaceRegistry, RegistryError> {
        SurfaceRegistry::build(self.descriptors.iter().cloned())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Hex SHA-256 over every descriptor field, in order.
///
/// Fields are separated with unit/record separators so adjacent values cannot
/// run together.
pub fn content_hash(descriptors: &[SymbolDescriptor]) -> String {
    let mut hasher = Sha256::new();
    for desc in descriptors {
        let mut fields: Vec<&str> = vec![desc.owning_type(), desc.member_name(), desc.kind().as_str()];
        fields.extend(desc.parameter_types().iter().map(String::as_str));
        fields.push("->");
        fields.push(desc.return_type().unwrap_or(""));
        fields.push(desc.binding_name());
        for field in fields {
            hasher.update(field.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}
