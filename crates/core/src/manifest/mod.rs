//! Expected manifest: bindings the native layer declares it depends on.
//!
//! Typically a checked-in JSON or YAML file next to the native sources.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metadata::DocumentFormat;
use crate::model::SymbolKey;

/// One required binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedSymbol {
    pub owning_type: String,
    pub member_name: String,
    #[serde(default, alias = "params")]
    pub parameter_types: Vec<String>,
}

impl ExpectedSymbol {
    pub fn new<P, S>(owning_type: impl Into<String>, member_name: impl Into<String>, params: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owning_type: owning_type.into(),
            member_name: member_name.into(),
            parameter_types: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn key(&self) -> SymbolKey {
        SymbolKey::new(
            self.owning_type.clone(),
            self.member_name.clone(),
            self.parameter_types.iter().cloned(),
        )
    }
}

/// Ordered set of required bindings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpectedManifest {
    #[serde(default, alias = "symbols")]
    pub required: Vec<ExpectedSymbol>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse manifest {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Unsupported manifest format for {0}")]
    UnsupportedFormat(PathBuf),
}

impl ExpectedManifest {
    pub fn new(required: Vec<ExpectedSymbol>) -> Self {
        Self { required }
    }

    pub fn len(&self) -> usize {
        self.required.len()
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    /// Load a manifest from `.json`, `.yaml`, or `.yml`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let format = DocumentFormat::from_path(path)
            .map_err(|_| ManifestError::UnsupportedFormat(path.to_path_buf()))?;
        let body = fs::read_to_string(path)
            .map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
        let parsed = match format {
            DocumentFormat::Json => serde_json::from_str(&body).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => serde_yaml::from_str(&body).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ManifestError::Parse { path: path.to_path_buf(), message })
    }
}
