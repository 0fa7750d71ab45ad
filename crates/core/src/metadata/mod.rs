//! Managed-code metadata: the input side of a scan.
//!
//! Any metadata source (reflection dump, parsed sources, a serialized manifest)
//! is exposed through [`MetadataSource`]: iterate types, iterate their members,
//! read marker, visibility, and signature.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::SourceLocation;

/// Declared visibility of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    /// Native code can only reach public members.
    pub fn is_native_accessible(self) -> bool {
        matches!(self, Visibility::Public)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "package",
            Visibility::Private => "private",
        }
    }
}

/// Kind of declared member as seen by the metadata layer.
///
/// Fields are listed so that a misplaced marker can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Constructor,
    Method,
    Field,
}

/// The native-callable marker as attached to a member.
///
/// `value` is the optional binding-name override; an empty string means none.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NativeMarker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl NativeMarker {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn named(value: impl Into<String>) -> Self {
        Self { value: Some(value.into()) }
    }

    /// The override, if one was actually given.
    pub fn binding_override(&self) -> Option<&str> {
        self.value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// One declared constructor, method, or field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMetadata {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, alias = "params")]
    pub parameter_types: Vec<String>,
    #[serde(default, alias = "returns", skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<NativeMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl MemberMetadata {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            visibility: Visibility::Public,
            parameter_types: Vec::new(),
            return_type: None,
            marker: None,
            location: None,
        }
    }

    pub fn constructor(name: impl Into<String>) -> Self {
        Self { kind: MemberKind::Constructor, ..Self::method(name) }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self { kind: MemberKind::Field, ..Self::method(name) }
    }

    pub fn with_params<P, S>(mut self, params: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_return(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn marked(mut self) -> Self {
        self.marker = Some(NativeMarker::new());
        self
    }

    pub fn marked_as(mut self, binding_name: impl Into<String>) -> Self {
        self.marker = Some(NativeMarker::named(binding_name));
        self
    }

    pub fn is_marked(&self) -> bool {
        self.marker.is_some()
    }
}

/// A managed type and its declared members, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMetadata {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberMetadata>,
}

impl TypeMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), members: Vec::new() }
    }

    pub fn with_member(mut self, member: MemberMetadata) -> Self {
        self.members.push(member);
        self
    }
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read metadata from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse JSON metadata {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse YAML metadata {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Unsupported metadata format '{0}' (expected json, yaml, or yml)")]
    UnsupportedFormat(String),
    #[error("Metadata source error: {0}")]
    Source(String),
}

/// Capability implemented by anything that can enumerate managed types.
pub trait MetadataSource: Send + Sync {
    fn types(&self) -> Result<Vec<TypeMetadata>, MetadataError>;
    fn name(&self) -> &str;
}

/// Metadata held in memory, mostly for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    name: String,
    types: Vec<TypeMetadata>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, types: Vec<TypeMetadata>) -> Self {
        Self { name: name.into(), types }
    }
}

impl MetadataSource for InMemorySource {
    fn types(&self) -> Result<Vec<TypeMetadata>, MetadataError> {
        Ok(self.types.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// On-disk metadata document (JSON or YAML), the serialized-manifest flavour
/// of a metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub types: Vec<TypeMetadata>,
}

/// Supported serialization formats for documents read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, MetadataError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        match ext {
            "json" => Ok(DocumentFormat::Json),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            other => Err(MetadataError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl MetadataDocument {
    pub fn parse(body: &str, format: DocumentFormat, path: &Path) -> Result<Self, MetadataError> {
        match format {
            DocumentFormat::Json => serde_json::from_str(body)
                .map_err(|source| MetadataError::Json { path: path.to_path_buf(), source }),
            DocumentFormat::Yaml => serde_yaml::from_str(body)
                .map_err(|source| MetadataError::Yaml { path: path.to_path_buf(), source }),
        }
    }

    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let format = DocumentFormat::from_path(path)?;
        let body = fs::read_to_string(path)
            .map_err(|source| MetadataError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&body, format, path)
    }
}

/// A metadata document bound to the file it came from.
///
/// Members without an explicit location get `<path>#<Type>.<member>[<index>]`
/// as origin, so repeated or overloaded members stay distinguishable.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    path: PathBuf,
    name: String,
}

impl DocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataSource for DocumentSource {
    fn types(&self) -> Result<Vec<TypeMetadata>, MetadataError> {
        let mut doc = MetadataDocument::load(&self.path)?;
        for ty in &mut doc.types {
            for (index, member) in ty.members.iter_mut().enumerate() {
                if member.location.is_none() {
                    member.location = Some(SourceLocation::new(format!(
                        "{}#{}.{}[{}]",
                        self.name, ty.name, member.name, index
                    )));
                }
            }
        }
        Ok(doc.types)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Named metadata sources; callers select by name.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Box<dyn MetadataSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self { sources: HashMap::new() }
    }

    pub fn register<S: MetadataSource + 'static>(&mut self, source: S) -> &mut Self {
        self.sources.insert(source.name().to_string(), Box::new(source));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn MetadataSource> {
        self.sources.get(name).map(|s| &**s)
    }

    /// Sorted source names for error messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Collect types from every registered source, ordered by source name.
    pub fn all_types(&self) -> Result<Vec<TypeMetadata>, MetadataError> {
        let mut out = Vec::new();
        for name in self.names() {
            if let Some(source) = self.sources.get(&name) {
                out.extend(source.types()?);
            }
        }
        Ok(out)
    }
}
