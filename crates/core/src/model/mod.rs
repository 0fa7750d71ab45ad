//! Core data model for native-callable entry points.
//!
//! A [`SymbolDescriptor`] describes one constructor or method that native code
//! is allowed to call. Descriptors are immutable once built; every field is
//! private and exposed through accessors so a registry can hand them out freely.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of member a descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Constructor,
    Method,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Constructor => "constructor",
            SymbolKind::Method => "method",
        }
    }
}

/// Where a marked member was declared.
///
/// Opaque to the registry; only used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl SourceLocation {
    pub fn new(origin: impl Into<String>) -> Self {
        Self { origin: origin.into(), line: None }
    }

    pub fn at_line(origin: impl Into<String>, line: u32) -> Self {
        Self { origin: origin.into(), line: Some(line) }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.origin, line),
            None => write!(f, "{}", self.origin),
        }
    }
}

/// Identity of a binding: owning type, member name, and parameter shape.
///
/// The return type is deliberately absent; overloads on the native side are
/// resolved by parameters only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolKey {
    pub owning_type: String,
    pub member_name: String,
    pub parameter_types: Vec<String>,
}

impl SymbolKey {
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
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.owning_type, self.member_name, self.parameter_types.join(", "))
    }
}

/// Reasons a descriptor is rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("invalid descriptor: member name is empty")]
    EmptyMemberName,
    #[error("invalid descriptor: member name {0:?} contains whitespace")]
    MalformedMemberName(String),
    #[error("invalid descriptor: owning type of {member} is unresolved")]
    UnresolvedOwningType { member: String },
    #[error("invalid descriptor: parameter {index} of {member} has no type")]
    UnresolvedParameterType { member: String, index: usize },
    #[error("invalid descriptor: return type of {member} is empty")]
    UnresolvedReturnType { member: String },
    #[error("invalid descriptor: constructor {member} declares return type {return_type}")]
    ConstructorReturnType { member: String, return_type: String },
}

/// Immutable record describing one native-callable entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor", into = "RawDescriptor")]
pub struct SymbolDescriptor {
    key: SymbolKey,
    kind: SymbolKind,
    return_type: Option<String>,
    binding_name: String,
    location: SourceLocation,
}

impl SymbolDescriptor {
    /// Start building a descriptor for `owning_type.member_name`.
    pub fn builder(
        owning_type: impl Into<String>,
        member_name: impl Into<String>,
        kind: SymbolKind,
    ) -> DescriptorBuilder {
        DescriptorBuilder {
            owning_type: owning_type.into(),
            member_name: member_name.into(),
            kind,
            parameter_types: Vec::new(),
            return_type: None,
            binding_name: None,
            location: None,
        }
    }

    pub fn key(&self) -> &SymbolKey {
        &self.key
    }

    pub fn owning_type(&self) -> &str {
        &self.key.owning_type
    }

    pub fn member_name(&self) -> &str {
        &self.key.member_name
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.key.parameter_types
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    pub fn binding_name(&self) -> &str {
        &self.binding_name
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Two descriptors are the same binding iff their keys are equal.
    pub fn same_binding(&self, other: &SymbolDescriptor) -> bool {
        self.key == other.key
    }
}

impl fmt::Display for SymbolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(ret) = &self.return_type {
            write!(f, " -> {ret}")?;
        }
        if self.binding_name != self.key.member_name {
            write!(f, " as {}", self.binding_name)?;
        }
        Ok(())
    }
}

/// Builder for [`SymbolDescriptor`]; validation happens in [`DescriptorBuilder::build`].
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    owning_type: String,
    member_name: String,
    kind: SymbolKind,
    parameter_types: Vec<String>,
    return_type: Option<String>,
    binding_name: Option<String>,
    location: Option<SourceLocation>,
}

impl DescriptorBuilder {
    pub fn params<P, S>(mut self, params: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn returns(mut self, return_type: Option<String>) -> Self {
        self.return_type = return_type;
        self
    }

    /// Override the binding name. Blank overrides are treated as absent.
    pub fn binding_name(mut self, binding_name: Option<String>) -> Self {
        self.binding_name = binding_name;
        self
    }

    pub fn location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn build(self) -> Result<SymbolDescriptor, DescriptorError> {
        let member = self.member_name.trim().to_string();
        if member.is_empty() {
            return Err(DescriptorError::EmptyMemberName);
        }
        if member.chars().any(char::is_whitespace) || member != self.member_name {
            return Err(DescriptorError::MalformedMemberName(self.member_name));
        }
        if self.owning_type.trim().is_empty() {
            return Err(DescriptorError::UnresolvedOwningType { member });
        }
        if let Some(index) = self.parameter_types.iter().position(|p| p.trim().is_empty()) {
            return Err(DescriptorError::UnresolvedParameterType { member, index });
        }
        match (&self.kind, &self.return_type) {
            (SymbolKind::Constructor, Some(ret)) => {
                return Err(DescriptorError::ConstructorReturnType {
                    member,
                    return_type: ret.clone(),
                });
            }
            (SymbolKind::Method, Some(ret)) if ret.trim().is_empty() => {
                return Err(DescriptorError::UnresolvedReturnType { member });
            }
            _ => {}
        }

        let binding_name = self
            .binding_name
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| member.clone());
        let location = self
            .location
            .unwrap_or_else(|| SourceLocation::new(format!("{}#{}", self.owning_type, member)));

        Ok(SymbolDescriptor {
            key: SymbolKey {
                owning_type: self.owning_type,
                member_name: member,
                parameter_types: self.parameter_types,
            },
            kind: self.kind,
            return_type: self.return_type,
            binding_name,
            location,
        })
    }
}

/// Flat serialized shape of a descriptor; deserialization re-runs validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDescriptor {
    owning_type: String,
    member_name: String,
    kind: SymbolKind,
    #[serde(default)]
    parameter_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    binding_name: Option<String>,
    location: SourceLocation,
}

impl TryFrom<RawDescriptor> for SymbolDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        SymbolDescriptor::builder(raw.owning_type, raw.member_name, raw.kind)
            .params(raw.parameter_types)
            .returns(raw.return_type)
            .binding_name(raw.binding_name)
            .location(raw.location)
            .build()
    }
}

impl From<SymbolDescriptor> for RawDescriptor {
    fn from(desc: SymbolDescriptor) -> Self {
        RawDescriptor {
            owning_type: desc.key.owning_type,
            member_name: desc.key.member_name,
            kind: desc.kind,
            parameter_types: desc.key.parameter_types,
            return_type: desc.return_type,
            binding_name: Some(desc.binding_name),
            location: desc.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_override_falls_back_to_member_name() {
        let desc = SymbolDescriptor::builder("Peer", "create", SymbolKind::Method)
            .binding_name(Some("  ".into()))
            .build()
            .unwrap();
        assert_eq!(desc.binding_name(), "create");
    }

    #[test]
    fn padded_member_name_is_malformed() {
        let err = SymbolDescriptor::builder("Peer", " create", SymbolKind::Method).build().unwrap_err();
        assert_eq!(err, DescriptorError::MalformedMemberName(" create".into()));
    }

    #[test]
    fn serde_rejects_constructor_with_return_type() {
        let json = r#"{
            "owning_type": "Peer",
            "member_name": "<init>",
            "kind": "constructor",
            "return_type": "void",
            "location": { "origin": "Peer.java" }
        }"#;
        let err = serde_json::from_str::<SymbolDescriptor>(json).unwrap_err();
        assert!(err.to_string().contains("constructor"));
    }
}
