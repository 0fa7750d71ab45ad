//! Surface registry: an immutable, keyed index of symbol descriptors.
//!
//! A registry is built once per scan and never mutated afterwards, so it can
//! be shared across threads without locking.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{SourceLocation, SymbolDescriptor, SymbolKey};

/// One key claimed by more than one descriptor, with every location involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCollision {
    pub key: SymbolKey,
    pub locations: Vec<SourceLocation>,
}

impl fmt::Display for KeyCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locs: Vec<String> = self.locations.iter().map(ToString::to_string).collect();
        write!(f, "{} declared at {}", self.key, locs.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Build-time key collisions; every conflict is listed, not just the first.
    #[error("duplicate binding(s): {}", format_collisions(.0))]
    DuplicateBinding(Vec<KeyCollision>),
    #[error("no native-callable symbol {0}")]
    NotFound(SymbolKey),
}

fn format_collisions(collisions: &[KeyCollision]) -> String {
    collisions.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Group descriptors by key and return every key seen more than once.
///
/// Collisions come back in the order their key first appeared.
pub fn find_key_collisions(descriptors: &[SymbolDescriptor]) -> Vec<KeyCollision> {
    let mut order: Vec<&SymbolKey> = Vec::new();
    let mut seen: HashMap<&SymbolKey, Vec<SourceLocation>> = HashMap::new();
    for desc in descriptors {
        let locations = seen.entry(desc.key()).or_insert_with(|| {
            order.push(desc.key());
            Vec::new()
        });
        locations.push(desc.location().clone());
    }
    order
        .into_iter()
        .filter_map(|key| {
            let locations = seen.remove(key)?;
            (locations.len() > 1).then(|| KeyCollision { key: key.clone(), locations })
        })
        .collect()
}

/// Immutable index of native-callable descriptors.
#[derive(Debug, Clone, Default)]
pub struct SurfaceRegistry {
    descriptors: Vec<SymbolDescriptor>,
    index: HashMap<SymbolKey, usize>,
}

impl SurfaceRegistry {
    /// Build a registry, rejecting any key that appears more than once.
    pub fn build(
        descriptors: impl IntoIterator<Item = SymbolDescriptor>,
    ) -> Result<Self, RegistryError> {
        let descriptors: Vec<SymbolDescriptor> = descriptors.into_iter().collect();
        let collisions = find_key_collisions(&descriptors);
        if !collisions.is_empty() {
            debug!(collisions = collisions.len(), "registry build rejected");
            return Err(RegistryError::DuplicateBinding(collisions));
        }

        let index = descriptors.iter().enumerate().map(|(i, d)| (d.key().clone(), i)).collect();
        debug!(descriptors = descriptors.len(), "registry built");
        Ok(Self { descriptors, index })
    }

    pub fn lookup(
        &self,
        owning_type: &str,
        member_name: &str,
        parameter_types: &[&str],
    ) -> Result<&SymbolDescriptor, RegistryError> {
        let key = SymbolKey::new(owning_type, member_name, parameter_types.iter().copied());
        self.get(&key).ok_or(RegistryError::NotFound(key))
    }

    pub fn get(&self, key: &SymbolKey) -> Option<&SymbolDescriptor> {
        self.index.get(key).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.index.contains_key(key)
    }

    /// Every descriptor, in the order they were handed to [`SurfaceRegistry::build`].
    pub fn all(&self) -> &[SymbolDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Owning types in first-seen order, without repeats.
    pub fn owning_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for desc in &self.descriptors {
            if !out.contains(&desc.owning_type()) {
                out.push(desc.owning_type());
            }
        }
        out
    }

    pub fn members_of<'a>(
        &'a self,
        owning_type: &'a str,
    ) -> impl Iterator<Item = &'a SymbolDescriptor> + 'a {
        self.descriptors.iter().filter(move |d| d.owning_type() == owning_type)
    }
}

impl PartialEq for SurfaceRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.descriptors == other.descriptors
    }
}

impl Eq for SurfaceRegistry {}

impl Serialize for SurfaceRegistry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.descriptors.serialize(serializer)
    }
}
