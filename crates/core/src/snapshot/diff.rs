use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{SymbolDescriptor, SymbolKey};
use crate::snapshot::Snapshot;

/// Which part of a binding changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    Kind,
    ReturnType,
    BindingName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorChange {
    pub old: SymbolDescriptor,
    pub new: SymbolDescriptor,
    pub fields: Vec<ChangedField>,
}

/// Additions, removals, and in-place changes, each ordered by key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffResult {
    pub added: Vec<SymbolDescriptor>,
    pub removed: Vec<SymbolDescriptor>,
    pub changed: Vec<DescriptorChange>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Removals and changes break native callers; additions do not.
    pub fn is_breaking(&self) -> bool {
        !self.removed.is_empty() || !self.changed.is_empty()
    }
}

/// Compare two snapshots by descriptor key.
pub fn diff(old: &Snapshot, new: &Snapshot) -> DiffResult {
    diff_descriptors(&old.descriptors, &new.descriptors)
}

/// Compare two descriptor sets by key.
///
/// If a set repeats a key, the first occurrence is used.
pub fn diff_descriptors(old: &[SymbolDescriptor], new: &[SymbolDescriptor]) -> DiffResult {
    let old_map = by_key(old);
    let new_map = by_key(new);
    let mut result = DiffResult::default();

    for (key, old_desc) in &old_map {
        match new_map.get(key) {
            None => result.removed.push((*old_desc).clone()),
            Some(new_desc) => {
                let fields = changed_fields(old_desc, new_desc);
                if !fields.is_empty() {
                    result.changed.push(DescriptorChange {
                        old: (*old_desc).clone(),
                        new: (*new_desc).clone(),
                        fields,
                    });
                }
            }
        }
    }
    for (key, new_desc) in &new_map {
        if !old_map.contains_key(key) {
            result.added.push((*new_desc).clone());
        }
    }
    result
}

fn by_key(descriptors: &[SymbolDescriptor]) -> BTreeMap<&SymbolKey, &SymbolDescriptor> {
    let mut map = BTreeMap::new();
    for desc in descriptors {
        map.entry(desc.key()).or_insert(desc);
    }
    map
}

fn changed_fields(old: &SymbolDescriptor, new: &SymbolDescriptor) -> Vec<ChangedField> {
    let mut fields = Vec::new();
    if old.kind() != new.kind() {
        fields.push(ChangedField::Kind);
    }
    if old.return_type() != new.return_type() {
        fields.push(ChangedField::ReturnType);
    }
    if old.binding_name() != new.binding_name() {
        fields.push(ChangedField::BindingName);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SymbolKind;

    fn method(name: &str, ret: Option<&str>) -> SymbolDescriptor {
        SymbolDescriptor::builder("Peer", name, SymbolKind::Method)
            .returns(ret.map(str::to_string))
            .build()
            .unwrap()
    }

    #[test]
    fn repeated_key_uses_first_occurrence() {
        let old = vec![method("a", Some("int")), method("a", Some("long"))];
        let new = vec![method("a", Some("int"))];
        assert!(diff_descriptors(&old, &new).is_empty());
    }
}
