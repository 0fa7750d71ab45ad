use std::fs;

use surface_core::manifest::{ExpectedManifest, ManifestError};
use surface_core::metadata::{
    DocumentFormat, DocumentSource, InMemorySource, MemberKind, MetadataError, MetadataSource,
    SourceRegistry, TypeMetadata, Visibility,
};
use surface_core::model::SymbolKey;
use surface_core::registry::{RegistryError, SurfaceRegistry};
use surface_core::scanner::scan;
use tempfile::tempdir;

const PEER_YAML: &str = r#"
types:
  - name: Peer
    members:
      - name: create
        kind: method
        returns: long
        marker: {}
      - name: destroy
        kind: method
        params: [int]
        returns: void
        marker:
          value: peer_destroy
        location:
          origin: Peer.java
          line: 30
      - name: onStats
        kind: method
        visibility: private
        marker: {}
"#;

#[test]
fn yaml_document_loads_with_defaults_and_aliases() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("peer.yaml");
    fs::write(&path, PEER_YAML).unwrap();

    let source = DocumentSource::new(&path);
    let types = source.types().expect("load yaml");
    assert_eq!(types.len(), 1);
    let members = &types[0].members;
    assert_eq!(members.len(), 3);
    assert_eq!(members[0].kind, MemberKind::Method);
    assert_eq!(members[0].visibility, Visibility::Public);
    assert_eq!(members[1].parameter_types, vec!["int".to_string()]);
    assert_eq!(members[1].marker.as_ref().and_then(|m| m.binding_override()), Some("peer_destroy"));
    assert_eq!(members[2].visibility, Visibility::Private);

    // Explicit locations survive; missing ones point back into the document.
    let explicit = members[1].location.as_ref().unwrap();
    assert_eq!(explicit.to_string(), "Peer.java:30");
    let filled = members[0].location.as_ref().unwrap();
    assert!(filled.origin.ends_with("peer.yaml#Peer.create[0]"), "origin was {}", filled.origin);
}

#[test]
fn json_document_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("peer.json");
    fs::write(
        &path,
        r#"{"types":[{"name":"Peer","members":[{"name":"<init>","kind":"constructor","marker":{}}]}]}"#,
    )
    .unwrap();

    let types = DocumentSource::new(&path).types().expect("load json");
    assert_eq!(types[0].members[0].kind, MemberKind::Constructor);
    assert!(types[0].members[0].is_marked());
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("peer.toml");
    fs::write(&path, "").unwrap();

    assert!(matches!(DocumentFormat::from_path(&path), Err(MetadataError::UnsupportedFormat(ext)) if ext == "toml"));
    assert!(matches!(DocumentSource::new(&path).types(), Err(MetadataError::UnsupportedFormat(_))));
}

#[test]
fn malformed_document_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = DocumentSource::new(&path).types().unwrap_err();
    assert!(matches!(err, MetadataError::Json { .. }));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn missing_document_is_io_error() {
    let dir = tempdir().unwrap();
    let err = DocumentSource::new(dir.path().join("absent.yaml")).types().unwrap_err();
    assert!(matches!(err, MetadataError::Io { .. }));
}

#[test]
fn source_registry_lists_sorted_names_and_merges_types() {
    let mut registry = SourceRegistry::new();
    registry
        .register(InMemorySource::new("zeta", vec![TypeMetadata::new("Z")]))
        .register(InMemorySource::new("alpha", vec![TypeMetadata::new("A1"), TypeMetadata::new("A2")]));

    assert_eq!(registry.names(), vec!["alpha".to_string(), "zeta".to_string()]);
    assert!(registry.get("alpha").is_some());
    assert!(registry.get("missing").is_none());

    let names: Vec<String> = registry.all_types().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["A1", "A2", "Z"]);
}

#[test]
fn manifest_loads_from_yaml_and_json() {
    let dir = tempdir().unwrap();
    let yaml = dir.path().join("native.yml");
    fs::write(
        &yaml,
        "required:\n  - owning_type: Peer\n    member_name: create\n  - owning_type: Peer\n    member_name: destroy\n    params: [int]\n",
    )
    .unwrap();
    let manifest = ExpectedManifest::load(&yaml).expect("yaml manifest");
    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.required[1].key(), SymbolKey::new("Peer", "destroy", ["int"]));

    let json = dir.path().join("native.json");
    fs::write(&json, r#"{"symbols":[{"owning_type":"Peer","member_name":"connect"}]}"#).unwrap();
    let manifest = ExpectedManifest::load(&json).expect("json manifest");
    assert_eq!(manifest.required[0].key(), SymbolKey::new("Peer", "connect", Vec::<String>::new()));
}

#[test]
fn manifest_errors_are_typed() {
    let dir = tempdir().unwrap();
    let txt = dir.path().join("native.txt");
    fs::write(&txt, "").unwrap();
    assert!(matches!(ExpectedManifest::load(&txt), Err(ManifestError::UnsupportedFormat(_))));

    let bad = dir.path().join("native.json");
    fs::write(&bad, "[").unwrap();
    assert!(matches!(ExpectedManifest::load(&bad), Err(ManifestError::Parse { .. })));
}

#[test]
fn repeated_members_in_a_document_keep_distinct_locations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupes.yaml");
    fs::write(
        &path,
        r#"
types:
  - name: Peer
    members:
      - name: send
        kind: method
        params: [String]
        marker: {}
      - name: close
        kind: method
        marker: {}
      - name: send
        kind: method
        params: [String]
        marker: {}
"#,
    )
    .unwrap();

    let types = DocumentSource::new(&path).types().expect("load yaml");
    let out = scan(&types);
    match SurfaceRegistry::build(out.descriptors) {
        Err(RegistryError::DuplicateBinding(collisions)) => {
            assert_eq!(collisions.len(), 1);
            let origins: Vec<&str> =
                collisions[0].locations.iter().map(|l| l.origin.as_str()).collect();
            assert_eq!(origins.len(), 2);
            assert_ne!(origins[0], origins[1]);
            assert!(origins[0].ends_with("dupes.yaml#Peer.send[0]"), "got {}", origins[0]);
            assert!(origins[1].ends_with("dupes.yaml#Peer.send[2]"), "got {}", origins[1]);
        }
        other => panic!("expected DuplicateBinding, got {other:?}"),
    }
}
