use std::sync::Arc;
use std::thread;

use surface_core::metadata::{MemberMetadata, TypeMetadata};
use surface_core::model::{SourceLocation, SymbolDescriptor, SymbolKey, SymbolKind};
use surface_core::registry::{RegistryError, SurfaceRegistry};
use surface_core::scanner::scan;

fn method(ty: &str, name: &str, params: &[&str], line: u32) -> SymbolDescriptor {
    SymbolDescriptor::builder(ty, name, SymbolKind::Method)
        .params(params.iter().copied())
        .location(SourceLocation::at_line(format!("{ty}.java"), line))
        .build()
        .expect("descriptor")
}

#[test]
fn duplicate_send_is_rejected_with_both_locations() {
    let ty = TypeMetadata::new("Peer")
        .with_member(
            MemberMetadata::method("send")
                .with_params(["String"])
                .with_location(SourceLocation::at_line("Peer.java", 12))
                .marked(),
        )
        .with_member(
            MemberMetadata::method("send")
                .with_params(["String"])
                .with_location(SourceLocation::at_line("Peer.java", 30))
                .marked(),
        );
    let out = scan(&[ty]);
    assert_eq!(out.descriptors.len(), 2);

    match SurfaceRegistry::build(out.descriptors) {
        Err(RegistryError::DuplicateBinding(collisions)) => {
            assert_eq!(collisions.len(), 1);
            assert_eq!(collisions[0].key, SymbolKey::new("Peer", "send", ["String"]));
            assert_eq!(
                collisions[0].locations,
                vec![SourceLocation::at_line("Peer.java", 12), SourceLocation::at_line("Peer.java", 30)]
            );
        }
        other => panic!("expected DuplicateBinding, got {other:?}"),
    }
}

#[test]
fn build_reports_every_collision_in_one_pass() {
    let descriptors = vec![
        method("A", "x", &[], 1),
        method("B", "y", &["int"], 2),
        method("A", "x", &[], 3),
        method("B", "y", &["int"], 4),
        method("A", "x", &[], 5),
    ];
    let err = SurfaceRegistry::build(descriptors).unwrap_err();
    let RegistryError::DuplicateBinding(collisions) = err else {
        panic!("expected DuplicateBinding");
    };
    assert_eq!(collisions.len(), 2);
    assert_eq!(collisions[0].locations.len(), 3);
    assert_eq!(collisions[1].key.owning_type, "B");
}

#[test]
fn overloads_by_parameter_shape_are_distinct_entries() {
    let registry = SurfaceRegistry::build(vec![
        method("Peer", "send", &["String"], 1),
        method("Peer", "send", &["byte[]"], 2),
    ])
    .expect("registry");
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.lookup("Peer", "send", &["byte[]"]).expect("lookup").location().line, Some(2));
}

#[test]
fn lookup_misses_with_not_found() {
    let registry = SurfaceRegistry::build(vec![method("Peer", "send", &["String"], 1)]).unwrap();
    let err = registry.lookup("Peer", "send", &[]).unwrap_err();
    assert_eq!(err, RegistryError::NotFound(SymbolKey::new("Peer", "send", Vec::<String>::new())));
}

#[test]
fn rebuilding_from_all_is_idempotent() {
    let original = SurfaceRegistry::build(vec![
        method("Peer", "create", &[], 1),
        method("Peer", "destroy", &["int"], 2),
        method("Call", "onEnded", &["long"], 3),
    ])
    .unwrap();
    let rebuilt = SurfaceRegistry::build(original.all().to_vec()).unwrap();
    assert_eq!(rebuilt, original);
    assert_eq!(rebuilt.owning_types(), vec!["Peer", "Call"]);
    assert_eq!(rebuilt.members_of("Peer").count(), 2);
}

#[test]
fn registry_is_shared_read_only_across_threads() {
    let registry = Arc::new(
        SurfaceRegistry::build((0..100).map(|i| method("Peer", &format!("m{i}"), &[], i))).unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..100).filter(|i| registry.lookup("Peer", &format!("m{i}"), &[]).is_ok()).count()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("reader thread"), 100);
    }
}
