use surface_core::manifest::{ExpectedManifest, ExpectedSymbol};
use surface_core::metadata::{MemberMetadata, TypeMetadata, Visibility};
use surface_core::model::{SymbolDescriptor, SymbolKey, SymbolKind};
use surface_core::registry::SurfaceRegistry;
use surface_core::scanner::scan;
use surface_core::snapshot::Snapshot;
use surface_core::verify::{OverloadPolicy, Verifier, VerifyOptions, ViolationKind};

fn clean_peer() -> TypeMetadata {
    TypeMetadata::new("Peer")
        .with_member(MemberMetadata::method("create").with_return("long").marked())
        .with_member(MemberMetadata::method("destroy").with_params(["int"]).marked_as("peer_destroy"))
}

fn method(ty: &str, name: &str, params: &[&str], binding: Option<&str>) -> SymbolDescriptor {
    SymbolDescriptor::builder(ty, name, SymbolKind::Method)
        .params(params.iter().copied())
        .binding_name(binding.map(str::to_string))
        .build()
        .expect("descriptor")
}

#[test]
fn clean_surface_passes() {
    let out = scan(&[clean_peer()]);
    let registry = SurfaceRegistry::build(out.descriptors).unwrap();
    let violations = Verifier::default().verify(&registry, None, &out.diagnostics);
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn missing_expected_symbol_is_the_only_violation() {
    let out = scan(&[clean_peer()]);
    let registry = SurfaceRegistry::build(out.descriptors).unwrap();
    let manifest = ExpectedManifest::new(vec![
        ExpectedSymbol::new("Peer", "create", Vec::<String>::new()),
        ExpectedSymbol::new("Peer", "connect", Vec::<String>::new()),
    ]);

    let violations = Verifier::default().verify(&registry, Some(&manifest), &out.diagnostics);
    assert_eq!(violations.len(), 1, "{violations:?}");
    assert_eq!(violations[0].kind, ViolationKind::MissingExpectedSymbol);
    assert_eq!(violations[0].subjects[0].key, SymbolKey::new("Peer", "connect", Vec::<String>::new()));
    assert!(violations[0].subjects[0].location.is_none());
}

#[test]
fn forbidden_overloads_collide_regardless_of_parameters() {
    let registry = SurfaceRegistry::build(vec![
        method("Peer", "send", &["String"], None),
        method("Peer", "send", &["byte[]"], None),
        method("Peer", "close", &[], None),
    ])
    .unwrap();

    let allow = Verifier::new(VerifyOptions::default()).verify(&registry, None, &[]);
    assert!(allow.is_empty());

    let forbid = Verifier::new(VerifyOptions::forbid_overloads()).verify(&registry, None, &[]);
    assert_eq!(forbid.len(), 1);
    assert_eq!(forbid[0].kind, ViolationKind::SignatureCollision);
    assert_eq!(forbid[0].subjects.len(), 2);
}

#[test]
fn overloads_that_erase_to_the_same_shape_collide() {
    let registry = SurfaceRegistry::build(vec![
        method("Peer", "send", &["String"], None),
        method("Peer", "send", &["byte[]"], None),
        method("Peer", "send", &["int"], None),
    ])
    .unwrap();
    let mut options = VerifyOptions::default();
    options.erasure.insert("String".into(), "jobject".into());
    options.erasure.insert("byte[]".into(), "jobject".into());
    assert_eq!(options.overload_policy, OverloadPolicy::Allow);

    let violations = Verifier::new(options).verify(&registry, None, &[]);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::SignatureCollision);
    assert!(violations[0].message.contains("(jobject)"));
    let params: Vec<&str> =
        violations[0].subjects.iter().map(|s| s.key.parameter_types[0].as_str()).collect();
    assert_eq!(params, vec!["String", "byte[]"]);
}

#[test]
fn two_members_sharing_a_binding_name_are_duplicate_bindings() {
    let registry = SurfaceRegistry::build(vec![
        method("Peer", "release", &[], Some("peer_destroy")),
        method("Peer", "destroy", &["int"], Some("peer_destroy")),
        method("Call", "destroy", &[], Some("peer_destroy")),
    ])
    .unwrap();
    let violations = Verifier::default().verify(&registry, None, &[]);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::DuplicateBinding);
    assert!(violations[0].message.contains("release, destroy"));
}

#[test]
fn marker_misuse_is_propagated_from_scan_diagnostics() {
    let ty = clean_peer().with_member(
        MemberMetadata::method("onStats").with_visibility(Visibility::Package).marked(),
    );
    let out = scan(&[ty]);
    let registry = SurfaceRegistry::build(out.descriptors).unwrap();
    let violations = Verifier::default().verify(&registry, None, &out.diagnostics);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::MarkerMisuse);
    assert_eq!(violations[0].subjects[0].key.member_name, "onStats");
}

#[test]
fn all_checks_run_and_come_back_in_kind_order() {
    let ty = TypeMetadata::new("Peer")
        .with_member(MemberMetadata::method("hidden").with_visibility(Visibility::Private).marked())
        .with_member(MemberMetadata::method("send").with_params(["String"]).marked())
        .with_member(MemberMetadata::method("send").with_params(["int"]).marked());
    let out = scan(&[ty]);
    let registry = SurfaceRegistry::build(out.descriptors).unwrap();
    let manifest = ExpectedManifest::new(vec![ExpectedSymbol::new("Peer", "connect", Vec::<String>::new())]);

    let kinds: Vec<ViolationKind> = Verifier::new(VerifyOptions::forbid_overloads())
        .verify(&registry, Some(&manifest), &out.diagnostics)
        .into_iter()
        .map(|v| v.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ViolationKind::SignatureCollision,
            ViolationKind::MissingExpectedSymbol,
            ViolationKind::MarkerMisuse
        ]
    );
}

#[test]
fn untrusted_snapshot_is_rechecked_for_duplicate_keys() {
    let dup = method("Peer", "send", &["String"], None);
    let snapshot = Snapshot::from_descriptors(
        "tampered",
        "2024-01-01T00:00:00+00:00",
        vec![dup.clone(), method("Peer", "create", &[], None), dup],
    );
    let manifest = ExpectedManifest::new(vec![ExpectedSymbol::new("Peer", "create", Vec::<String>::new())]);

    let violations = Verifier::default().verify_snapshot(&snapshot, Some(&manifest));
    assert_eq!(violations.len(), 1, "{violations:?}");
    assert_eq!(violations[0].kind, ViolationKind::DuplicateBinding);
    assert_eq!(violations[0].subjects.len(), 2);
}

#[test]
fn verifier_leaves_registry_untouched() {
    let registry = SurfaceRegistry::build(vec![method("Peer", "send", &["String"], None)]).unwrap();
    let before = registry.clone();
    let _ = Verifier::new(VerifyOptions::forbid_overloads()).verify(
        &registry,
        Some(&ExpectedManifest::default()),
        &[],
    );
    assert_eq!(registry, before);
}
