use surface_core::metadata::{MemberMetadata, TypeMetadata, Visibility};
use surface_core::model::SymbolKind;
use surface_core::scanner::{scan, DiagnosticKind};

fn peer() -> TypeMetadata {
    TypeMetadata::new("Peer")
        .with_member(MemberMetadata::method("create").with_return("long").marked())
        .with_member(MemberMetadata::method("toString").with_return("String"))
        .with_member(
            MemberMetadata::method("destroy").with_params(["int"]).with_return("void").marked_as("peer_destroy"),
        )
}

#[test]
fn peer_scenario_yields_two_descriptors() {
    let out = scan(&[peer()]);
    assert!(out.diagnostics.is_empty(), "unexpected diagnostics: {:?}", out.diagnostics);
    assert_eq!(out.descriptors.len(), 2);

    let create = &out.descriptors[0];
    assert_eq!(create.owning_type(), "Peer");
    assert_eq!(create.member_name(), "create");
    assert!(create.parameter_types().is_empty());
    assert_eq!(create.binding_name(), "create");

    let destroy = &out.descriptors[1];
    assert_eq!(destroy.member_name(), "destroy");
    assert_eq!(destroy.parameter_types(), ["int".to_string()]);
    assert_eq!(destroy.binding_name(), "peer_destroy");
}

#[test]
fn unmarked_members_never_produce_descriptors() {
    let ty = TypeMetadata::new("Quiet")
        .with_member(MemberMetadata::method("a"))
        .with_member(MemberMetadata::constructor("<init>"))
        .with_member(MemberMetadata::field("handle"));
    let out = scan(&[ty]);
    assert!(out.descriptors.is_empty());
    assert!(out.diagnostics.is_empty());
}

#[test]
fn output_follows_input_and_declaration_order() {
    let a = TypeMetadata::new("B")
        .with_member(MemberMetadata::method("z").marked())
        .with_member(MemberMetadata::method("a").marked());
    let b = TypeMetadata::new("A").with_member(MemberMetadata::constructor("<init>").marked());
    let out = scan(&[a, b]);
    let names: Vec<String> =
        out.descriptors.iter().map(|d| format!("{}.{}", d.owning_type(), d.member_name())).collect();
    assert_eq!(names, vec!["B.z", "B.a", "A.<init>"]);
    assert_eq!(out.descriptors[2].kind(), SymbolKind::Constructor);
}

#[test]
fn private_marked_member_is_misuse_but_still_emitted() {
    let ty = TypeMetadata::new("Peer").with_member(
        MemberMetadata::method("onStats").with_visibility(Visibility::Private).marked(),
    );
    let out = scan(&[ty]);
    assert_eq!(out.descriptors.len(), 1);
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MarkerMisuse);
    assert!(out.diagnostics[0].message.contains("private"));
    assert_eq!(out.misuse_count(), 1);
}

#[test]
fn marked_field_is_misuse_without_descriptor() {
    let ty = TypeMetadata::new("Peer").with_member(MemberMetadata::field("nativePeer").marked());
    let out = scan(&[ty]);
    assert!(out.descriptors.is_empty());
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MarkerMisuse);
}

#[test]
fn malformed_member_is_skipped_and_scan_continues() {
    let ty = TypeMetadata::new("Peer")
        .with_member(MemberMetadata::constructor("<init>").with_return("Peer").marked())
        .with_member(MemberMetadata::method("").marked())
        .with_member(MemberMetadata::method("create").marked());
    let out = scan(&[ty]);
    assert_eq!(out.descriptors.len(), 1);
    assert_eq!(out.descriptors[0].member_name(), "create");
    assert_eq!(out.diagnostics.len(), 2);
    assert!(out.diagnostics.iter().all(|d| d.kind == DiagnosticKind::InvalidDescriptor));
}

#[test]
fn empty_marker_value_means_no_override() {
    let ty = TypeMetadata::new("Peer").with_member(MemberMetadata::method("create").marked_as(""));
    let out = scan(&[ty]);
    assert_eq!(out.descriptors[0].binding_name(), "create");
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_scan_matches_sequential_scan() {
    use surface_core::scanner::scan_parallel;

    let types: Vec<TypeMetadata> = (0..64)
        .map(|i| {
            let mut ty = TypeMetadata::new(format!("Type{i}"));
            for m in 0..8 {
                let mut member = MemberMetadata::method(format!("m{m}")).with_params(["int"; 1]);
                if (i + m) % 3 != 0 {
                    member = member.marked();
                }
                if m == 5 {
                    member = member.with_visibility(Visibility::Protected);
                }
                ty = ty.with_member(member);
            }
            ty
        })
        .collect();

    assert_eq!(scan_parallel(&types), scan(&types));
}
