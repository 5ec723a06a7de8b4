mod common;

use common::{
    credential, principal, setup, snapshot, Harness, OTHER_OWNER, OWNER, READER, STRANGER, WRITER,
};
use qualcode_core::{
    CodeChanges, CodeNode, CodeSystem, Collaborator, CollaboratorRole, CoreConfig, DocumentChanges,
    DocumentRepository, ErrorStatus, LifecycleError, ModelValidationError, ProjectChanges,
    ProjectDraft, ProjectRepository, QuoteChanges, Resource, ResourceChanges, ResourceRef,
};

#[test]
fn writer_update_stamps_record_and_owning_project() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.shared_project("P");
    let document = harness.create_document(project.id, "Interview 1");
    harness.clock.set(8_000);

    let updated = harness
        .service()
        .update(
            &credential(WRITER),
            ResourceRef::Document(document.id),
            ResourceChanges::Document(DocumentChanges {
                name: Some("Interview 1 (clean)".to_string()),
                ..DocumentChanges::default()
            }),
        )
        .unwrap();
    let Resource::Document(updated) = updated else {
        panic!("expected a document");
    };
    assert_eq!(updated.name, "Interview 1 (clean)");
    assert_eq!(updated.audit.modified_by, principal(WRITER));
    assert_eq!(updated.audit.modified_at, 8_000);
    assert_eq!(updated.audit.created_by, principal(OWNER));

    let stored = harness.store.get_document(document.id).unwrap().unwrap();
    assert_eq!(stored, updated);
    let project = harness.store.get_project(project.id).unwrap().unwrap();
    assert_eq!(project.audit.modified_by, principal(WRITER));
    assert_eq!(project.audit.modified_at, 8_000);
}

#[test]
fn reader_and_stranger_updates_are_forbidden_and_leave_store_unchanged() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.shared_project("P");
    let code = harness.create_code(project.id, "Emotion");
    let before = snapshot(&conn);
    harness.clock.set(9_000);

    for email in [READER, STRANGER] {
        let err = harness
            .service()
            .update(
                &credential(email),
                ResourceRef::Code(code.id),
                ResourceChanges::Code(CodeChanges {
                    name: Some("Renamed".to_string()),
                    description: None,
                }),
            )
            .unwrap_err();
        assert_eq!(err.status(), ErrorStatus::Forbidden);
    }
    assert_eq!(snapshot(&conn), before);
}

#[test]
fn update_of_missing_record_is_not_found() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let missing = uuid::Uuid::new_v4();

    let err = harness
        .service()
        .update(
            &credential(OWNER),
            ResourceRef::Code(missing),
            ResourceChanges::Code(CodeChanges::default()),
        )
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(ResourceRef::Code(id)) if id == missing));
}

#[test]
fn changes_of_another_kind_are_rejected() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.shared_project("P");
    let code = harness.create_code(project.id, "Emotion");

    let err = harness
        .service()
        .update(
            &credential(OWNER),
            ResourceRef::Code(code.id),
            ResourceChanges::Document(DocumentChanges::default()),
        )
        .unwrap_err();
    assert!(matches!(err, LifecycleError::KindMismatch { .. }));
    assert_eq!(err.status(), ErrorStatus::BadRequest);
}

#[test]
fn project_rename_must_stay_unique_for_owner() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let first = harness.create_project(OWNER, ProjectDraft::new("Study1"));
    harness.create_project(OWNER, ProjectDraft::new("Study2"));

    let err = harness
        .service()
        .update(
            &credential(OWNER),
            ResourceRef::Project(first.id),
            ResourceChanges::Project(ProjectChanges {
                name: Some("Study2".to_string()),
                ..ProjectChanges::default()
            }),
        )
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict { .. }));

    let renamed = harness
        .service()
        .update(
            &credential(OWNER),
            ResourceRef::Project(first.id),
            ResourceChanges::Project(ProjectChanges {
                name: Some(" Study1 ".to_string()),
                ..ProjectChanges::default()
            }),
        )
        .unwrap();
    assert!(matches!(renamed, Resource::Project(ref project) if project.name == "Study1"));
}

#[test]
fn project_collaborators_can_be_replaced() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.shared_project("P");

    harness
        .service()
        .update(
            &credential(OWNER),
            ResourceRef::Project(project.id),
            ResourceChanges::Project(ProjectChanges {
                collaborators: Some(vec![Collaborator::new(
                    principal(READER),
                    CollaboratorRole::ReaderWriter,
                )]),
                ..ProjectChanges::default()
            }),
        )
        .unwrap();

    let stored = harness.store.get_project(project.id).unwrap().unwrap();
    assert_eq!(stored.collaborators.len(), 1);
    assert_eq!(
        stored.collaborator(&principal(READER)).unwrap().role,
        CollaboratorRole::ReaderWriter
    );
    assert!(stored.collaborator(&principal(WRITER)).is_none());
}

#[test]
fn project_updates_are_unguarded_unless_configured() {
    let conn = setup();
    let changes = || {
        ResourceChanges::Project(ProjectChanges {
            name: Some("Hijacked".to_string()),
            ..ProjectChanges::default()
        })
    };

    let harness = Harness::new(&conn);
    let project = harness.shared_project("P");
    harness
        .service()
        .update(&credential(STRANGER), ResourceRef::Project(project.id), changes())
        .unwrap();

    let guarded = Harness::with_config(
        &conn,
        CoreConfig {
            guard_project_mutations: true,
            ..CoreConfig::default()
        },
    );
    let err = guarded
        .service()
        .update(&credential(READER), ResourceRef::Project(project.id), changes())
        .unwrap_err();
    assert_eq!(err.status(), ErrorStatus::Forbidden);
}

#[test]
fn quote_recoding_requires_code_of_same_project() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.shared_project("P");
    let other = harness.create_project(OWNER, ProjectDraft::new("Other"));
    let document = harness.create_document(project.id, "Interview 1");
    let quote = harness.create_quote(&document, None);
    let local = harness.create_code(project.id, "Emotion");
    let foreign = harness.create_code(other.id, "Foreign");

    let err = harness
        .service()
        .update(
            &credential(WRITER),
            ResourceRef::Quote(quote.id),
            ResourceChanges::Quote(QuoteChanges {
                code: Some(Some(foreign.id)),
                ..QuoteChanges::default()
            }),
        )
        .unwrap_err();
    assert_eq!(err.status(), ErrorStatus::BadRequest);

    let updated = harness
        .service()
        .update(
            &credential(WRITER),
            ResourceRef::Quote(quote.id),
            ResourceChanges::Quote(QuoteChanges {
                code: Some(Some(local.id)),
                ..QuoteChanges::default()
            }),
        )
        .unwrap();
    assert!(matches!(updated, Resource::Quote(ref q) if q.code == Some(local.id)));
}

#[test]
fn document_quote_list_accepts_only_its_own_quotes() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.shared_project("P");
    let document = harness.create_document(project.id, "Interview 1");
    let sibling = harness.create_document(project.id, "Interview 2");
    let own_quote = harness.create_quote(&document, None);
    let sibling_quote = harness.create_quote(&sibling, None);
    let victim = harness.create_project(OTHER_OWNER, ProjectDraft::new("Victim"));
    let victim_doc = harness.create_document(victim.id, "Private");
    let victim_quote = harness.create_quote(&victim_doc, None);
    let relist = |quotes: Vec<uuid::Uuid>| {
        harness.service().update(
            &credential(WRITER),
            ResourceRef::Document(document.id),
            ResourceChanges::Document(DocumentChanges {
                quotes: Some(quotes),
                ..DocumentChanges::default()
            }),
        )
    };

    let err = relist(vec![own_quote.id, victim_quote.id]).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Invalid(ModelValidationError::ProjectMismatch { field: "quote", .. })
    ));
    let err = relist(vec![sibling_quote.id]).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Invalid(ModelValidationError::QuoteOfOtherDocument { .. })
    ));
    let err = relist(vec![uuid::Uuid::new_v4()]).unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(ResourceRef::Quote(_))));

    let stored = harness.store.get_document(document.id).unwrap().unwrap();
    assert_eq!(stored.quotes, vec![own_quote.id]);

    relist(Vec::new()).unwrap();
    let stored = harness.store.get_document(document.id).unwrap().unwrap();
    assert!(stored.quotes.is_empty());
}

#[test]
fn code_system_update_rejects_repeated_and_foreign_codes() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.shared_project("P");
    let other = harness.create_project(OWNER, ProjectDraft::new("Other"));
    let a = harness.create_code(project.id, "A");
    let c = harness.create_code(project.id, "C");
    let foreign = harness.create_code(other.id, "Foreign");
    let set_tree = |tree: CodeSystem| {
        harness.service().update(
            &credential(OWNER),
            ResourceRef::Project(project.id),
            ResourceChanges::Project(ProjectChanges {
                code_system: Some(Some(tree)),
                ..ProjectChanges::default()
            }),
        )
    };

    let err = set_tree(CodeSystem::new(vec![
        CodeNode::with_children(a.id, vec![CodeNode::leaf(c.id)]),
        CodeNode::leaf(c.id),
    ]))
    .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Invalid(ModelValidationError::DuplicateCodeNode(id)) if id == c.id
    ));

    let err = set_tree(CodeSystem::new(vec![CodeNode::with_children(
        a.id,
        vec![CodeNode::leaf(foreign.id)],
    )]))
    .unwrap_err();
    assert_eq!(err.status(), ErrorStatus::BadRequest);

    let stored = harness.store.get_project(project.id).unwrap().unwrap();
    assert!(stored.code_system.is_none());

    set_tree(CodeSystem::new(vec![CodeNode::with_children(
        a.id,
        vec![CodeNode::leaf(c.id)],
    )]))
    .unwrap();
}
