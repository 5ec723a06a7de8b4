//! End-to-end request sequences over one store.

mod common;

use common::{credential, principal, setup, Harness};
use qualcode_core::{
    CodeRepository, CollaboratorRole, DocumentDraft, DocumentRepository, LifecycleError,
    ProjectDraft, ProjectRepository, QuoteRepository, Resource, ResourceRef,
};

#[test]
fn same_owner_cannot_reuse_a_project_name_but_another_owner_can() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let service = harness.service();

    service
        .insert(&credential("a@x.com"), vec![ProjectDraft::new("Study1").into()])
        .unwrap();
    let err = service
        .insert(&credential("a@x.com"), vec![ProjectDraft::new("Study1").into()])
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Conflict { .. }));

    let created = service
        .insert(&credential("b@x.com"), vec![ProjectDraft::new("Study1").into()])
        .unwrap();
    assert!(matches!(&created[0], Resource::Project(project) if project.owner == principal("b@x.com")));
}

#[test]
fn reader_collaborator_reads_but_cannot_add_documents() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.create_project(
        "a@x.com",
        ProjectDraft::new("P").with_collaborator(principal("c@x.com"), CollaboratorRole::Reader),
    );
    let service = harness.service();

    let err = service
        .insert(
            &credential("c@x.com"),
            vec![DocumentDraft::new(project.id, "D", "text").into()],
        )
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Forbidden { .. }));

    let read = service
        .get(&credential("c@x.com"), ResourceRef::Project(project.id))
        .unwrap();
    assert_eq!(read.reference(), ResourceRef::Project(project.id));
}

#[test]
fn reader_writer_collaborator_adds_document_and_stamps_project() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.create_project(
        "a@x.com",
        ProjectDraft::new("P")
            .with_collaborator(principal("d@x.com"), CollaboratorRole::ReaderWriter),
    );

    harness
        .service()
        .insert(
            &credential("d@x.com"),
            vec![DocumentDraft::new(project.id, "D", "text").into()],
        )
        .unwrap();

    let stored = harness.store.get_project(project.id).unwrap().unwrap();
    assert_eq!(stored.audit.modified_by, principal("d@x.com"));
}

#[test]
fn deleting_project_removes_its_documents_quotes_and_codes() {
    let conn = setup();
    let harness = Harness::new(&conn);
    let project = harness.create_project("a@x.com", ProjectDraft::new("P"));
    let d1 = harness.create_document(project.id, "D1");
    let d2 = harness.create_document(project.id, "D2");
    let c1 = harness.create_code(project.id, "C1");
    let q1 = harness.create_quote(&d1, None);
    let q2 = harness.create_quote(&d1, None);
    harness.create_quote(&d2, Some(&c1));

    harness
        .service()
        .delete(&credential("a@x.com"), ResourceRef::Project(project.id))
        .unwrap();

    assert!(harness.store.get_document(d1.id).unwrap().is_none());
    assert!(harness.store.get_quote(q1.id).unwrap().is_none());
    assert!(harness.store.get_quote(q2.id).unwrap().is_none());
    assert!(harness.store.get_code(c1.id).unwrap().is_none());
}
