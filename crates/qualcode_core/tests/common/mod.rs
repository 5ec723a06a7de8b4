#![allow(dead_code)]

use qualcode_core::db::open_db_in_memory;
use qualcode_core::{
    Clock, Code, CodeDraft, CollaboratorRole, CoreConfig, Credential, Document, DocumentDraft,
    Principal, Project, ProjectDraft, ProjectId, Quote, QuoteDraft, Resource, ResourceDraft,
    ResourceService, SqliteStore, StaticIdentityResolver,
};
use rusqlite::Connection;
use std::cell::Cell;

pub const OWNER: &str = "a@x.com";
pub const OTHER_OWNER: &str = "b@x.com";
pub const READER: &str = "c@x.com";
pub const WRITER: &str = "d@x.com";
pub const STRANGER: &str = "s@x.com";

/// Clock returning a settable instant.
pub struct FixedClock(Cell<i64>);

impl FixedClock {
    pub fn at(now: i64) -> Self {
        Self(Cell::new(now))
    }

    pub fn set(&self, now: i64) {
        self.0.set(now);
    }
}

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0.get()
    }
}

pub fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

pub fn principal(email: &str) -> Principal {
    Principal::parse(email).unwrap()
}

pub fn credential(email: &str) -> Credential {
    Credential::bearer(&format!("token-{email}"))
}

pub fn resolver() -> StaticIdentityResolver {
    [OWNER, OTHER_OWNER, READER, WRITER, STRANGER]
        .into_iter()
        .fold(StaticIdentityResolver::new(), |resolver, email| {
            resolver.with_token(format!("token-{email}"), principal(email))
        })
}

/// Store, resolver and clock wired together for one test.
pub struct Harness<'conn> {
    pub store: SqliteStore<'conn>,
    pub resolver: StaticIdentityResolver,
    pub clock: FixedClock,
    pub config: CoreConfig,
}

impl<'conn> Harness<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_config(conn, CoreConfig::default())
    }

    pub fn with_config(conn: &'conn Connection, config: CoreConfig) -> Self {
        Self {
            store: SqliteStore::try_new(conn).unwrap(),
            resolver: resolver(),
            clock: FixedClock::at(1_000),
            config,
        }
    }

    pub fn service(
        &self,
    ) -> ResourceService<'_, SqliteStore<'conn>, StaticIdentityResolver, FixedClock> {
        ResourceService::new(&self.store, &self.resolver, &self.clock, self.config)
    }

    /// Project owned by `OWNER` with a Reader and a ReaderWriter collaborator.
    pub fn shared_project(&self, name: &str) -> Project {
        let draft = ProjectDraft::new(name)
            .with_collaborator(principal(READER), CollaboratorRole::Reader)
            .with_collaborator(principal(WRITER), CollaboratorRole::ReaderWriter);
        self.create_project(OWNER, draft)
    }

    pub fn create_project(&self, owner: &str, draft: ProjectDraft) -> Project {
        match self.insert_one(owner, draft) {
            Resource::Project(project) => project,
            other => panic!("unexpected record: {other:?}"),
        }
    }

    pub fn create_document(&self, project: ProjectId, name: &str) -> Document {
        match self.insert_one(OWNER, DocumentDraft::new(project, name, "interview transcript")) {
            Resource::Document(document) => document,
            other => panic!("unexpected record: {other:?}"),
        }
    }

    pub fn create_code(&self, project: ProjectId, name: &str) -> Code {
        match self.insert_one(OWNER, CodeDraft::new(project, name)) {
            Resource::Code(code) => code,
            other => panic!("unexpected record: {other:?}"),
        }
    }

    pub fn create_quote(&self, document: &Document, code: Option<&Code>) -> Quote {
        let mut draft = QuoteDraft::new(document.project, document.id, "fragment", 0, 8);
        if let Some(code) = code {
            draft = draft.with_code(code.id);
        }
        match self.insert_one(OWNER, draft) {
            Resource::Quote(quote) => quote,
            other => panic!("unexpected record: {other:?}"),
        }
    }

    pub fn insert_one(&self, email: &str, draft: impl Into<ResourceDraft>) -> Resource {
        self.service()
            .insert(&credential(email), vec![draft.into()])
            .unwrap()
            .remove(0)
    }
}

pub fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

/// Total rows across all collections, to assert a request left no trace.
pub fn snapshot(conn: &Connection) -> Vec<(String, i64, i64)> {
    ["projects", "documents", "quotes", "codes"]
        .into_iter()
        .map(|table| {
            let (rows, latest): (i64, i64) = conn
                .query_row(
                    &format!("SELECT COUNT(*), COALESCE(MAX(modified_at), 0) FROM {table};"),
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .unwrap();
            (table.to_string(), rows, latest)
        })
        .collect()
}
