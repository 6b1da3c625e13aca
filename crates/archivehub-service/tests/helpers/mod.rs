//! Shared fixtures for the service scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use archivehub_core::config::ArchiveConfig;
use archivehub_core::error::{AppError, ErrorKind};
use archivehub_core::traits::FixedClock;
use archivehub_database::{ArchiveStore, MemoryArchiveStore};
use archivehub_entity::employee::{Employee, EmployeeRole};
use archivehub_entity::entry::Entry;
use archivehub_entity::permission::EntryOperation;
use archivehub_service::entry::{CreateEntryRequest, FileUpload};
use archivehub_service::{ArchiveServices, RequestContext};

/// An archive over an in-memory store with three employees and a frozen clock.
pub struct TestArchive {
    /// Backing store, for direct inspection.
    pub store: Arc<MemoryArchiveStore>,
    /// The injected clock.
    pub clock: Arc<FixedClock>,
    /// Services under test.
    pub services: ArchiveServices,
    /// Owner of most fixtures.
    pub alice: RequestContext,
    /// Usual share target.
    pub bob: RequestContext,
    /// Bystander.
    pub carol: RequestContext,
}

/// The instant every fixture starts at.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

impl TestArchive {
    /// Create an archive with default limits.
    pub async fn new() -> Self {
        Self::with_config(ArchiveConfig::default()).await
    }

    /// Create an archive with custom limits.
    pub async fn with_config(config: ArchiveConfig) -> Self {
        let now = start_time();
        let clock = Arc::new(FixedClock::new(now));

        let alice = Employee::new("alice", EmployeeRole::Archivist, now);
        let bob = Employee::new("bob", EmployeeRole::Employee, now);
        let carol = Employee::new("carol", EmployeeRole::Employee, now);

        let store = Arc::new(
            MemoryArchiveStore::with_employees([alice.clone(), bob.clone(), carol.clone()])
                .await
                .expect("Failed to seed employees"),
        );
        let services = ArchiveServices::new(store.clone(), clock.clone(), config);

        Self {
            store,
            clock,
            services,
            alice: RequestContext::for_employee(&alice),
            bob: RequestContext::for_employee(&bob),
            carol: RequestContext::for_employee(&carol),
        }
    }

    /// Create a directory, panicking on failure.
    pub async fn mkdir(&self, ctx: &RequestContext, parent: &str, name: &str) -> Entry {
        self.services
            .entries
            .create(ctx, CreateEntryRequest::directory(parent, name))
            .await
            .unwrap_or_else(|e| panic!("mkdir {parent}/{name} failed: {e}"))
    }

    /// Create a file holding `size` bytes, panicking on failure.
    pub async fn upload(&self, ctx: &RequestContext, parent: &str, name: &str, size: usize) -> Entry {
        self.services
            .entries
            .create(
                ctx,
                CreateEntryRequest::file(parent, name, FileUpload::new(vec![b'x'; size])),
            )
            .await
            .unwrap_or_else(|e| panic!("upload {parent}/{name} failed: {e}"))
    }

    /// Re-read an entry from the store.
    pub async fn reload(&self, entry: &Entry) -> Entry {
        self.store
            .find_entry(entry.id)
            .await
            .unwrap()
            .expect("entry vanished")
    }

    /// Evaluate access as the store currently stands.
    pub async fn can(&self, entry: &Entry, who: &RequestContext, op: EntryOperation) -> bool {
        self.services
            .access
            .can_perform_by_id(entry.id, who.employee_id, op)
            .await
            .unwrap()
    }

    /// Services built independently over the same store, the way a second
    /// process would see it.
    pub fn peer_services(&self) -> ArchiveServices {
        ArchiveServices::new(self.store.clone(), self.clock.clone(), ArchiveConfig::default())
    }

    /// Assert that every (path, name) pair in the store is unique.
    pub async fn assert_paths_unique(&self) {
        let mut all = self.store.find_subtree("/").await.unwrap();
        all.extend(self.store.find_subtree(&format!("{}_bin", self.alice.username)).await.unwrap());
        let mut pairs: Vec<(String, String)> = all.into_iter().map(|e| (e.path, e.name)).collect();
        let total = pairs.len();
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), total, "duplicate (path, name) pair in store");
    }
}

/// Assert that `result` failed with `kind`.
pub fn assert_kind<T: std::fmt::Debug>(result: Result<T, AppError>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("expected {kind}, got Ok({value:?})"),
        Err(e) => assert_eq!(e.kind, kind, "unexpected error: {e}"),
    }
}
