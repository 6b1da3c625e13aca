//! # archivehub-database
//!
//! PostgreSQL connection management, repository implementations for the
//! digital-entry tables, and the [`ArchiveStore`] abstraction through which
//! the service layer reads rows and commits atomic write batches, either
//! directly or through a lock-holding [`ArchiveTransaction`].
//!
//! With the `memory` feature (on by default) an in-process
//! [`MemoryArchiveStore`] is also available for tests and local tooling.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
#[cfg(feature = "memory")]
pub use store::MemoryArchiveStore;
pub use store::{ArchiveStore, ArchiveTransaction, PgArchiveStore, WriteBatch, WriteOp};
