//! # archivehub-service
//!
//! Business logic for the digital-entry subsystem. Each service reads
//! through an [`ArchiveStore`](archivehub_database::ArchiveStore), checks
//! ownership and delegated rights with the [`AccessEvaluator`], and applies
//! structural changes inside a store transaction that locks the trees it
//! touches, committing the whole effect as one write batch.
//!
//! Services follow constructor injection: the store, clock, and
//! configuration are provided at construction time via `Arc` references.

pub mod access;
pub mod archive;
pub mod context;
pub mod entry;
pub mod file;
pub mod lock;
pub mod recycle_bin;
pub mod share;
pub mod validation;

pub use access::AccessEvaluator;
pub use archive::ArchiveServices;
pub use context::RequestContext;
pub use entry::EntryService;
pub use file::{DownloadResult, DownloadService};
pub use recycle_bin::BinService;
pub use share::{ShareService, SharedEntry};
