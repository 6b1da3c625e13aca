//! Per-user sharing permissions on entries.

pub mod model;
pub mod operation;

pub use model::EntryPermission;
pub use operation::{AllowedOperations, EntryOperation};
