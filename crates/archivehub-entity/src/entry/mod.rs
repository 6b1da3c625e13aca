//! Entry (file/directory) domain entities.

pub mod file;
pub mod model;

pub use file::FileEntity;
pub use model::{Entry, EntryKind};
