//! # archivehub-core
//!
//! Core crate for ArchiveHub. Contains the unified error system,
//! configuration schemas, the path resolver for the flat entry store,
//! and the provider traits (such as the clock)
//! that the service layer is injected with.
//!
//! This crate has **no** internal dependencies on other ArchiveHub crates.

pub mod config;
pub mod error;
pub mod path;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
