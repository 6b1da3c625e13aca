//! # archivehub-entity
//!
//! Domain entity models for ArchiveHub's digital-entry subsystem. Every
//! struct in this crate represents a database table row or a domain value
//! object. Database entities derive `sqlx::FromRow`.

pub mod employee;
pub mod entry;
pub mod permission;
