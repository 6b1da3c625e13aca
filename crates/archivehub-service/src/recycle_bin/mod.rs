//! Per-owner bin: soft delete, restore, and permanent removal.

pub mod service;

pub use service::BinService;
