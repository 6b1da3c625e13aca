//! Per-employee sharing with recursive propagation.

pub mod request;
pub mod service;

pub use request::ShareRequest;
pub use service::{ShareService, SharedEntry};
