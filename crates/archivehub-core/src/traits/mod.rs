//! Provider traits defined in `archivehub-core` and implemented or
//! injected by other crates.

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};
