//! Capability checks combining ownership with delegated permission rows.

pub mod evaluator;

pub use evaluator::{AccessEvaluator, evaluate};
