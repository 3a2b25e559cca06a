//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the screening use case.

mod preprocess;
mod screening;

pub use preprocess::{normalize, Preprocessor};
pub use screening::{ScreeningReport, ScreeningService};
