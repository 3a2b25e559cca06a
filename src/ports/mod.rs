//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the screening pipeline and the pre-trained model artifacts.

mod classifier;
mod scaler;

pub use classifier::{Classifier, ClassifierOutput, OracleError, PROBABILITY_SUM_TOLERANCE};
pub use scaler::{Scaler, ScalerError};
