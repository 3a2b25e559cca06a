//! Adapters layer: Concrete implementations of ports.
//!
//! - `bundle`: JSON model bundle loader with signed-manifest verification
//! - `linear`: softmax linear classifier
//! - `scaler`: fitted standard / min-max scalers
//! - `sanitize`: measurement and secret filtering for logs

pub mod bundle;
mod linear;
pub mod sanitize;
mod scaler;

pub use bundle::{ArtifactError, LoadOptions, ModelBundle, ModelMetadata};
pub use linear::LinearClassifier;
pub use scaler::FittedScaler;
