//! # Weightwise
//!
//! Obesity-risk screening from anthropometric and lifestyle answers.
//!
//! This crate provides:
//! - The preprocessing pipeline that turns one questionnaire into the feature
//!   vector a pre-trained classifier expects (BMI, age bracket, categorical
//!   encoding, schema alignment, numeric scaling)
//! - A classifier-independent health score and wellness summary
//! - Loading of signed model bundles
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and rules (input, encoding, feature vectors, classes)
//! - `ports`: Trait definitions for the classifier and scaler
//! - `adapters`: Concrete implementations (model bundle, linear model, scalers)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven runtime configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{ScreeningReport, ScreeningService};
pub use domain::{ObesityClass, PredictionResult, RawInput};

/// Result type for Weightwise operations
pub type Result<T> = std::result::Result<T, WeightwiseError>;

/// Main error type for Weightwise
#[derive(Debug, thiserror::Error)]
pub enum WeightwiseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Feature vector does not match the model schema: {0}")]
    SchemaMismatch(#[from] domain::FeatureError),

    #[error("Model bundle failed to load: {0}")]
    ArtifactLoad(#[from] adapters::ArtifactError),

    #[error("Classifier failed: {0}")]
    Oracle(#[from] ports::OracleError),

    #[error("Normalization failed: {0}")]
    Normalization(#[from] ports::ScalerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
