//! Classifier port: the pre-trained model consumed as an oracle.
//!
//! The pipeline only guarantees the shape and scaling of the vector it hands
//! over; what happens inside `predict` belongs to the implementation.

use crate::domain::FeatureVector;

/// Tolerance for the probability distribution summing to 1.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Errors raised by a classifier implementation or by its output checks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("Classifier expects {expected} features, got {got}")]
    InputShape { expected: usize, got: usize },

    #[error("Classifier returned {got} probabilities for {expected} classes")]
    OutputShape { expected: usize, got: usize },

    #[error("Classifier returned class index {index} outside 0..{classes}")]
    ClassIndexOutOfRange { index: usize, classes: usize },

    #[error("Invalid probability distribution: {0}")]
    InvalidDistribution(String),

    #[error("Classifier failed: {0}")]
    Failed(String),
}

/// Raw classifier answer: class index plus per-class probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutput {
    pub class_index: usize,
    pub probabilities: Vec<f64>,
}

impl ClassifierOutput {
    /// Check that the output is a distribution over `classes` classes and that
    /// the index points into it.
    ///
    /// # Errors
    /// Returns `OracleError` describing the first violation.
    pub fn validate(&self, classes: usize) -> Result<(), OracleError> {
        if self.probabilities.len() != classes {
            return Err(OracleError::OutputShape {
                expected: classes,
                got: self.probabilities.len(),
            });
        }
        if self.class_index >= classes {
            return Err(OracleError::ClassIndexOutOfRange {
                index: self.class_index,
                classes,
            });
        }
        if let Some(p) = self
            .probabilities
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0)
        {
            return Err(OracleError::InvalidDistribution(format!(
                "probability {p} is not a finite non-negative number"
            )));
        }
        let sum: f64 = self.probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(OracleError::InvalidDistribution(format!(
                "probabilities sum to {sum}"
            )));
        }
        Ok(())
    }
}

/// Trait for the trained obesity classifier.
///
/// Implementations are loaded once and shared read-only, so they must be
/// `Send + Sync`.
pub trait Classifier: Send + Sync {
    /// Number of classes the model predicts.
    fn class_count(&self) -> usize;

    /// Classify one schema-aligned, normalized feature vector.
    ///
    /// # Errors
    /// Returns `OracleError` if the model cannot produce a prediction.
    fn predict(&self, features: &FeatureVector) -> Result<ClassifierOutput, OracleError>;
}
