//! Multinomial linear classifier (softmax over per-class linear scores).
//!
//! This is the shape scikit-learn's `LogisticRegression` exports with
//! `coef_` / `intercept_`, applied to the normalized feature vector.

use serde::{Deserialize, Serialize};

use crate::domain::FeatureVector;
use crate::ports::{Classifier, ClassifierOutput, OracleError};

/// Exported linear model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    /// Feature names in the order of each coefficient row
    pub feature_names: Vec<String>,
    /// One row per class, in label-mapping order
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearClassifier {
    /// Check parameter shapes.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err("classifier has no features".into());
        }
        if self.coefficients.is_empty() {
            return Err("classifier has no classes".into());
        }
        if self.intercepts.len() != self.coefficients.len() {
            return Err(format!(
                "{} intercepts for {} coefficient rows",
                self.intercepts.len(),
                self.coefficients.len()
            ));
        }
        if let Some((i, row)) = self
            .coefficients
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n)
        {
            return Err(format!(
                "coefficient row {i} has {} values for {n} features",
                row.len()
            ));
        }
        let all_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(&self.intercepts)
            .all(|v| v.is_finite());
        if !all_finite {
            return Err("classifier parameters contain a non-finite value".into());
        }
        Ok(())
    }

    fn scores(&self, x: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }
}

/// Numerically stable softmax.
fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for LinearClassifier {
    fn class_count(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &FeatureVector) -> Result<ClassifierOutput, OracleError> {
        if features.len() != self.feature_names.len() {
            return Err(OracleError::InputShape {
                expected: self.feature_names.len(),
                got: features.len(),
            });
        }
        if features.names() != self.feature_names.as_slice() {
            return Err(OracleError::Failed(
                "feature order differs from the trained model".into(),
            ));
        }

        let scores = self.scores(features.values());
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(OracleError::Failed("non-finite class score".into()));
        }
        let probabilities = softmax(&scores);
        let class_index = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .ok_or_else(|| OracleError::Failed("empty probability vector".into()))?;

        Ok(ClassifierOutput {
            class_index,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        assemble, AgeBracket, DerivedAttributes, EncodedColumns, FeatureSchema, NumericColumns,
    };
    use crate::ports::PROBABILITY_SUM_TOLERANCE;

    fn vector(names: &[&str], values: &[f64]) -> FeatureVector {
        // Build through the assembler so the vector is schema-checked.
        let schema =
            FeatureSchema::new(names.iter().map(|n| n.to_string()).collect()).expect("schema");
        let encoded: EncodedColumns = names
            .iter()
            .zip(values)
            .map(|(n, v)| (n.to_string(), *v))
            .collect();
        let derived = DerivedAttributes {
            bmi: 0.0,
            age_bracket: AgeBracket::Adult,
        };
        assemble(&derived, &encoded, &NumericColumns::new(), &schema)
            .expect("assembles")
            .0
    }

    fn model() -> LinearClassifier {
        LinearClassifier {
            feature_names: vec!["x".into(), "y".into()],
            coefficients: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
            intercepts: vec![0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_softmax_is_a_distribution() {
        let p = softmax(&[1000.0, 0.0, -1000.0]);
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < PROBABILITY_SUM_TOLERANCE);
        assert!(p.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_predicts_highest_score() {
        let model = model();
        assert!(model.validate().is_ok());

        let out = model.predict(&vector(&["x", "y"], &[2.0, 0.5])).expect("predicts");
        assert_eq!(out.class_index, 0);
        assert!(out.validate(3).is_ok());

        let out = model.predict(&vector(&["x", "y"], &[-2.0, -2.0])).expect("predicts");
        assert_eq!(out.class_index, 2);
    }

    #[test]
    fn test_rejects_mismatched_vectors() {
        let model = model();
        assert!(matches!(
            model.predict(&vector(&["x"], &[1.0])),
            Err(OracleError::InputShape { expected: 2, got: 1 })
        ));
        assert!(matches!(
            model.predict(&vector(&["y", "x"], &[1.0, 1.0])),
            Err(OracleError::Failed(_))
        ));
    }

    #[test]
    fn test_validate_catches_ragged_rows() {
        let mut model = model();
        model.coefficients[1].pop();
        assert!(model.validate().unwrap_err().contains("row 1"));
    }
}
