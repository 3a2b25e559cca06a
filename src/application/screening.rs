//! Screening service: prediction plus the classifier-independent assessment.
//!
//! The health assessment and the prediction are separate failure domains. A
//! classifier or scaling failure is reported next to a still-valid
//! assessment; invalid input and schema mismatches abort the request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::preprocess::Preprocessor;
use crate::adapters::{FittedScaler, LinearClassifier, ModelBundle};
use crate::domain::{
    ClassProbability, DerivedAttributes, FeatureVector, HealthAssessment, LabelMapping,
    PredictionResult, RawInput,
};
use crate::ports::{Classifier, OracleError, Scaler};
use crate::Result;

/// Outcome of one screening request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningReport {
    pub generated_at: DateTime<Utc>,
    pub model_name: String,
    pub assessment: HealthAssessment,
    pub prediction: Option<PredictionResult>,
    /// Why `prediction` is missing, when it is
    pub prediction_error: Option<String>,
}

/// Runs screening requests against one loaded model.
///
/// Holds only immutable state, so one instance can be shared across threads
/// behind an `Arc`.
pub struct ScreeningService<C, S>
where
    C: Classifier,
    S: Scaler,
{
    preprocessor: Preprocessor<S>,
    classifier: Arc<C>,
    labels: LabelMapping,
    model_name: String,
}

impl ScreeningService<LinearClassifier, FittedScaler> {
    /// Build the service over a loaded bundle.
    #[must_use]
    pub fn from_bundle(bundle: ModelBundle) -> Self {
        let ModelBundle {
            schema,
            scaler,
            classifier,
            labels,
            metadata,
            ..
        } = bundle;
        Self::new(
            Preprocessor::new(schema, Arc::new(scaler)),
            Arc::new(classifier),
            labels,
            metadata.model_name,
        )
    }
}

impl<C, S> ScreeningService<C, S>
where
    C: Classifier,
    S: Scaler,
{
    pub fn new(
        preprocessor: Preprocessor<S>,
        classifier: Arc<C>,
        labels: LabelMapping,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            preprocessor,
            classifier,
            labels,
            model_name: model_name.into(),
        }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    #[must_use]
    pub fn preprocessor(&self) -> &Preprocessor<S> {
        &self.preprocessor
    }

    /// Health assessment only; never touches the model.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the request is out of domain.
    pub fn assess(&self, input: &RawInput) -> Result<HealthAssessment> {
        input.ensure_valid()?;
        Ok(HealthAssessment::new(
            input,
            &DerivedAttributes::from_input(input),
        ))
    }

    /// Classify one request.
    ///
    /// # Errors
    /// Returns `InvalidInput`, `SchemaMismatch`, `Normalization` or `Oracle`.
    pub fn predict(&self, input: &RawInput) -> Result<PredictionResult> {
        input.ensure_valid()?;
        let derived = DerivedAttributes::from_input(input);
        let assessment = HealthAssessment::new(input, &derived);
        let vector = self.preprocessor.assemble(input, &derived)?;
        self.classify(vector, &assessment)
    }

    /// Full screening: assessment always, prediction when the model succeeds.
    ///
    /// # Errors
    /// Returns `InvalidInput` or `SchemaMismatch`; model-side failures are
    /// recorded in [`ScreeningReport::prediction_error`].
    pub fn screen(&self, input: &RawInput) -> Result<ScreeningReport> {
        input.ensure_valid()?;
        let derived = DerivedAttributes::from_input(input);
        let assessment = HealthAssessment::new(input, &derived);
        let vector = self.preprocessor.assemble(input, &derived)?;

        let (prediction, prediction_error) = match self.classify(vector, &assessment) {
            Ok(prediction) => {
                tracing::info!(
                    "Screening complete: class={} confidence={:.3}",
                    prediction.class.as_str(),
                    prediction.confidence
                );
                (Some(prediction), None)
            }
            Err(e) => {
                tracing::warn!("Prediction failed, returning assessment only: {e}");
                (None, Some(e.to_string()))
            }
        };

        Ok(ScreeningReport {
            generated_at: Utc::now(),
            model_name: self.model_name.clone(),
            assessment,
            prediction,
            prediction_error,
        })
    }

    fn classify(
        &self,
        vector: FeatureVector,
        assessment: &HealthAssessment,
    ) -> Result<PredictionResult> {
        let vector = self.preprocessor.normalize(vector)?;
        let output = self.classifier.predict(&vector)?;
        output.validate(self.labels.len())?;

        let class = self
            .labels
            .class_at(output.class_index)
            .ok_or(OracleError::ClassIndexOutOfRange {
                index: output.class_index,
                classes: self.labels.len(),
            })?;
        let probabilities: Vec<ClassProbability> = self
            .labels
            .classes()
            .iter()
            .zip(&output.probabilities)
            .map(|(class, probability)| ClassProbability {
                class: *class,
                probability: *probability,
            })
            .collect();

        Ok(PredictionResult {
            class,
            confidence: output.probabilities[output.class_index],
            probabilities,
            bmi: assessment.bmi,
            health_score: assessment.health_score,
        })
    }
}
