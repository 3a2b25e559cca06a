//! Prediction results and the class-index label mapping.

use serde::{Deserialize, Serialize};

use super::obesity::{ClassProfile, ObesityClass, UnknownClass};

/// Errors building a label mapping from the bundle's class list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("Expected {expected} class labels, got {got}")]
    WrongCount { expected: usize, got: usize },

    #[error(transparent)]
    Unknown(#[from] UnknownClass),

    #[error("Class {0} appears more than once")]
    Duplicate(ObesityClass),
}

/// Maps the classifier's class index to an obesity class.
///
/// Covers all seven classes exactly once; the order is the encoder order used
/// at training time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMapping {
    classes: Vec<ObesityClass>,
}

impl LabelMapping {
    /// Build a mapping from class names in index order.
    ///
    /// # Errors
    /// Returns `LabelError` unless `names` lists each of the seven classes once.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, LabelError> {
        if names.len() != ObesityClass::ALL.len() {
            return Err(LabelError::WrongCount {
                expected: ObesityClass::ALL.len(),
                got: names.len(),
            });
        }
        let mut classes = Vec::with_capacity(names.len());
        for name in names {
            let class: ObesityClass = name.as_ref().parse()?;
            if classes.contains(&class) {
                return Err(LabelError::Duplicate(class));
            }
            classes.push(class);
        }
        Ok(Self { classes })
    }

    #[must_use]
    pub fn class_at(&self, index: usize) -> Option<ObesityClass> {
        self.classes.get(index).copied()
    }

    #[must_use]
    pub fn index_of(&self, class: ObesityClass) -> Option<usize> {
        self.classes.iter().position(|c| *c == class)
    }

    #[must_use]
    pub fn classes(&self) -> &[ObesityClass] {
        &self.classes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Probability assigned to one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub class: ObesityClass,
    pub probability: f64,
}

/// Outcome of one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub class: ObesityClass,

    /// Probability of the predicted class (0.0 to 1.0)
    pub confidence: f64,

    /// Distribution over all seven classes, in label-mapping order
    pub probabilities: Vec<ClassProbability>,

    pub bmi: f64,

    pub health_score: u8,
}

impl PredictionResult {
    #[must_use]
    pub fn profile(&self) -> &'static ClassProfile {
        self.class.profile()
    }

    #[must_use]
    pub fn probability_of(&self, class: ObesityClass) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|p| p.class == class)
            .map(|p| p.probability)
    }

    /// Class the BMI alone points to, for comparison with the prediction.
    #[must_use]
    pub fn bmi_reference_class(&self) -> ObesityClass {
        ObesityClass::from_bmi(self.bmi)
    }

    /// Probabilities sorted from most to least likely.
    #[must_use]
    pub fn ranked(&self) -> Vec<ClassProbability> {
        let mut ranked = self.probabilities.clone();
        ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_names() -> Vec<&'static str> {
        ObesityClass::ALL.iter().map(|c| c.as_str()).collect()
    }

    #[test]
    fn test_mapping_round_trip() {
        let mapping = LabelMapping::from_names(&canonical_names()).expect("valid mapping");
        for (i, class) in ObesityClass::ALL.iter().enumerate() {
            assert_eq!(mapping.class_at(i), Some(*class));
            assert_eq!(mapping.index_of(*class), Some(i));
        }
        assert_eq!(mapping.class_at(7), None);
    }

    #[test]
    fn test_mapping_keeps_bundle_order() {
        let mut names = canonical_names();
        names.reverse();
        let mapping = LabelMapping::from_names(&names).expect("valid mapping");
        assert_eq!(mapping.class_at(0), Some(ObesityClass::ObesityTypeIII));
    }

    #[test]
    fn test_mapping_rejects_bad_lists() {
        let names = canonical_names();
        assert!(matches!(
            LabelMapping::from_names(&names[..6]),
            Err(LabelError::WrongCount { expected: 7, got: 6 })
        ));

        let mut duplicated = names.clone();
        duplicated[6] = "Normal_Weight";
        assert_eq!(
            LabelMapping::from_names(&duplicated),
            Err(LabelError::Duplicate(ObesityClass::NormalWeight))
        );

        let mut unknown = names;
        unknown[0] = "Underweight";
        assert!(matches!(
            LabelMapping::from_names(&unknown),
            Err(LabelError::Unknown(_))
        ));
    }

    fn prob(class: ObesityClass, probability: f64) -> ClassProbability {
        ClassProbability { class, probability }
    }

    #[test]
    fn test_ranked_orders_by_probability() {
        let result = PredictionResult {
            class: ObesityClass::NormalWeight,
            confidence: 0.6,
            probabilities: vec![
                prob(ObesityClass::InsufficientWeight, 0.1),
                prob(ObesityClass::NormalWeight, 0.6),
                prob(ObesityClass::OverweightLevelI, 0.3),
            ],
            bmi: 22.0,
            health_score: 90,
        };
        let ranked = result.ranked();
        assert_eq!(ranked[0].class, ObesityClass::NormalWeight);
        assert_eq!(ranked[2].class, ObesityClass::InsufficientWeight);
        assert_eq!(result.probability_of(ObesityClass::OverweightLevelI), Some(0.3));
        assert_eq!(result.bmi_reference_class(), ObesityClass::NormalWeight);
    }
}
