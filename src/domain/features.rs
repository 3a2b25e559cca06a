//! Feature schema and schema-aligned feature vectors.
//!
//! The schema is the ordered list of feature names the classifier was trained
//! on. A [`FeatureVector`] always holds exactly those names, in that order.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::derived::DerivedAttributes;
use super::encoding::{columns, EncodedColumns};
use super::input::RawInput;

/// Errors raised when a vector does not line up with its schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("Feature schema is empty")]
    EmptySchema,

    #[error("Duplicate feature in schema: {0}")]
    DuplicateFeature(String),

    #[error("Vector has {got} features, schema declares {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Feature #{position} is {found:?}, schema declares {expected:?}")]
    OrderMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Feature {0} is not a finite number")]
    NonFinite(String),
}

/// Ordered, duplicate-free list of feature names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema.
    ///
    /// # Errors
    /// Returns error if `names` is empty or contains duplicates.
    pub fn new(names: Vec<String>) -> Result<Self, FeatureError> {
        if names.is_empty() {
            return Err(FeatureError::EmptySchema);
        }
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(FeatureError::DuplicateFeature(name.clone()));
            }
        }
        Ok(Self { names, index })
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// The scaled columns present in this schema, in scaler order.
    #[must_use]
    pub fn numeric_features(&self) -> Vec<&'static str> {
        columns::NUMERIC_FEATURES
            .iter()
            .copied()
            .filter(|name| self.contains(name))
            .collect()
    }
}

/// Schema-aligned feature values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Overwrite the value at `position`. Callers keep positions in range.
    pub(crate) fn set_at(&mut self, position: usize, value: f64) {
        self.values[position] = value;
    }

    /// Verify that the vector matches `schema` exactly and holds no NaN/inf.
    ///
    /// # Errors
    /// Returns the first mismatch found.
    pub fn check_against(&self, schema: &FeatureSchema) -> Result<(), FeatureError> {
        if self.names.len() != schema.len() || self.values.len() != schema.len() {
            return Err(FeatureError::LengthMismatch {
                expected: schema.len(),
                got: self.values.len(),
            });
        }
        for (position, (found, expected)) in self.names.iter().zip(schema.names()).enumerate() {
            if found != expected {
                return Err(FeatureError::OrderMismatch {
                    position,
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }
        if let Some((name, _)) = self.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FeatureError::NonFinite(name.to_string()));
        }
        Ok(())
    }
}

/// Raw numeric fields keyed by feature name.
pub type NumericColumns = BTreeMap<&'static str, f64>;

/// Numeric fields of `input` under their feature names.
#[must_use]
pub fn raw_numeric_columns(input: &RawInput) -> NumericColumns {
    BTreeMap::from([
        (columns::AGE, f64::from(input.age)),
        (columns::HEIGHT, input.height),
        (columns::WEIGHT, input.weight),
        (columns::VEGETABLE_FREQUENCY, input.vegetable_frequency),
        (columns::MEAL_COUNT, input.meal_count),
        (columns::WATER_INTAKE, input.water_intake),
        (columns::ACTIVITY_FREQUENCY, input.activity_frequency),
        (columns::SCREEN_TIME, input.screen_time),
    ])
}

/// Counters describing how a vector was aligned to its schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Schema features with no computed value, set to 0
    pub zero_filled: usize,
    /// Computed columns the schema does not declare
    pub dropped: usize,
}

/// Merge numeric, derived and encoded columns into a schema-aligned vector.
///
/// Schema features with no computed value are set to 0; computed columns the
/// schema does not declare are dropped.
///
/// # Errors
/// Returns `FeatureError` if the result does not match the schema.
pub fn assemble(
    derived: &DerivedAttributes,
    encoded: &EncodedColumns,
    raw_numeric: &NumericColumns,
    schema: &FeatureSchema,
) -> Result<(FeatureVector, AssemblyStats), FeatureError> {
    let mut available: HashMap<&str, f64> =
        HashMap::with_capacity(raw_numeric.len() + encoded.len() + 1);
    available.extend(raw_numeric.iter().map(|(name, v)| (*name, *v)));
    available.insert(columns::BMI, derived.bmi);
    available.extend(encoded.iter().map(|(name, v)| (name.as_str(), *v)));

    let mut stats = AssemblyStats::default();
    let mut values = Vec::with_capacity(schema.len());
    for name in schema.names() {
        match available.get(name.as_str()) {
            Some(v) => values.push(*v),
            None => {
                stats.zero_filled += 1;
                values.push(0.0);
            }
        }
    }
    stats.dropped = available.keys().filter(|name| !schema.contains(name)).count();

    let vector = FeatureVector {
        names: schema.names().to_vec(),
        values,
    };
    vector.check_against(schema)?;
    Ok((vector, stats))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::derived::AgeBracket;
    use crate::domain::encoding::{encode, ONE_HOT_GROUPS};
    use crate::domain::input::tests::sample_input;
    use crate::domain::input::{Frequency, Gender, TransportMode, YesNo};

    /// Schema of the bundle shipped under `models/`.
    pub(crate) fn demo_schema() -> FeatureSchema {
        let names: Vec<String> =
            serde_json::from_str(include_str!("../../models/feature_names.json"))
                .expect("demo schema parses");
        FeatureSchema::new(names).expect("demo schema is valid")
    }

    fn assemble_input(input: &RawInput, schema: &FeatureSchema) -> FeatureVector {
        let derived = DerivedAttributes::from_input(input);
        let encoded = encode(input, derived.age_bracket);
        assemble(&derived, &encoded, &raw_numeric_columns(input), schema)
            .expect("assembly succeeds")
            .0
    }

    #[test]
    fn test_schema_rejects_duplicates_and_empty() {
        assert_eq!(FeatureSchema::new(vec![]), Err(FeatureError::EmptySchema));
        let err = FeatureSchema::new(vec!["a".into(), "b".into(), "a".into()]).unwrap_err();
        assert_eq!(err, FeatureError::DuplicateFeature("a".into()));
    }

    #[test]
    fn test_numeric_features_intersect_schema() {
        let schema = FeatureSchema::new(vec!["BMI".into(), "Gender_encoded".into(), "Age".into()])
            .expect("valid");
        assert_eq!(schema.numeric_features(), vec!["Age", "BMI"]);
    }

    #[test]
    fn test_assembly_matches_schema_order() {
        let schema = demo_schema();
        let vector = assemble_input(&sample_input(), &schema);
        assert_eq!(vector.len(), schema.len());
        assert_eq!(vector.names(), schema.names());
        assert_eq!(vector.get("Age"), Some(25.0));
        assert!((vector.get("BMI").unwrap() - 24.22).abs() < 0.01);
        assert_eq!(vector.get("MTRANS_Walking"), Some(1.0));
        // Age 25 falls in the Adult reference bracket.
        assert_eq!(vector.get("Age_Group_YoungAdult"), Some(0.0));
        assert_eq!(vector.get("Age_Group_Adult"), None);
        assert!(vector.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_fill_and_drop() {
        let schema = FeatureSchema::new(vec![
            "BMI".into(),
            "engineered_feature".into(),
            "SMOKE_encoded".into(),
        ])
        .expect("valid");
        let input = sample_input();
        let derived = DerivedAttributes::from_input(&input);
        let encoded = encode(&input, derived.age_bracket);
        let (vector, stats) =
            assemble(&derived, &encoded, &raw_numeric_columns(&input), &schema).expect("ok");

        assert_eq!(vector.get("engineered_feature"), Some(0.0));
        assert_eq!(vector.get("Age"), None);
        assert_eq!(stats.zero_filled, 1);
        // Everything except BMI and SMOKE_encoded is dropped.
        let computed = raw_numeric_columns(&input).len() + 1 + encoded.len();
        assert_eq!(stats.dropped, computed - 2);
    }

    #[test]
    fn test_schema_completeness_for_every_category_combination() {
        let schema = demo_schema();
        let yes_no = [YesNo::Yes, YesNo::No];
        for gender in Gender::ALL {
            for flag in yes_no {
                for snack in Frequency::ALL {
                    for alcohol in Frequency::ALL {
                        for transport in TransportMode::ALL {
                            for age in [15, 20, 30, 40, 60] {
                                let input = RawInput {
                                    age,
                                    gender: *gender,
                                    family_history_overweight: flag,
                                    high_calorie_food: flag,
                                    calorie_monitoring: flag,
                                    smoker: flag,
                                    snack_frequency: *snack,
                                    alcohol_frequency: *alcohol,
                                    transport_mode: *transport,
                                    ..sample_input()
                                };
                                let vector = assemble_input(&input, &schema);
                                assert_eq!(vector.len(), schema.len());
                                assert!(vector.check_against(&schema).is_ok());
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_reference_categories_leave_group_at_zero() {
        let schema = demo_schema();
        let input = RawInput {
            age: 30,
            snack_frequency: Frequency::Always,
            alcohol_frequency: Frequency::Always,
            transport_mode: TransportMode::Automobile,
            ..sample_input()
        };
        assert_eq!(AgeBracket::from_age(30), AgeBracket::Adult);
        let vector = assemble_input(&input, &schema);
        for group in ONE_HOT_GROUPS {
            let prefix = format!("{}_", group.prefix);
            let set: f64 = vector
                .iter()
                .filter(|(name, _)| name.starts_with(&prefix))
                .map(|(_, v)| v)
                .sum();
            assert_eq!(set, 0.0, "{}", group.prefix);
        }
    }

    #[test]
    fn test_check_against_detects_mismatch() {
        let schema = FeatureSchema::new(vec!["a".into(), "b".into()]).expect("valid");
        let other = FeatureSchema::new(vec!["b".into(), "a".into()]).expect("valid");
        let vector = FeatureVector {
            names: vec!["a".into(), "b".into()],
            values: vec![1.0, 2.0],
        };
        assert!(vector.check_against(&schema).is_ok());
        assert!(matches!(
            vector.check_against(&other),
            Err(FeatureError::OrderMismatch { position: 0, .. })
        ));

        let short = FeatureSchema::new(vec!["a".into()]).expect("valid");
        assert!(matches!(
            vector.check_against(&short),
            Err(FeatureError::LengthMismatch { expected: 1, got: 2 })
        ));

        let nan = FeatureVector {
            names: vec!["a".into(), "b".into()],
            values: vec![1.0, f64::NAN],
        };
        assert_eq!(
            nan.check_against(&schema),
            Err(FeatureError::NonFinite("b".into()))
        );
    }
}
