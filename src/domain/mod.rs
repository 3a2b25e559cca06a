//! Domain layer: Core screening types and rules.
//!
//! Pure Rust with no I/O. Everything here is a deterministic function of the
//! request and the schema it is given.

mod derived;
pub mod encoding;
mod features;
mod health;
mod input;
mod obesity;
mod prediction;

pub use derived::{compute_bmi, AgeBracket, BmiZone, DerivedAttributes};
pub use encoding::{encode, EncodedColumns, OneHotGroup, ONE_HOT_GROUPS};
pub use features::{
    assemble, raw_numeric_columns, AssemblyStats, FeatureError, FeatureSchema, FeatureVector,
    NumericColumns,
};
pub use health::{
    health_score, HealthAssessment, HealthVerdict, LifestyleProfile, WeightAdvice, IDEAL_BMI,
};
pub use input::{bounds, Frequency, Gender, RawInput, TransportMode, UnknownCategory, YesNo};
pub use obesity::{ClassProfile, ObesityClass, UnknownClass};
pub use prediction::{ClassProbability, LabelError, LabelMapping, PredictionResult};

#[cfg(test)]
pub(crate) mod fixtures {
    pub(crate) use super::features::tests::demo_schema;
    pub(crate) use super::input::tests::sample_input;
}
