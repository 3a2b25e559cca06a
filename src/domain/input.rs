//! Raw screening input as submitted by the user.
//!
//! Field domains follow the ObesityDataSet survey (UCI, Palechor & de la Hoz
//! Manotas). Categorical values are closed enumerations whose wire form is the
//! exact dataset literal; parsing is case-sensitive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::WeightwiseError;

/// Error returned when a categorical literal is not part of its enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: unrecognized value {value:?} (expected one of {expected})")]
pub struct UnknownCategory {
    pub field: &'static str,
    pub value: String,
    pub expected: String,
}

impl UnknownCategory {
    fn new(field: &'static str, value: &str, allowed: &[&str]) -> Self {
        Self {
            field,
            value: value.to_string(),
            expected: allowed.join(", "),
        }
    }
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $lit:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $lit)] $variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Dataset literal for this value.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $lit),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownCategory;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($lit => Ok($name::$variant),)+
                    other => Err(UnknownCategory::new($field, other, &[$($lit),+])),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// Biological sex as recorded by the survey.
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
    }
}

closed_enum! {
    /// Binary survey answer.
    YesNo, "yes/no field" {
        Yes => "yes",
        No => "no",
    }
}

closed_enum! {
    /// Frequency scale used for snacking (CAEC) and alcohol (CALC).
    Frequency, "frequency field" {
        No => "no",
        Sometimes => "Sometimes",
        Frequently => "Frequently",
        Always => "Always",
    }
}

closed_enum! {
    /// Main means of transport (MTRANS).
    TransportMode, "transport_mode" {
        PublicTransportation => "Public_Transportation",
        Automobile => "Automobile",
        Walking => "Walking",
        Motorbike => "Motorbike",
        Bike => "Bike",
    }
}

impl YesNo {
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

/// One screening request.
///
/// Serde aliases accept the survey column codes (`FAVC`, `CH2O`, ...) so that
/// rows exported from the original dataset can be submitted unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    /// Age in whole years (10-100)
    #[serde(alias = "Age")]
    pub age: u32,

    #[serde(alias = "Gender")]
    pub gender: Gender,

    /// Height in meters (1.0-2.5)
    #[serde(alias = "Height")]
    pub height: f64,

    /// Weight in kilograms (30-200)
    #[serde(alias = "Weight")]
    pub weight: f64,

    #[serde(alias = "family_history_with_overweight")]
    pub family_history_overweight: YesNo,

    /// Frequent consumption of high-calorie food (FAVC)
    #[serde(alias = "FAVC")]
    pub high_calorie_food: YesNo,

    /// Vegetables in meals, 1 = never .. 3 = always (FCVC)
    #[serde(alias = "FCVC")]
    pub vegetable_frequency: f64,

    /// Main meals per day, 1-4 (NCP)
    #[serde(alias = "NCP")]
    pub meal_count: f64,

    /// Eating between meals (CAEC)
    #[serde(alias = "CAEC")]
    pub snack_frequency: Frequency,

    #[serde(alias = "SMOKE")]
    pub smoker: YesNo,

    /// Daily water, 1 = <1L .. 3 = >2L (CH2O)
    #[serde(alias = "CH2O")]
    pub water_intake: f64,

    /// Monitors calorie intake (SCC)
    #[serde(alias = "SCC")]
    pub calorie_monitoring: YesNo,

    /// Physical activity, 0 = none .. 3 = 4-5 days a week (FAF)
    #[serde(alias = "FAF")]
    pub activity_frequency: f64,

    /// Screen time, 0 = 0-2h .. 2 = >5h (TUE)
    #[serde(alias = "TUE")]
    pub screen_time: f64,

    #[serde(alias = "CALC")]
    pub alcohol_frequency: Frequency,

    #[serde(alias = "MTRANS")]
    pub transport_mode: TransportMode,
}

/// Inclusive bounds for the numeric fields.
pub mod bounds {
    pub const AGE: (u32, u32) = (10, 100);
    pub const HEIGHT: (f64, f64) = (1.0, 2.5);
    pub const WEIGHT: (f64, f64) = (30.0, 200.0);
    pub const VEGETABLE_FREQUENCY: (f64, f64) = (1.0, 3.0);
    pub const MEAL_COUNT: (f64, f64) = (1.0, 4.0);
    pub const WATER_INTAKE: (f64, f64) = (1.0, 3.0);
    pub const ACTIVITY_FREQUENCY: (f64, f64) = (0.0, 3.0);
    pub const SCREEN_TIME: (f64, f64) = (0.0, 2.0);
}

fn check_range(errors: &mut Vec<String>, name: &str, value: f64, (lo, hi): (f64, f64)) {
    // NaN fails `contains`, so non-finite values are rejected here too.
    if !(lo..=hi).contains(&value) {
        errors.push(format!("{name} {value} out of range [{lo}, {hi}]"));
    }
}

impl RawInput {
    /// Parse a request from JSON.
    ///
    /// Unknown categorical literals and malformed numbers are reported as
    /// invalid input, not as a serialization failure.
    ///
    /// # Errors
    /// Returns `WeightwiseError::InvalidInput` if the document does not
    /// describe a valid request.
    pub fn from_json(json: &str) -> Result<Self, WeightwiseError> {
        let input: Self = serde_json::from_str(json)
            .map_err(|e| WeightwiseError::InvalidInput(e.to_string()))?;
        input.ensure_valid()?;
        Ok(input)
    }

    /// [`validate`](Self::validate) folded into the crate error.
    ///
    /// # Errors
    /// Returns `WeightwiseError::InvalidInput` listing every violation.
    pub fn ensure_valid(&self) -> Result<(), WeightwiseError> {
        self.validate()
            .map_err(|errors| WeightwiseError::InvalidInput(errors.join("; ")))
    }

    /// Validate that every numeric field lies within its declared bound.
    ///
    /// Categorical fields are already closed by their types.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let (age_lo, age_hi) = bounds::AGE;
        if !(age_lo..=age_hi).contains(&self.age) {
            errors.push(format!("Age {} out of range [{age_lo}, {age_hi}]", self.age));
        }
        check_range(&mut errors, "Height", self.height, bounds::HEIGHT);
        check_range(&mut errors, "Weight", self.weight, bounds::WEIGHT);
        check_range(
            &mut errors,
            "Vegetable frequency",
            self.vegetable_frequency,
            bounds::VEGETABLE_FREQUENCY,
        );
        check_range(&mut errors, "Meal count", self.meal_count, bounds::MEAL_COUNT);
        check_range(&mut errors, "Water intake", self.water_intake, bounds::WATER_INTAKE);
        check_range(
            &mut errors,
            "Activity frequency",
            self.activity_frequency,
            bounds::ACTIVITY_FREQUENCY,
        );
        check_range(&mut errors, "Screen time", self.screen_time, bounds::SCREEN_TIME);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
