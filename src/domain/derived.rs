//! Attributes computed from the raw input: BMI and age bracket.

use serde::{Deserialize, Serialize};

use super::input::RawInput;

/// Body Mass Index, `weight / height²`.
///
/// Returns 0 for a non-positive height instead of dividing by zero.
#[must_use]
pub fn compute_bmi(weight: f64, height: f64) -> f64 {
    if height > 0.0 {
        weight / (height * height)
    } else {
        0.0
    }
}

/// Ordinal age bucket used as a one-hot feature.
///
/// Upper bounds are exclusive: `[..18) [18..25) [25..35) [35..50) [50..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBracket {
    Teen,
    YoungAdult,
    Adult,
    MiddleAge,
    Senior,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 5] = [
        Self::Teen,
        Self::YoungAdult,
        Self::Adult,
        Self::MiddleAge,
        Self::Senior,
    ];

    #[must_use]
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=17 => Self::Teen,
            18..=24 => Self::YoungAdult,
            25..=34 => Self::Adult,
            35..=49 => Self::MiddleAge,
            _ => Self::Senior,
        }
    }

    /// Label used in the `Age_Group_<label>` feature columns.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teen => "Teen",
            Self::YoungAdult => "YoungAdult",
            Self::Adult => "Adult",
            Self::MiddleAge => "MiddleAge",
            Self::Senior => "Senior",
        }
    }
}

impl std::fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse BMI bands used by the gauge display (18.5 / 25 / 30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiZone {
    Underweight,
    Healthy,
    Overweight,
    Obese,
}

impl BmiZone {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Healthy
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

/// Values derived from a validated request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedAttributes {
    pub bmi: f64,
    pub age_bracket: AgeBracket,
}

impl DerivedAttributes {
    #[must_use]
    pub fn from_input(input: &RawInput) -> Self {
        Self {
            bmi: compute_bmi(input.weight, input.height),
            age_bracket: AgeBracket::from_age(input.age),
        }
    }

    #[must_use]
    pub fn bmi_zone(&self) -> BmiZone {
        BmiZone::from_bmi(self.bmi)
    }
}
