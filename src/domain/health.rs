//! Rule-based health scoring and lifestyle summary.
//!
//! Independent of the classifier: everything here is a pure function of the
//! raw input and its BMI.

use serde::{Deserialize, Serialize};

use super::derived::{AgeBracket, BmiZone, DerivedAttributes};
use super::input::RawInput;

/// BMI used as the ideal-weight target.
pub const IDEAL_BMI: f64 = 22.5;

/// Score deduction rules, applied independently.
///
/// The BMI rules are exclusive of each other: the overweight deduction only
/// applies when the out-of-range deduction did not.
const OUT_OF_RANGE_BMI: u8 = 30;
const OVERWEIGHT_BMI: u8 = 15;
const LOW_ACTIVITY: u8 = 15;
const LOW_VEGETABLES: u8 = 10;
const LOW_WATER: u8 = 10;
const HIGH_CALORIE_FOOD: u8 = 10;
const SMOKER: u8 = 15;
const HIGH_SCREEN_TIME: u8 = 5;

/// Compute the 0-100 health score.
#[must_use]
pub fn health_score(input: &RawInput, bmi: f64) -> u8 {
    let mut deductions: u32 = 0;

    if bmi < 18.5 || bmi > 30.0 {
        deductions += u32::from(OUT_OF_RANGE_BMI);
    } else if bmi > 25.0 {
        deductions += u32::from(OVERWEIGHT_BMI);
    }

    if input.activity_frequency < 1.0 {
        deductions += u32::from(LOW_ACTIVITY);
    }
    if input.vegetable_frequency < 2.0 {
        deductions += u32::from(LOW_VEGETABLES);
    }
    if input.water_intake < 2.0 {
        deductions += u32::from(LOW_WATER);
    }
    if input.high_calorie_food.is_yes() {
        deductions += u32::from(HIGH_CALORIE_FOOD);
    }
    if input.smoker.is_yes() {
        deductions += u32::from(SMOKER);
    }
    if input.screen_time > 1.5 {
        deductions += u32::from(HIGH_SCREEN_TIME);
    }

    100u32.saturating_sub(deductions) as u8
}

/// Banded reading of the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthVerdict {
    Excellent,
    Good,
    NeedsAttention,
}

impl HealthVerdict {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Self::Excellent
        } else if score >= 60 {
            Self::Good
        } else {
            Self::NeedsAttention
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent - your health indicators look very good",
            Self::Good => "Good - there is room for improvement",
            Self::NeedsAttention => "Needs attention - several habits put your health at risk",
        }
    }
}

/// Direction suggested by the gap to the ideal weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightAdvice {
    Lose,
    Gain,
    Maintain,
}

/// Five 0-100 lifestyle indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifestyleProfile {
    pub physical_activity: f64,
    pub vegetables: f64,
    pub hydration: f64,
    pub calorie_control: f64,
    pub smoke_free: f64,
}

impl LifestyleProfile {
    #[must_use]
    pub fn from_input(input: &RawInput) -> Self {
        let percent_of_three = |v: f64| v / 3.0 * 100.0;
        let all_or_nothing = |set: bool| if set { 100.0 } else { 0.0 };
        Self {
            physical_activity: percent_of_three(input.activity_frequency),
            vegetables: percent_of_three(input.vegetable_frequency),
            hydration: percent_of_three(input.water_intake),
            calorie_control: all_or_nothing(input.calorie_monitoring.is_yes()),
            smoke_free: all_or_nothing(!input.smoker.is_yes()),
        }
    }
}

/// Everything derived from the raw input without the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub bmi: f64,
    pub bmi_zone: BmiZone,
    pub age_bracket: AgeBracket,
    pub health_score: u8,
    pub verdict: HealthVerdict,
    /// Weight at BMI 22.5 for this height (kg)
    pub ideal_weight: f64,
    /// Current weight minus ideal weight (kg)
    pub weight_difference: f64,
    pub weight_advice: WeightAdvice,
    pub active_days_per_week: f64,
    pub lifestyle: LifestyleProfile,
}

impl HealthAssessment {
    #[must_use]
    pub fn new(input: &RawInput, derived: &DerivedAttributes) -> Self {
        let health_score = health_score(input, derived.bmi);
        let ideal_weight = IDEAL_BMI * input.height * input.height;
        let weight_difference = input.weight - ideal_weight;
        let weight_advice = if weight_difference > 0.0 {
            WeightAdvice::Lose
        } else if weight_difference < -5.0 {
            WeightAdvice::Gain
        } else {
            WeightAdvice::Maintain
        };

        Self {
            bmi: derived.bmi,
            bmi_zone: derived.bmi_zone(),
            age_bracket: derived.age_bracket,
            health_score,
            verdict: HealthVerdict::from_score(health_score),
            ideal_weight,
            weight_difference,
            weight_advice,
            active_days_per_week: input.activity_frequency * 7.0 / 3.0,
            lifestyle: LifestyleProfile::from_input(input),
        }
    }
}
