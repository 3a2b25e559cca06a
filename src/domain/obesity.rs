//! Obesity categories predicted by the classifier and their reference content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The seven dataset classes, ordered by increasing BMI range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObesityClass {
    #[serde(rename = "Insufficient_Weight")]
    InsufficientWeight,
    #[serde(rename = "Normal_Weight")]
    NormalWeight,
    #[serde(rename = "Overweight_Level_I")]
    OverweightLevelI,
    #[serde(rename = "Overweight_Level_II")]
    OverweightLevelII,
    #[serde(rename = "Obesity_Type_I")]
    ObesityTypeI,
    #[serde(rename = "Obesity_Type_II")]
    ObesityTypeII,
    #[serde(rename = "Obesity_Type_III")]
    ObesityTypeIII,
}

/// Static reference content shown next to a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassProfile {
    pub display_name: &'static str,
    pub description: &'static str,
    pub bmi_range: &'static str,
    pub health_risks: &'static [&'static str],
    pub recommendations: &'static [&'static str],
    /// Hex color used by displays
    pub color: &'static str,
    pub icon: &'static str,
}

const INSUFFICIENT_WEIGHT: ClassProfile = ClassProfile {
    display_name: "Insufficient Weight",
    description: "Below the healthy weight range",
    bmi_range: "BMI < 18.5",
    health_risks: &[
        "Weakened immune system",
        "Nutrient deficiencies",
        "Osteoporosis",
        "Fertility problems",
    ],
    recommendations: &[
        "Work with a dietitian on a plan for healthy weight gain",
        "Increase calorie intake with nutrient-dense foods",
        "Add strength training to build muscle mass",
        "Track weight regularly",
    ],
    color: "#3498db",
    icon: "📉",
};

const NORMAL_WEIGHT: ClassProfile = ClassProfile {
    display_name: "Normal Weight",
    description: "Healthy weight, the best condition for long-term health",
    bmi_range: "BMI 18.5 - 24.9",
    health_risks: &["Minimal risk of weight-related disease"],
    recommendations: &[
        "Keep a balanced and varied diet",
        "Exercise at least 150 minutes per week",
        "Drink around 8 glasses of water per day",
        "Sleep 7-8 hours per night",
    ],
    color: "#27ae60",
    icon: "✅",
};

const OVERWEIGHT_LEVEL_I: ClassProfile = ClassProfile {
    display_name: "Overweight Level I",
    description: "Mild excess weight, the first stage of increased health risk",
    bmi_range: "BMI 25.0 - 27.4",
    health_risks: &[
        "Increased risk of type 2 diabetes",
        "High blood pressure",
        "High cholesterol",
        "Mild sleep apnea",
    ],
    recommendations: &[
        "Aim to lose 5-10% of body weight within 6 months",
        "Reduce portions and choose lower-calorie foods",
        "Increase physical activity to 250 minutes per week",
        "Log daily food intake to control calories",
    ],
    color: "#f39c12",
    icon: "⚠️",
};

const OVERWEIGHT_LEVEL_II: ClassProfile = ClassProfile {
    display_name: "Overweight Level II",
    description: "Moderate excess weight with significant health risk",
    bmi_range: "BMI 27.5 - 29.9",
    health_risks: &[
        "High risk of type 2 diabetes",
        "Coronary heart disease",
        "Stroke",
        "Osteoarthritis",
    ],
    recommendations: &[
        "Follow a structured weight-loss program targeting 10-15%",
        "Combine cardio and strength training 5 times per week",
        "Keep a daily deficit of 500-750 calories",
        "See a doctor regularly for monitoring",
    ],
    color: "#e67e22",
    icon: "⚠️",
};

const OBESITY_TYPE_I: ClassProfile = ClassProfile {
    display_name: "Obesity Type I",
    description: "Class I obesity, a serious condition that needs intervention",
    bmi_range: "BMI 30.0 - 34.9",
    health_risks: &[
        "Type 2 diabetes",
        "Heart disease",
        "Hypertension",
        "Sleep apnea",
        "Some types of cancer",
    ],
    recommendations: &[
        "Get a full medical evaluation soon",
        "Discuss medical therapy where appropriate",
        "Follow a supervised diet program",
        "Increase activity gradually with professional guidance",
    ],
    color: "#e74c3c",
    icon: "🚨",
};

const OBESITY_TYPE_II: ClassProfile = ClassProfile {
    display_name: "Obesity Type II",
    description: "Class II obesity with very high health risk",
    bmi_range: "BMI 35.0 - 39.9",
    health_risks: &[
        "Very high risk of metabolic disease",
        "Heart failure",
        "Fatty liver disease",
        "Serious joint problems",
        "Depression",
    ],
    recommendations: &[
        "Intensive medical care with a multidisciplinary team",
        "Evaluation for pharmacological obesity treatment",
        "Comprehensive rehabilitation program",
        "Psychological support for behavior change",
    ],
    color: "#c0392b",
    icon: "🚨",
};

const OBESITY_TYPE_III: ClassProfile = ClassProfile {
    display_name: "Obesity Type III",
    description: "Class III (morbid) obesity, a life-threatening condition",
    bmi_range: "BMI ≥ 40",
    health_risks: &[
        "Significantly reduced life expectancy",
        "Multiple organ failure",
        "Severely limited mobility",
        "High surgical complication risk",
        "Very low quality of life",
    ],
    recommendations: &[
        "Seek emergency care for acute complications",
        "Evaluation for bariatric surgery",
        "Close supervision by a specialist team",
        "Long-term rehabilitation program",
    ],
    color: "#8e44ad",
    icon: "🆘",
};

impl ObesityClass {
    pub const ALL: [ObesityClass; 7] = [
        Self::InsufficientWeight,
        Self::NormalWeight,
        Self::OverweightLevelI,
        Self::OverweightLevelII,
        Self::ObesityTypeI,
        Self::ObesityTypeII,
        Self::ObesityTypeIII,
    ];

    /// Canonical dataset label, e.g. `Overweight_Level_I`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientWeight => "Insufficient_Weight",
            Self::NormalWeight => "Normal_Weight",
            Self::OverweightLevelI => "Overweight_Level_I",
            Self::OverweightLevelII => "Overweight_Level_II",
            Self::ObesityTypeI => "Obesity_Type_I",
            Self::ObesityTypeII => "Obesity_Type_II",
            Self::ObesityTypeIII => "Obesity_Type_III",
        }
    }

    #[must_use]
    pub fn profile(&self) -> &'static ClassProfile {
        match self {
            Self::InsufficientWeight => &INSUFFICIENT_WEIGHT,
            Self::NormalWeight => &NORMAL_WEIGHT,
            Self::OverweightLevelI => &OVERWEIGHT_LEVEL_I,
            Self::OverweightLevelII => &OVERWEIGHT_LEVEL_II,
            Self::ObesityTypeI => &OBESITY_TYPE_I,
            Self::ObesityTypeII => &OBESITY_TYPE_II,
            Self::ObesityTypeIII => &OBESITY_TYPE_III,
        }
    }

    /// Reference class for a BMI value, by the ranges in each profile.
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::InsufficientWeight
        } else if bmi < 25.0 {
            Self::NormalWeight
        } else if bmi < 27.5 {
            Self::OverweightLevelI
        } else if bmi < 30.0 {
            Self::OverweightLevelII
        } else if bmi < 35.0 {
            Self::ObesityTypeI
        } else if bmi < 40.0 {
            Self::ObesityTypeII
        } else {
            Self::ObesityTypeIII
        }
    }
}

impl fmt::Display for ObesityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().display_name)
    }
}

/// Label that is not one of the seven classes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown obesity class: {0:?}")]
pub struct UnknownClass(pub String);

impl FromStr for ObesityClass {
    type Err = UnknownClass;

    /// Accepts the canonical label or the display name with spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == s || class.profile().display_name == s)
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}
