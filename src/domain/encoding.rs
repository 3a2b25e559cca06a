//! Categorical encoding: binary flags and drop-first one-hot indicators.
//!
//! Column names follow the training-time naming of the ObesityDataSet
//! feature pipeline, which the model bundle's schema refers to.

use std::collections::BTreeMap;

use super::derived::AgeBracket;
use super::input::{Gender, RawInput};

/// Feature column names shared with the model bundle.
pub mod columns {
    pub const AGE: &str = "Age";
    pub const HEIGHT: &str = "Height";
    pub const WEIGHT: &str = "Weight";
    pub const BMI: &str = "BMI";
    pub const VEGETABLE_FREQUENCY: &str = "FCVC";
    pub const MEAL_COUNT: &str = "NCP";
    pub const WATER_INTAKE: &str = "CH2O";
    pub const ACTIVITY_FREQUENCY: &str = "FAF";
    pub const SCREEN_TIME: &str = "TUE";

    pub const GENDER_ENCODED: &str = "Gender_encoded";
    pub const HIGH_CALORIE_FOOD_ENCODED: &str = "FAVC_encoded";
    pub const CALORIE_MONITORING_ENCODED: &str = "SCC_encoded";
    pub const SMOKER_ENCODED: &str = "SMOKE_encoded";
    pub const FAMILY_HISTORY_ENCODED: &str = "family_history_with_overweight_encoded";

    /// Columns the fitted scaler operates on, in the order it was fitted.
    pub const NUMERIC_FEATURES: [&str; 9] = [
        AGE,
        HEIGHT,
        WEIGHT,
        BMI,
        VEGETABLE_FREQUENCY,
        MEAL_COUNT,
        WATER_INTAKE,
        ACTIVITY_FREQUENCY,
        SCREEN_TIME,
    ];
}

/// A categorical field encoded as drop-first dummies.
///
/// The reference value is the category the training-time encoder dropped
/// (the lexicographically first one). Rows holding it have every indicator
/// of the group at 0.
#[derive(Debug, Clone, Copy)]
pub struct OneHotGroup {
    pub prefix: &'static str,
    pub values: &'static [&'static str],
    pub reference: &'static str,
}

pub const ALCOHOL_GROUP: OneHotGroup = OneHotGroup {
    prefix: "CALC",
    values: &["no", "Sometimes", "Frequently", "Always"],
    reference: "Always",
};

pub const SNACK_GROUP: OneHotGroup = OneHotGroup {
    prefix: "CAEC",
    values: &["no", "Sometimes", "Frequently", "Always"],
    reference: "Always",
};

pub const TRANSPORT_GROUP: OneHotGroup = OneHotGroup {
    prefix: "MTRANS",
    values: &[
        "Public_Transportation",
        "Automobile",
        "Walking",
        "Motorbike",
        "Bike",
    ],
    reference: "Automobile",
};

pub const AGE_GROUP: OneHotGroup = OneHotGroup {
    prefix: "Age_Group",
    values: &["Teen", "YoungAdult", "Adult", "MiddleAge", "Senior"],
    reference: "Adult",
};

pub const ONE_HOT_GROUPS: [OneHotGroup; 4] =
    [ALCOHOL_GROUP, SNACK_GROUP, TRANSPORT_GROUP, AGE_GROUP];

impl OneHotGroup {
    #[must_use]
    pub fn column(&self, value: &str) -> String {
        format!("{}_{}", self.prefix, value)
    }

    /// Indicator columns for every non-reference value.
    pub fn indicator_columns(&self) -> impl Iterator<Item = String> + '_ {
        self.values
            .iter()
            .filter(move |v| **v != self.reference)
            .map(move |v| self.column(v))
    }

    fn encode_into(&self, value: &str, out: &mut EncodedColumns) {
        for candidate in self.values.iter().filter(|v| **v != self.reference) {
            out.insert(self.column(candidate), flag(*candidate == value));
        }
    }

    /// Report schema columns under this group's prefix that can never be set:
    /// the reference column, or values the group does not know.
    #[must_use]
    pub fn audit(&self, schema: &[String]) -> Vec<String> {
        let prefix = format!("{}_", self.prefix);
        schema
            .iter()
            .filter_map(|name| name.strip_prefix(&prefix).map(|value| (name, value)))
            .filter_map(|(name, value)| {
                if value == self.reference {
                    Some(format!(
                        "schema column {name} is the dropped reference of {} and will always be 0",
                        self.prefix
                    ))
                } else if !self.values.contains(&value) {
                    Some(format!(
                        "schema column {name} names an unknown {} value and will always be 0",
                        self.prefix
                    ))
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Encoded categorical columns keyed by feature name.
pub type EncodedColumns = BTreeMap<String, f64>;

fn flag(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}

/// Encode the categorical fields of `input`.
///
/// Binary answers become `<code>_encoded` flags (1 only for `yes`, or for
/// `Male` in the gender flag). Frequency, transport and age bracket become
/// drop-first indicators.
#[must_use]
pub fn encode(input: &RawInput, age_bracket: AgeBracket) -> EncodedColumns {
    let mut out = EncodedColumns::new();

    out.insert(
        columns::HIGH_CALORIE_FOOD_ENCODED.to_string(),
        flag(input.high_calorie_food.is_yes()),
    );
    out.insert(
        columns::CALORIE_MONITORING_ENCODED.to_string(),
        flag(input.calorie_monitoring.is_yes()),
    );
    out.insert(
        columns::SMOKER_ENCODED.to_string(),
        flag(input.smoker.is_yes()),
    );
    out.insert(
        columns::FAMILY_HISTORY_ENCODED.to_string(),
        flag(input.family_history_overweight.is_yes()),
    );
    out.insert(
        columns::GENDER_ENCODED.to_string(),
        flag(input.gender == Gender::Male),
    );

    ALCOHOL_GROUP.encode_into(input.alcohol_frequency.as_str(), &mut out);
    SNACK_GROUP.encode_into(input.snack_frequency.as_str(), &mut out);
    TRANSPORT_GROUP.encode_into(input.transport_mode.as_str(), &mut out);
    AGE_GROUP.encode_into(age_bracket.as_str(), &mut out);

    out
}
