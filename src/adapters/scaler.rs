//! Fitted scalers exported with the model bundle.
//!
//! Parameters follow scikit-learn's `StandardScaler` (`mean_`, `scale_`) and
//! `MinMaxScaler` (`data_min_`, `data_max_`, `feature_range`) so a training
//! notebook can dump them as-is.

use serde::{Deserialize, Serialize};

use crate::ports::{Scaler, ScalerError};

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// A pre-fitted column-wise scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedScaler {
    /// `(x - mean) / scale`
    Standard {
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// `(x - data_min) / (data_max - data_min) * (hi - lo) + lo`
    MinMax {
        feature_names: Vec<String>,
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        #[serde(default = "default_feature_range")]
        feature_range: (f64, f64),
    },
}

impl FittedScaler {
    fn feature_names(&self) -> &[String] {
        match self {
            Self::Standard { feature_names, .. } | Self::MinMax { feature_names, .. } => {
                feature_names
            }
        }
    }

    /// Check parameter lengths and values.
    ///
    /// # Errors
    /// Returns a description of the first inconsistency.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.feature_names().len();
        if n == 0 {
            return Err("scaler has no columns".into());
        }
        match self {
            Self::Standard { mean, scale, .. } => {
                if mean.len() != n || scale.len() != n {
                    return Err(format!(
                        "mean/scale lengths ({}, {}) do not match {n} columns",
                        mean.len(),
                        scale.len()
                    ));
                }
                if mean.iter().any(|m| !m.is_finite()) {
                    return Err("mean contains a non-finite value".into());
                }
                if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                    return Err("scale must be finite and non-zero".into());
                }
            }
            Self::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
                ..
            } => {
                if data_min.len() != n || data_max.len() != n {
                    return Err(format!(
                        "data_min/data_max lengths ({}, {}) do not match {n} columns",
                        data_min.len(),
                        data_max.len()
                    ));
                }
                if data_min.iter().chain(data_max).any(|v| !v.is_finite()) {
                    return Err("data range contains a non-finite value".into());
                }
                if data_min.iter().zip(data_max).any(|(min, max)| max < min) {
                    return Err("data_max is below data_min".into());
                }
                if !(lo < hi) {
                    return Err(format!("feature_range ({lo}, {hi}) is empty"));
                }
            }
        }
        Ok(())
    }

    fn transform_one(&self, index: usize, x: f64) -> f64 {
        match self {
            Self::Standard { mean, scale, .. } => (x - mean[index]) / scale[index],
            Self::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
                ..
            } => {
                let mut range = data_max[index] - data_min[index];
                // Constant columns keep a unit range, as scikit-learn does.
                if range == 0.0 {
                    range = 1.0;
                }
                (x - data_min[index]) / range * (hi - lo) + lo
            }
        }
    }
}

impl Scaler for FittedScaler {
    fn columns(&self) -> &[String] {
        self.feature_names()
    }

    fn transform(&self, columns: &[&str], values: &[f64]) -> Result<Vec<f64>, ScalerError> {
        if columns.len() != values.len() {
            return Err(ScalerError::Arity {
                columns: columns.len(),
                values: values.len(),
            });
        }

        columns
            .iter()
            .zip(values)
            .map(|(column, x)| {
                let index = self
                    .feature_names()
                    .iter()
                    .position(|name| name == column)
                    .ok_or_else(|| ScalerError::UnknownColumn((*column).to_string()))?;
                let scaled = self.transform_one(index, *x);
                if scaled.is_finite() {
                    Ok(scaled)
                } else {
                    Err(ScalerError::NonFinite {
                        column: (*column).to_string(),
                    })
                }
            })
            .collect()
    }
}
