//! Scaler port: the pre-fitted numeric transform.

/// Errors raised by a scaler implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScalerError {
    #[error("Scaler was not fitted on column {0}")]
    UnknownColumn(String),

    #[error("Got {values} values for {columns} columns")]
    Arity { columns: usize, values: usize },

    #[error("Scaling {column} produced a non-finite value")]
    NonFinite { column: String },
}

/// Trait for a fitted column-wise transform (standardization, min-max, ...).
///
/// The scaler is fitted elsewhere; callers only choose which columns to pass.
pub trait Scaler: Send + Sync {
    /// Column names the scaler was fitted on, in fit order.
    fn columns(&self) -> &[String];

    /// Transform `values`, where `values[i]` belongs to `columns[i]`.
    ///
    /// # Errors
    /// Returns `ScalerError` if a column is unknown or the lengths differ.
    fn transform(&self, columns: &[&str], values: &[f64]) -> Result<Vec<f64>, ScalerError>;
}
