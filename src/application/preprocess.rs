//! Preprocessing: raw input to the normalized, schema-aligned feature vector.
//!
//! Derivation, encoding and assembly are pure domain steps; the only injected
//! dependency is the fitted scaler used by [`normalize`].

use std::sync::Arc;

use crate::domain::{
    assemble, encode, raw_numeric_columns, DerivedAttributes, FeatureError, FeatureSchema,
    FeatureVector, RawInput,
};
use crate::ports::{Scaler, ScalerError};
use crate::Result;

/// Scale the `numeric` columns of `vector` through `scaler`.
///
/// Every other column is returned bit-identical. Names in `numeric` that the
/// vector does not contain are skipped.
///
/// # Errors
/// Returns `ScalerError` if the scaler rejects a column or yields a
/// non-finite value.
pub fn normalize<S: Scaler + ?Sized>(
    mut vector: FeatureVector,
    scaler: &S,
    numeric: &[&str],
) -> std::result::Result<FeatureVector, ScalerError> {
    let (positions, (columns, values)): (Vec<usize>, (Vec<&str>, Vec<f64>)) = numeric
        .iter()
        .filter_map(|name| {
            vector
                .names()
                .iter()
                .position(|n| n == name)
                .map(|pos| (pos, (*name, vector.values()[pos])))
        })
        .unzip();

    if positions.is_empty() {
        return Ok(vector);
    }

    let scaled = scaler.transform(&columns, &values)?;
    if scaled.len() != positions.len() {
        return Err(ScalerError::Arity {
            columns: positions.len(),
            values: scaled.len(),
        });
    }
    for (pos, value) in positions.into_iter().zip(scaled) {
        vector.set_at(pos, value);
    }
    Ok(vector)
}

/// Turns a [`RawInput`] into what the classifier consumes.
pub struct Preprocessor<S>
where
    S: Scaler,
{
    schema: FeatureSchema,
    numeric: Vec<&'static str>,
    scaler: Arc<S>,
}

impl<S> Preprocessor<S>
where
    S: Scaler,
{
    pub fn new(schema: FeatureSchema, scaler: Arc<S>) -> Self {
        let numeric = schema.numeric_features();
        Self {
            schema,
            numeric,
            scaler,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Numeric columns that go through the scaler, in scaler order.
    #[must_use]
    pub fn numeric_features(&self) -> &[&'static str] {
        &self.numeric
    }

    /// Encode and align `input` to the schema, before scaling.
    ///
    /// # Errors
    /// Returns `FeatureError` if the assembled vector does not match the schema.
    pub fn assemble(
        &self,
        input: &RawInput,
        derived: &DerivedAttributes,
    ) -> std::result::Result<FeatureVector, FeatureError> {
        let encoded = encode(input, derived.age_bracket);
        let (vector, stats) =
            assemble(derived, &encoded, &raw_numeric_columns(input), &self.schema)?;
        tracing::debug!(
            "Assembled {} features ({} zero-filled, {} dropped)",
            vector.len(),
            stats.zero_filled,
            stats.dropped
        );
        Ok(vector)
    }

    /// Scale the numeric columns of an assembled vector.
    ///
    /// # Errors
    /// Returns `ScalerError` if scaling fails.
    pub fn normalize(
        &self,
        vector: FeatureVector,
    ) -> std::result::Result<FeatureVector, ScalerError> {
        normalize(vector, self.scaler.as_ref(), &self.numeric)
    }

    /// Run the whole pipeline: validate, derive, encode, assemble, normalize.
    ///
    /// # Errors
    /// Returns `InvalidInput`, `SchemaMismatch` or `Normalization`.
    pub fn preprocess(&self, input: &RawInput) -> Result<FeatureVector> {
        input.ensure_valid()?;
        let derived = DerivedAttributes::from_input(input);
        let vector = self.assemble(input, &derived)?;
        Ok(self.normalize(vector)?)
    }
}
