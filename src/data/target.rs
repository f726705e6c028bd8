// ============================================================
// Layer 4 - Target Transform
// ============================================================
// Sale prices are right-skewed; the estimator is fitted on
// ln(price) and predictions are mapped back with exp.
//
// ln is only defined for strictly positive inputs, so a zero,
// negative, or non-finite price fails the whole run rather than
// producing -inf / NaN targets.

use crate::domain::error::{ModelError, ModelResult};

/// Elementwise natural log. Fails with `InvalidTargetValue` on the
/// first value that is not a strictly positive finite number.
pub fn log_transform(values: &[f64]) -> ModelResult<Vec<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(row, &value)| {
            if value.is_finite() && value > 0.0 {
                Ok(value.ln())
            } else {
                Err(ModelError::InvalidTargetValue { row, value: Some(value) })
            }
        })
        .collect()
}

/// Inverse of `log_transform`.
pub fn inverse_log_transform(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.exp()).collect()
}
