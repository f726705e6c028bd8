// ============================================================
// Layer 5 - Feature Transformer
// ============================================================
// Turns a table of mixed cells into a dense f32 matrix the
// estimator can consume. Fitted once per training run; the
// fitted state is plain data and is saved in the artifact
// manifest.
//
// Per column, in order:
//
//   numeric      missing → training mean
//   categorical  missing → "Missing"
//                labels below the rare tolerance → "Rare"
//                label → ordinal code, ordered by mean target
//   both         min-max scale to [0, 1] over the training rows
//
// Labels never seen during fitting (and labels that were rare)
// take the "Rare" code when one exists, otherwise code 0.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::dataset::{Dataset, Value};
use crate::domain::error::{FitError, ModelError, ModelResult};

pub const MISSING_LABEL: &str = "Missing";
pub const RARE_LABEL: &str = "Rare";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoder {
    Numeric { fill: f64 },
    Categorical { codes: BTreeMap<String, f64>, fallback: f64 },
}

impl ColumnEncoder {
    fn encode(&self, value: &Value) -> f64 {
        match self {
            ColumnEncoder::Numeric { fill } => value.as_number().unwrap_or(*fill),
            ColumnEncoder::Categorical { codes, fallback } => {
                let label = value.label().unwrap_or_else(|| MISSING_LABEL.to_string());
                codes.get(&label).copied().unwrap_or(*fallback)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnState {
    pub name:    String,
    pub encoder: ColumnEncoder,
    pub min:     f64,
    pub max:     f64,
}

impl ColumnState {
    fn scale(&self, encoded: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 {
            (encoded - self.min) / range
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransformer {
    columns: Vec<ColumnState>,
}

impl FeatureTransformer {
    /// Learn imputation, encoding and scaling for every column of `features`.
    pub fn fit(
        features:    &Dataset,
        target:      &[f64],
        categorical: &BTreeSet<String>,
        rare_tol:    f64,
    ) -> Result<Self, FitError> {
        if features.is_empty() {
            return Err(FitError::EmptyTrainingSet);
        }
        if features.len() != target.len() {
            return Err(FitError::LengthMismatch {
                rows:    features.len(),
                targets: target.len(),
            });
        }

        let mut columns = Vec::with_capacity(features.columns().len());
        for (idx, name) in features.columns().iter().enumerate() {
            let cells: Vec<&Value> = features.rows().iter().map(|r| &r[idx]).collect();

            let encoder = if categorical.contains(name) {
                fit_categorical(&cells, target, rare_tol)
            } else {
                fit_numeric(name, &cells)?
            };

            let encoded: Vec<f64> = cells.iter().map(|v| encoder.encode(v)).collect();
            let min = encoded.iter().copied().fold(f64::INFINITY, f64::min);
            let max = encoded.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            columns.push(ColumnState { name: name.clone(), encoder, min, max });
        }

        tracing::debug!("Fitted feature transformer over {} columns", columns.len());
        Ok(Self { columns })
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnState] {
        &self.columns
    }

    /// Encode and scale `features` into a row-major matrix of
    /// `features.len() x n_features()` values. Extra columns are
    /// ignored; absent fitted columns are a `SchemaMismatch`.
    pub fn transform(&self, features: &Dataset) -> ModelResult<Vec<f32>> {
        let names = self.feature_names();
        features.require_columns(&names[..])?;

        let indices: Vec<usize> = names
            .iter()
            .filter_map(|n| features.column_index(n))
            .collect();

        let mut matrix = Vec::with_capacity(features.len() * self.columns.len());
        for row in features.rows() {
            for (state, &idx) in self.columns.iter().zip(&indices) {
                let scaled = state.scale(state.encoder.encode(&row[idx]));
                matrix.push(scaled as f32);
            }
        }

        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Inference(
                "feature matrix contains non-finite values".to_string(),
            ));
        }
        Ok(matrix)
    }
}

fn fit_numeric(name: &str, cells: &[&Value]) -> Result<ColumnEncoder, FitError> {
    let observed: Vec<f64> = cells.iter().filter_map(|v| v.as_number()).collect();
    if observed.is_empty() {
        return Err(FitError::EmptyColumn { column: name.to_string() });
    }
    let fill = observed.iter().sum::<f64>() / observed.len() as f64;
    Ok(ColumnEncoder::Numeric { fill })
}

fn fit_categorical(cells: &[&Value], target: &[f64], rare_tol: f64) -> ColumnEncoder {
    let raw: Vec<String> = cells
        .iter()
        .map(|v| v.label().unwrap_or_else(|| MISSING_LABEL.to_string()))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in &raw {
        *counts.entry(label.as_str()).or_default() += 1;
    }

    let total = raw.len() as f64;
    let grouped: Vec<&str> = raw
        .iter()
        .map(|label| {
            if (counts[label.as_str()] as f64) / total < rare_tol {
                RARE_LABEL
            } else {
                label.as_str()
            }
        })
        .collect();

    // Mean target per label; BTreeMap keeps iteration order stable.
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (label, &y) in grouped.iter().zip(target) {
        let entry = sums.entry(*label).or_insert((0.0, 0));
        entry.0 += y;
        entry.1 += 1;
    }

    let mut ranked: Vec<(&str, f64)> = sums
        .into_iter()
        .map(|(label, (sum, n))| (label, sum / n as f64))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let codes: BTreeMap<String, f64> = ranked
        .iter()
        .enumerate()
        .map(|(code, (label, _))| (label.to_string(), code as f64))
        .collect();
    let fallback = codes.get(RARE_LABEL).copied().unwrap_or(0.0);

    ColumnEncoder::Categorical { codes, fallback }
}
