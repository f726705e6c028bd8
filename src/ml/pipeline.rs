// ============================================================
// Layer 5 - Price Pipeline
// ============================================================
// The concrete TrainablePipeline: a FeatureTransformer followed
// by a LinearRegressor. Fitting builds both from scratch, so a
// second fit never carries anything over from the first.
//
//   features ──► FeatureTransformer ──► f32 matrix ──► LinearRegressor ──► ŷ
//
// Predictions come out in the space the target was fitted in
// (log price when driven by the training use case).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::domain::error::{FitError, ModelError, ModelResult};
use crate::domain::traits::TrainablePipeline;
use crate::ml::features::{ColumnEncoder, FeatureTransformer};
use crate::ml::model::{InferBackend, LinearRegressor};
use crate::ml::trainer::{fit_regressor, predict_rows, FitSchedule};

/// Everything needed to build an unfitted pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Features encoded as labels instead of numbers
    pub categorical_vars: Vec<String>,
    /// L1 penalty on the estimator weights
    pub alpha:            f64,
    pub epochs:           usize,
    pub learning_rate:    f64,
    /// Labels rarer than this share of training rows are grouped as "Rare"
    pub rare_label_tol:   f64,
}

impl PipelineSettings {
    fn schedule(&self) -> FitSchedule {
        FitSchedule {
            alpha:         self.alpha,
            epochs:        self.epochs,
            learning_rate: self.learning_rate,
        }
    }
}

/// The fitted half of a pipeline.
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    pub transformer: FeatureTransformer,
    pub regressor:   LinearRegressor<InferBackend>,
}

#[derive(Debug, Clone)]
pub struct PricePipeline {
    settings: PipelineSettings,
    fitted:   Option<FittedPipeline>,
}

impl PricePipeline {
    /// An unfitted pipeline.
    pub fn new(settings: PipelineSettings) -> Self {
        Self { settings, fitted: None }
    }

    /// Rebuild a fitted pipeline from stored parts.
    pub fn from_parts(
        settings:    PipelineSettings,
        transformer: FeatureTransformer,
        regressor:   LinearRegressor<InferBackend>,
    ) -> Self {
        Self {
            settings,
            fitted: Some(FittedPipeline { transformer, regressor }),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn fitted(&self) -> Option<&FittedPipeline> {
        self.fitted.as_ref()
    }
}

impl TrainablePipeline for PricePipeline {
    fn fit(&mut self, features: &Dataset, target: &[f64]) -> Result<(), FitError> {
        // A failed refit must not leave the previous model answering.
        self.fitted = None;

        let categorical: BTreeSet<String> =
            self.settings.categorical_vars.iter().cloned().collect();

        let transformer = FeatureTransformer::fit(
            features,
            target,
            &categorical,
            self.settings.rare_label_tol,
        )?;

        let matrix = transformer
            .transform(features)
            .map_err(|e| FitError::Other(e.to_string()))?;

        let n_categorical = transformer
            .columns()
            .iter()
            .filter(|c| matches!(c.encoder, ColumnEncoder::Categorical { .. }))
            .count();
        tracing::info!(
            "Fitting estimator on {} rows x {} features ({} categorical, {} epochs, alpha={})",
            features.len(),
            transformer.n_features(),
            n_categorical,
            self.settings.epochs,
            self.settings.alpha,
        );

        let regressor = fit_regressor(
            &matrix,
            features.len(),
            transformer.n_features(),
            target,
            self.settings.schedule(),
        )?;

        self.fitted = Some(FittedPipeline { transformer, regressor });
        Ok(())
    }

    fn predict(&self, features: &Dataset) -> ModelResult<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotTrained)?;

        let matrix = fitted.transformer.transform(features)?;
        predict_rows(
            &fitted.regressor,
            &matrix,
            features.len(),
            fitted.transformer.n_features(),
        )
        .map_err(ModelError::Inference)
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::Value;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            categorical_vars: vec!["zone".to_string()],
            alpha:            0.0,
            epochs:           1500,
            learning_rate:    0.05,
            rare_label_tol:   0.0,
        }
    }

    /// log-price-like target: 11 + area/1000 + 0.5 for zone "B"
    fn houses(shift: f64) -> (Dataset, Vec<f64>) {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let area = 500.0 + 50.0 * i as f64;
            let zone = if i % 2 == 0 { "A" } else { "B" };
            rows.push(vec![Value::Number(area), Value::from(zone)]);
            y.push(11.0 + area / 1000.0 + if zone == "B" { 0.5 } else { 0.0 } + shift);
        }
        let ds = Dataset::new(vec!["area".into(), "zone".into()], rows).unwrap();
        (ds, y)
    }

    #[test]
    fn test_predict_before_fit_is_not_trained() {
        let (ds, _) = houses(0.0);
        let pipe = PricePipeline::new(settings());
        assert!(!pipe.is_fitted());
        assert!(matches!(pipe.predict(&ds), Err(ModelError::NotTrained)));
    }

    #[test]
    fn test_fit_then_predict_tracks_target() {
        let (ds, y) = houses(0.0);
        let mut pipe = PricePipeline::new(settings());
        pipe.fit(&ds, &y).unwrap();

        let preds = pipe.predict(&ds).unwrap();
        assert_eq!(preds.len(), y.len());
        let mae = preds.iter().zip(&y).map(|(p, t)| (p - t).abs()).sum::<f64>() / y.len() as f64;
        assert!(mae < 0.1, "mean absolute error {mae}");
    }

    #[test]
    fn test_refit_replaces_previous_state() {
        let (ds, y) = houses(0.0);
        let (_, shifted) = houses(1.0);

        let mut pipe = PricePipeline::new(settings());
        pipe.fit(&ds, &y).unwrap();
        let before = pipe.predict(&ds).unwrap();

        pipe.fit(&ds, &shifted).unwrap();
        let after = pipe.predict(&ds).unwrap();

        let mean_shift = after.iter().zip(&before).map(|(a, b)| a - b).sum::<f64>() / before.len() as f64;
        assert!((mean_shift - 1.0).abs() < 0.1, "mean shift {mean_shift}");
    }

    #[test]
    fn test_failed_refit_clears_model() {
        let (ds, y) = houses(0.0);
        let mut pipe = PricePipeline::new(settings());
        pipe.fit(&ds, &y).unwrap();

        assert!(matches!(pipe.fit(&ds, &y[..3]), Err(FitError::LengthMismatch { .. })));
        assert!(!pipe.is_fitted());
    }
}
