// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Scores a table with the pipeline stored for the current
// version:
//
//   Step 1: Load the fitted pipeline     (ArtifactStore)
//   Step 2: Load the table to score      (DatasetSource)
//   Step 3: Keep the configured features
//   Step 4: Predict, then exp() back to prices
//
// The stored pipeline predicts ln(price), the space TrainUseCase
// fits it in.

use crate::application::config::Config;
use crate::data::target::inverse_log_transform;
use crate::domain::error::ModelResult;
use crate::domain::traits::{DatasetSource, TrainablePipeline};
use crate::infra::artifact_store::ArtifactStore;

pub struct PredictUseCase<S> {
    config: Config,
    source: S,
    store:  ArtifactStore,
}

impl<S: DatasetSource> PredictUseCase<S> {
    pub fn new(config: Config, source: S, store: ArtifactStore) -> Self {
        Self { config, source, store }
    }

    /// Predicted sale prices, one per row of `identifier`.
    pub fn predict(&self, identifier: &str) -> ModelResult<Vec<f64>> {
        let version = &self.config.version;
        let pipeline = self.store.load_pipeline(version)?;
        tracing::info!("Loaded pipeline v{version} from '{}'", self.store.slot_dir(version).display());

        let data = self.source.load(identifier)?;
        let features = data.select(&self.config.model.features)?;

        let log_prices = pipeline.predict(&features)?;
        tracing::info!("Scored {} rows from '{identifier}'", log_prices.len());
        Ok(inverse_log_transform(&log_prices))
    }
}
