// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The orchestrator only ever talks to these three seams:
//
//   DatasetSource      → where training data comes from
//   TrainablePipeline  → what gets fitted
//   ArtifactSink       → where the fitted pipeline ends up
//
// Concrete implementations live in the lower layers
// (CsvDatasetSource in data, PricePipeline in ml,
// ArtifactStore in infra). Tests swap in in-memory doubles.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::PathBuf;

use crate::data::dataset::Dataset;
use crate::domain::artifact::TrainedArtifact;
use crate::domain::error::{FitError, ModelResult};

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can resolve a logical file name to a table.
///
/// Implementations:
///   - CsvDatasetSource → reads `<datasets dir>/<identifier>` as CSV
pub trait DatasetSource {
    /// Fails with `DataUnavailable` if `identifier` does not resolve
    /// to a readable table.
    fn load(&self, identifier: &str) -> ModelResult<Dataset>;
}

// ─── TrainablePipeline ────────────────────────────────────────────────────────
/// Feature transformation plus estimator, fitted as one unit.
pub trait TrainablePipeline {
    /// Fit on `features` against `target` (one value per row).
    /// A second call replaces everything learned by the first.
    fn fit(&mut self, features: &Dataset, target: &[f64]) -> Result<(), FitError>;

    /// Predict one value per row, in the same space as the fitted target.
    /// Fails with `NotTrained` before the first successful `fit`.
    fn predict(&self, features: &Dataset) -> ModelResult<Vec<f64>>;

    fn is_fitted(&self) -> bool;
}

// ─── ArtifactSink ─────────────────────────────────────────────────────────────
/// Versioned storage for fitted pipelines.
pub trait ArtifactSink<P> {
    /// Store `artifact` under its version, replacing anything already in
    /// that slot, then evict other versions best-effort. Returns where the
    /// artifact was written. Fails with `Persistence` only if the write
    /// itself did not complete.
    fn store(&self, artifact: TrainedArtifact<P>) -> ModelResult<PathBuf>;
}
