// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates one training run, strictly in this order:
//
//   Step 1: Load the training table      (DatasetSource)
//   Step 2: Split train / holdout        (data::splitter)
//   Step 3: ln() the training target     (data::target)
//   Step 4: Fit a fresh pipeline         (TrainablePipeline)
//   Step 5: Store it under the version   (ArtifactSink)
//
// Any failure stops the run where it happened and propagates;
// nothing is retried. Because the pipeline is only handed to the
// sink after fit returns Ok, a failed run never leaves a new
// artifact behind.
//
// The holdout is split off but not scored here.

use std::path::PathBuf;

use crate::application::config::Config;
use crate::data::splitter::train_test_split;
use crate::data::target::log_transform;
use crate::domain::artifact::TrainedArtifact;
use crate::domain::error::{ModelError, ModelResult};
use crate::domain::traits::{ArtifactSink, DatasetSource, TrainablePipeline};

/// Owns the configuration and the collaborators for training runs.
///
/// `make_pipeline` is called once per run, so no fitted state is
/// shared between runs.
pub struct TrainUseCase<S, K, F> {
    config:        Config,
    source:        S,
    sink:          K,
    make_pipeline: F,
}

impl<S, K, F, P> TrainUseCase<S, K, F>
where
    S: DatasetSource,
    P: TrainablePipeline,
    K: ArtifactSink<P>,
    F: Fn(&Config) -> P,
{
    pub fn new(config: Config, source: S, sink: K, make_pipeline: F) -> Self {
        Self { config, source, sink, make_pipeline }
    }

    /// Run the five training steps once.
    pub fn run_training(&self) -> ModelResult<()> {
        self.execute().map(|_| ())
    }

    /// Same as `run_training`, returning where the artifact was stored.
    pub fn execute(&self) -> ModelResult<PathBuf> {
        let cfg = &self.config;
        let m   = &cfg.model;

        // ── Step 1: Load the training table ──────────────────────────────────
        let data = stage("load", || {
            let data = self.source.load(&cfg.app.training_data_file)?;
            data.require_columns(&m.features)?;
            data.require_columns(&[m.target.as_str()])?;
            Ok(data)
        })?;

        // ── Step 2: Train / holdout split ────────────────────────────────────
        let split = stage("split", || {
            train_test_split(&data, &m.features, &m.target, m.test_size, m.random_state)
        })?;
        tracing::info!(
            "Split: {} train, {} holdout (test_size={}, random_state={})",
            split.x_train.len(),
            split.x_test.len(),
            m.test_size,
            m.random_state,
        );

        // ── Step 3: Target transform ─────────────────────────────────────────
        // Only the training target is transformed. The holdout target is
        // still checked against the transform's domain, and errors report
        // the row index of the loaded table.
        let y_train = stage("transform", || {
            let y_train = log_transform(&split.y_train)
                .map_err(|e| to_table_row(e, &split.train_indices))?;
            log_transform(&split.y_test).map_err(|e| to_table_row(e, &split.test_indices))?;
            Ok(y_train)
        })?;

        // ── Step 4: Fit a fresh pipeline ─────────────────────────────────────
        let pipeline = stage("fit", || {
            let mut pipeline = (self.make_pipeline)(cfg);
            pipeline.fit(&split.x_train, &y_train)?;
            Ok(pipeline)
        })?;

        // ── Step 5: Persist under the current version ────────────────────────
        // The pipeline moves into the artifact; nothing here keeps it.
        let stored = stage("persist", || {
            self.sink.store(TrainedArtifact::new(pipeline, cfg.version.clone()))
        })?;

        tracing::info!("Training complete: {} stored at '{}'", cfg.artifact_name(), stored.display());
        Ok(stored)
    }
}

/// Run one step inside a `stage` span, logging the stage name on failure.
fn stage<T>(name: &'static str, step: impl FnOnce() -> ModelResult<T>) -> ModelResult<T> {
    let span = tracing::info_span!("stage", name);
    let _enter = span.enter();
    tracing::debug!("starting");
    step().inspect_err(|e| tracing::error!(stage = name, "Training failed: {e}"))
}

/// Map an `InvalidTargetValue` row from split order back to table order.
fn to_table_row(err: ModelError, indices: &[usize]) -> ModelError {
    match err {
        ModelError::InvalidTargetValue { row, value } => ModelError::InvalidTargetValue {
            row: indices.get(row).copied().unwrap_or(row),
            value,
        },
        other => other,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;
    use std::rc::Rc;

    use crate::application::config::{AppConfig, ModelConfig};
    use crate::data::dataset::{Dataset, Value};
    use crate::domain::error::FitError;

    const FEATURES: [&str; 5] = ["f0", "f1", "f2", "f3", "f4"];

    fn config() -> Config {
        Config {
            app: AppConfig {
                package_name:       "regression_model".into(),
                training_data_file: "train.csv".into(),
                test_data_file:     "test.csv".into(),
                pipeline_save_file: "regression_model_output_v".into(),
                rename_columns:     BTreeMap::new(),
            },
            model: ModelConfig {
                target:           "price".into(),
                features:         FEATURES.iter().map(|f| f.to_string()).collect(),
                categorical_vars: vec![],
                test_size:        0.2,
                random_state:     42,
                alpha:            0.0,
                epochs:           800,
                learning_rate:    0.05,
                rare_label_tol:   0.0,
            },
            version: "0.1.0".into(),
        }
    }

    /// `rows` rows, five numeric features, price = 1000 + 10·row.
    fn table(rows: usize) -> Dataset {
        let mut columns: Vec<String> = FEATURES.iter().map(|f| f.to_string()).collect();
        columns.push("price".into());
        let rows = (0..rows)
            .map(|i| {
                let mut row: Vec<Value> = (0..5).map(|f| Value::Number((i * (f + 1)) as f64)).collect();
                row.push(Value::Number(1000.0 + 10.0 * i as f64));
                row
            })
            .collect();
        Dataset::new(columns, rows).unwrap()
    }

    // ── Test doubles ─────────────────────────────────────────────────────────

    struct FixedSource {
        data:  Option<Dataset>,
        calls: Cell<usize>,
    }

    impl FixedSource {
        fn new(data: Option<Dataset>) -> Self {
            Self { data, calls: Cell::new(0) }
        }
    }

    impl DatasetSource for FixedSource {
        fn load(&self, identifier: &str) -> ModelResult<Dataset> {
            self.calls.set(self.calls.get() + 1);
            self.data
                .clone()
                .ok_or_else(|| ModelError::data_unavailable(identifier, "no such file"))
        }
    }

    #[derive(Debug, Default)]
    struct SpyPipeline {
        fail:      bool,
        fitted_on: Option<(usize, Vec<f64>)>,
    }

    impl TrainablePipeline for SpyPipeline {
        fn fit(&mut self, features: &Dataset, target: &[f64]) -> Result<(), FitError> {
            if self.fail {
                return Err(FitError::Other("solver exploded".into()));
            }
            self.fitted_on = Some((features.len(), target.to_vec()));
            Ok(())
        }

        fn predict(&self, features: &Dataset) -> ModelResult<Vec<f64>> {
            self.fitted_on.as_ref().ok_or(ModelError::NotTrained)?;
            Ok(vec![0.0; features.len()])
        }

        fn is_fitted(&self) -> bool {
            self.fitted_on.is_some()
        }
    }

    #[derive(Default)]
    struct MemorySink {
        stored: RefCell<Vec<TrainedArtifact<SpyPipeline>>>,
        fail:   bool,
    }

    impl ArtifactSink<SpyPipeline> for MemorySink {
        fn store(&self, artifact: TrainedArtifact<SpyPipeline>) -> ModelResult<PathBuf> {
            if self.fail {
                return Err(ModelError::persistence("/read-only", "permission denied"));
            }
            let mut stored = self.stored.borrow_mut();
            // the real store keeps exactly one version
            stored.clear();
            stored.push(artifact);
            Ok(PathBuf::from("memory"))
        }
    }

    fn use_case(
        data:      Option<Dataset>,
        sink:      MemorySink,
        fail_fit:  bool,
        built:     Rc<Cell<usize>>,
    ) -> TrainUseCase<FixedSource, MemorySink, impl Fn(&Config) -> SpyPipeline> {
        TrainUseCase::new(config(), FixedSource::new(data), sink, move |_cfg: &Config| {
            built.set(built.get() + 1);
            SpyPipeline { fail: fail_fit, ..Default::default() }
        })
    }

    // ── Scenarios ────────────────────────────────────────────────────────────

    #[test]
    fn test_happy_path_splits_transforms_fits_and_stores() {
        let built = Rc::new(Cell::new(0));
        let uc = use_case(Some(table(100)), MemorySink::default(), false, built.clone());

        uc.run_training().unwrap();

        assert_eq!(built.get(), 1);
        let stored = uc.sink.stored.borrow();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].version, "0.1.0");

        let (rows, target) = stored[0].pipeline.fitted_on.clone().unwrap();
        assert_eq!(rows, 80);
        assert_eq!(target.len(), 80);
        // fitted on ln(price): every price is in [1000, 1990]
        assert!(target.iter().all(|t| (1000f64.ln()..=1990f64.ln()).contains(t)));
    }

    #[test]
    fn test_zero_target_fails_before_fit() {
        let mut data = table(100);
        let mut rows: Vec<Vec<Value>> = data.rows().to_vec();
        rows[37][5] = Value::Number(0.0);
        data = Dataset::new(data.columns().to_vec(), rows).unwrap();

        let built = Rc::new(Cell::new(0));
        let uc = use_case(Some(data), MemorySink::default(), false, built.clone());

        let err = uc.run_training().unwrap_err();
        assert!(
            matches!(err, ModelError::InvalidTargetValue { row: 37, value: Some(v) } if v == 0.0),
            "unexpected error {err:?}"
        );
        assert_eq!(built.get(), 0);
        assert!(uc.sink.stored.borrow().is_empty());
    }

    #[test]
    fn test_unknown_identifier_stops_at_loader() {
        let built = Rc::new(Cell::new(0));
        let uc = use_case(None, MemorySink::default(), false, built.clone());

        let err = uc.run_training().unwrap_err();
        assert!(matches!(err, ModelError::DataUnavailable { .. }));
        assert_eq!(uc.source.calls.get(), 1);
        assert_eq!(built.get(), 0);
        assert!(uc.sink.stored.borrow().is_empty());
    }

    #[test]
    fn test_missing_feature_is_schema_mismatch() {
        let data = table(20).select(&["f0", "f1", "price"]).unwrap();
        let built = Rc::new(Cell::new(0));
        let uc = use_case(Some(data), MemorySink::default(), false, built.clone());

        match uc.run_training() {
            Err(ModelError::SchemaMismatch { missing }) => {
                assert_eq!(missing, vec!["f2", "f3", "f4"]);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
        assert_eq!(built.get(), 0);
    }

    #[test]
    fn test_fit_failure_is_training_failed_and_not_stored() {
        let built = Rc::new(Cell::new(0));
        let uc = use_case(Some(table(50)), MemorySink::default(), true, built.clone());

        let err = uc.run_training().unwrap_err();
        assert!(matches!(err, ModelError::TrainingFailed(FitError::Other(_))));
        assert!(uc.sink.stored.borrow().is_empty());
    }

    #[test]
    fn test_persistence_failure_propagates() {
        let sink = MemorySink { fail: true, ..Default::default() };
        let uc = use_case(Some(table(50)), sink, false, Rc::new(Cell::new(0)));
        assert!(matches!(uc.run_training(), Err(ModelError::Persistence { .. })));
    }

    #[test]
    fn test_each_run_builds_a_fresh_pipeline() {
        let built = Rc::new(Cell::new(0));
        let uc = use_case(Some(table(30)), MemorySink::default(), false, built.clone());

        uc.run_training().unwrap();
        uc.run_training().unwrap();

        assert_eq!(built.get(), 2);
        assert_eq!(uc.sink.stored.borrow().len(), 1);
    }

    #[test]
    fn test_too_few_rows_is_invalid_configuration() {
        let uc = use_case(Some(table(1)), MemorySink::default(), false, Rc::new(Cell::new(0)));
        assert!(matches!(uc.run_training(), Err(ModelError::InvalidConfiguration(_))));
    }

    // ── End to end with the real collaborators ───────────────────────────────

    mod end_to_end {
        use super::*;
        use crate::data::loader::CsvDatasetSource;
        use crate::infra::artifact_store::ArtifactStore;
        use crate::ml::pipeline::PricePipeline;
        use std::fmt::Write as _;
        use std::path::Path;

        fn write_csv(path: &Path, price_scale: f64) {
            let mut body = String::from("f0,f1,f2,f3,f4,price\n");
            for i in 0..60 {
                let price = price_scale * (100_000.0 + 2_000.0 * i as f64);
                writeln!(body, "{},{},{},{},{},{}", i, i % 7, i % 3, 60 - i, i * 2, price).unwrap();
            }
            std::fs::write(path, body).unwrap();
        }

        #[test]
        fn test_second_run_overwrites_same_version() {
            let tmp = tempfile::tempdir().unwrap();
            let data_dir = tmp.path().join("datasets");
            let model_dir = tmp.path().join("trained_models");
            std::fs::create_dir_all(&data_dir).unwrap();

            let cfg = config();
            let uc = TrainUseCase::new(
                cfg.clone(),
                CsvDatasetSource::new(&data_dir),
                ArtifactStore::new(&model_dir, &cfg.app.package_name, &cfg.app.pipeline_save_file),
                |c: &Config| PricePipeline::new(c.model.pipeline_settings()),
            );
            let reader = ArtifactStore::new(&model_dir, "regression_model", "regression_model_output_v");
            let scorer = CsvDatasetSource::new(&data_dir);

            write_csv(&data_dir.join("train.csv"), 1.0);
            uc.run_training().unwrap();
            let scored_rows = scorer.load("train.csv").unwrap();
            let first = reader.load_pipeline("0.1.0").unwrap().predict(&scored_rows).unwrap();

            write_csv(&data_dir.join("train.csv"), 2.0);
            uc.run_training().unwrap();
            let second = reader.load_pipeline("0.1.0").unwrap().predict(&scored_rows).unwrap();

            assert_ne!(first, second);
            let mean_gap = second.iter().zip(&first).map(|(b, a)| b - a).sum::<f64>() / first.len() as f64;
            // prices doubled, so log predictions move up by about ln 2
            assert!(mean_gap > 0.3, "mean gap {mean_gap}");
            assert_eq!(std::fs::read_dir(&model_dir).unwrap().count(), 1);
        }
    }
}
