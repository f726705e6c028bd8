// ============================================================
// Layer 6 - Artifact Store
// ============================================================
// Persists fitted PricePipelines, one slot per version.
//
// What gets saved per slot:
//   1. estimator.mpk  - LinearRegressor weights (burn recorder,
//                       full precision so reloads predict
//                       exactly what the fitted model did)
//   2. pipeline.json  - manifest: version, features, settings,
//                       fitted transformer state
//
// File naming convention:
//   trained_models/
//     regression_model_output_v0.1.0/
//       estimator.mpk
//       pipeline.json
//
// A slot is written into a hidden staging directory first and
// then renamed over the old slot, so readers never see a half
// written artifact. After a successful store every other slot
// (an entry named `<prefix><version>`) is removed; failures there
// are only logged. Entries without the slot prefix and hidden
// entries (".gitkeep", staging dirs) are never touched.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
};
use serde::{Deserialize, Serialize};

use crate::domain::artifact::TrainedArtifact;
use crate::domain::error::{ModelError, ModelResult};
use crate::domain::traits::ArtifactSink;
use crate::ml::features::FeatureTransformer;
use crate::ml::model::{device, InferBackend, LinearRegressor};
use crate::ml::pipeline::{PipelineSettings, PricePipeline};

const ESTIMATOR_FILE: &str = "estimator";
const MANIFEST_FILE: &str = "pipeline.json";

type StoreRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Everything about a fitted pipeline except the estimator weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineManifest {
    pub package_name: String,
    pub version:      String,
    pub features:     Vec<String>,
    pub settings:     PipelineSettings,
    pub transformer:  FeatureTransformer,
}

/// Deletes one stale slot.
type RemoveFn = fn(&Path) -> io::Result<()>;

/// Versioned, on-disk storage for fitted pipelines.
pub struct ArtifactStore {
    dir:          PathBuf,
    package_name: String,
    /// Slot name prefix; the version is appended.
    prefix:       String,
    remove_slot:  RemoveFn,
}

impl ArtifactStore {
    pub fn new(
        dir:          impl Into<PathBuf>,
        package_name: impl Into<String>,
        prefix:       impl Into<String>,
    ) -> Self {
        Self {
            dir:          dir.into(),
            package_name: package_name.into(),
            prefix:       prefix.into(),
            remove_slot:  remove_path,
        }
    }

    #[cfg(test)]
    fn with_remover(mut self, remove_slot: RemoveFn) -> Self {
        self.remove_slot = remove_slot;
        self
    }

    pub fn slot_name(&self, version: &str) -> String {
        format!("{}{}", self.prefix, version)
    }

    pub fn slot_dir(&self, version: &str) -> PathBuf {
        self.dir.join(self.slot_name(version))
    }

    /// Write `pipeline` into the slot for `version`, replacing whatever
    /// was there. Does not touch other slots.
    pub fn save_pipeline(&self, pipeline: &PricePipeline, version: &str) -> ModelResult<PathBuf> {
        let fitted = pipeline.fitted().ok_or(ModelError::NotTrained)?;

        fs::create_dir_all(&self.dir).map_err(|e| ModelError::persistence(&self.dir, e))?;

        let slot    = self.slot_dir(version);
        let staging = self.dir.join(format!(".{}.staging", self.slot_name(version)));

        if let Err(e) = self.write_slot(&staging, pipeline, fitted.transformer.clone(), &fitted.regressor, version) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        if slot.exists() {
            tracing::info!("Replacing existing artifact '{}'", slot.display());
            fs::remove_dir_all(&slot).map_err(|e| ModelError::persistence(&slot, e))?;
        }
        fs::rename(&staging, &slot).map_err(|e| ModelError::persistence(&slot, e))?;

        tracing::info!("Saved pipeline v{} to '{}'", version, slot.display());
        Ok(slot)
    }

    fn write_slot(
        &self,
        staging:     &Path,
        pipeline:    &PricePipeline,
        transformer: FeatureTransformer,
        regressor:   &LinearRegressor<InferBackend>,
        version:     &str,
    ) -> ModelResult<()> {
        if staging.exists() {
            fs::remove_dir_all(staging).map_err(|e| ModelError::persistence(staging, e))?;
        }
        fs::create_dir_all(staging).map_err(|e| ModelError::persistence(staging, e))?;

        // The recorder appends its own extension (estimator.mpk).
        let weights = staging.join(ESTIMATOR_FILE);
        regressor
            .clone()
            .save_file(weights.clone(), &StoreRecorder::new())
            .map_err(|e| ModelError::persistence(&weights, format!("{e:?}")))?;

        let manifest = PipelineManifest {
            package_name: self.package_name.clone(),
            version:      version.to_string(),
            features:     transformer.feature_names().iter().map(|s| s.to_string()).collect(),
            settings:     pipeline.settings().clone(),
            transformer,
        };
        let manifest_path = staging.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| ModelError::persistence(&manifest_path, e))?;
        fs::write(&manifest_path, json).map_err(|e| ModelError::persistence(&manifest_path, e))?;

        Ok(())
    }

    /// Read the manifest of the slot for `version`.
    pub fn load_manifest(&self, version: &str) -> ModelResult<PipelineManifest> {
        let path = self.slot_dir(version).join(MANIFEST_FILE);
        let json = fs::read_to_string(&path).map_err(|e| {
            ModelError::persistence(
                &path,
                format!("{e}. Have you run 'train' for version {version}?"),
            )
        })?;
        serde_json::from_str(&json).map_err(|e| ModelError::persistence(&path, e))
    }

    /// Rebuild the fitted pipeline stored for `version`.
    pub fn load_pipeline(&self, version: &str) -> ModelResult<PricePipeline> {
        let manifest = self.load_manifest(version)?;
        if manifest.version != version {
            return Err(ModelError::persistence(
                self.slot_dir(version),
                format!("slot holds version {}, expected {}", manifest.version, version),
            ));
        }

        let device  = device();
        let weights = self.slot_dir(version).join(ESTIMATOR_FILE);
        let regressor = LinearRegressor::<InferBackend>::new(manifest.transformer.n_features(), &device)
            .load_file(weights.clone(), &StoreRecorder::new(), &device)
            .map_err(|e| ModelError::persistence(&weights, format!("{e:?}")))?;
        if regressor.n_features() != manifest.transformer.n_features() {
            return Err(ModelError::persistence(
                &weights,
                format!(
                    "estimator takes {} inputs but the manifest lists {} features",
                    regressor.n_features(),
                    manifest.transformer.n_features()
                ),
            ));
        }

        tracing::info!("Loaded pipeline v{} ({} features)", version, manifest.features.len());
        Ok(PricePipeline::from_parts(manifest.settings, manifest.transformer, regressor))
    }

    /// Remove every slot in the store directory except `keep`. Only
    /// entries named with the slot prefix count as slots. Failures are
    /// logged and skipped. Returns what was removed.
    pub fn remove_old_pipelines(&self, keep: &str) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot list '{}' for cleanup: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut removed = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == keep || !name.starts_with(self.prefix.as_str()) {
                continue;
            }

            let path = entry.path();
            match (self.remove_slot)(&path) {
                Ok(()) => {
                    tracing::debug!("Removed stale artifact '{}'", path.display());
                    removed.push(path);
                }
                Err(e) => tracing::warn!("Could not remove stale artifact '{}': {}", path.display(), e),
            }
        }
        removed
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

impl ArtifactSink<PricePipeline> for ArtifactStore {
    fn store(&self, artifact: TrainedArtifact<PricePipeline>) -> ModelResult<PathBuf> {
        let slot = self.save_pipeline(&artifact.pipeline, &artifact.version)?;

        let removed = self.remove_old_pipelines(&self.slot_name(&artifact.version));
        if !removed.is_empty() {
            tracing::info!("Removed {} stale artifact(s)", removed.len());
        }
        Ok(slot)
    }
}
