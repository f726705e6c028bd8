// ============================================================
// Layer 2 - Configuration
// ============================================================
// One immutable Config value per process, built at start-up
// from two files:
//
//   config.toml → [app] and [model] tables
//   VERSION     → the package version artifacts are filed under
//
// The value is validated once here and then passed by reference
// into the use cases; nothing reads configuration globally.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ModelError, ModelResult};
use crate::ml::pipeline::PipelineSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub package_name:       String,
    pub training_data_file: String,
    pub test_data_file:     String,
    /// Prefix of every artifact slot; the version is appended.
    pub pipeline_save_file: String,
    /// Column renames applied when a dataset is loaded.
    #[serde(default)]
    pub rename_columns:     BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub target:         String,
    pub features:       Vec<String>,
    #[serde(default)]
    pub categorical_vars: Vec<String>,
    pub test_size:      f64,
    pub random_state:   u64,
    #[serde(default = "default_alpha")]
    pub alpha:          f64,
    #[serde(default = "default_epochs")]
    pub epochs:         usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate:  f64,
    #[serde(default = "default_rare_label_tol")]
    pub rare_label_tol: f64,
}

fn default_alpha() -> f64 { 0.001 }
fn default_epochs() -> usize { 1500 }
fn default_learning_rate() -> f64 { 0.05 }
fn default_rare_label_tol() -> f64 { 0.01 }

impl ModelConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            categorical_vars: self.categorical_vars.clone(),
            alpha:            self.alpha,
            epochs:           self.epochs,
            learning_rate:    self.learning_rate,
            rare_label_tol:   self.rare_label_tol,
        }
    }
}

/// What config.toml deserialises into.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    app:   AppConfig,
    model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub app:     AppConfig,
    pub model:   ModelConfig,
    pub version: String,
}

impl Config {
    /// Read and validate `config_path` and `version_path`.
    pub fn load(config_path: &Path, version_path: &Path) -> ModelResult<Self> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            ModelError::InvalidConfiguration(format!(
                "cannot read '{}': {e}",
                config_path.display()
            ))
        })?;
        let version = read_version(version_path)?;
        let config = Self::from_toml(&content, version)?;

        tracing::debug!(
            "Loaded config '{}' (package {} v{})",
            config_path.display(),
            config.app.package_name,
            config.version
        );
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str, version: impl Into<String>) -> ModelResult<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| ModelError::InvalidConfiguration(e.to_string()))?;

        let config = Self {
            app:     file.app,
            model:   file.model,
            version: version.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ModelResult<()> {
        let invalid = |msg: String| Err(ModelError::InvalidConfiguration(msg));
        let m = &self.model;

        if self.version.trim().is_empty() {
            return invalid("version string is empty".into());
        }
        if !is_plain_name(&self.version) {
            return invalid(format!("version '{}' must not contain path separators or '..'", self.version));
        }
        if self.app.pipeline_save_file.trim().is_empty() || self.app.pipeline_save_file.starts_with('.') {
            return invalid("pipeline_save_file must be a non-empty name not starting with '.'".into());
        }
        if !is_plain_name(&self.app.pipeline_save_file) {
            return invalid(format!(
                "pipeline_save_file '{}' must not contain path separators or '..'",
                self.app.pipeline_save_file
            ));
        }
        if self.app.training_data_file.trim().is_empty() {
            return invalid("training_data_file is empty".into());
        }
        if m.features.is_empty() {
            return invalid("no features configured".into());
        }
        if let Some(dup) = first_duplicate(&m.features) {
            return invalid(format!("feature '{dup}' is listed twice"));
        }
        if m.features.contains(&m.target) {
            return invalid(format!("target '{}' is also listed as a feature", m.target));
        }
        if let Some(stray) = m.categorical_vars.iter().find(|c| !m.features.contains(c)) {
            return invalid(format!("categorical var '{stray}' is not a feature"));
        }
        if !(m.test_size > 0.0 && m.test_size < 1.0) {
            return invalid(format!("test_size must lie in (0, 1), got {}", m.test_size));
        }
        if !(m.alpha >= 0.0 && m.alpha.is_finite()) {
            return invalid(format!("alpha must be >= 0, got {}", m.alpha));
        }
        if m.epochs == 0 {
            return invalid("epochs must be > 0".into());
        }
        if !(m.learning_rate > 0.0 && m.learning_rate.is_finite()) {
            return invalid(format!("learning_rate must be > 0, got {}", m.learning_rate));
        }
        if !(0.0..1.0).contains(&m.rare_label_tol) {
            return invalid(format!("rare_label_tol must lie in [0, 1), got {}", m.rare_label_tol));
        }
        Ok(())
    }

    /// Name of the artifact slot for the current version.
    pub fn artifact_name(&self) -> String {
        format!("{}{}", self.app.pipeline_save_file, self.version)
    }
}

/// Read the version file, trimming the trailing newline.
pub fn read_version(path: &Path) -> ModelResult<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ModelError::InvalidConfiguration(format!("cannot read version file '{}': {e}", path.display()))
    })?;
    Ok(raw.trim().to_string())
}

/// True if `name` can only ever name an entry directly inside a directory.
fn is_plain_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && !name.contains("..")
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    items.iter().find(|i| !seen.insert(i.as_str())).map(String::as_str)
}
