// ============================================================
// Layer 4 - Dataset Loader
// ============================================================
// Reads a CSV file with a header row from the datasets
// directory and turns it into a Dataset.
//
// Cell parsing (see Value::parse):
//   ""  / "NA"   → Missing
//   "1710"       → Number(1710.0)
//   "RL"         → Category("RL")
//
// Column renames from the configuration are applied straight
// after reading, so every later stage only sees the new names
// (e.g. "1stFlrSF" becomes "FirstFlrSF").
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use std::collections::BTreeMap;
use std::path::PathBuf;

use csv::ReaderBuilder;

use crate::data::dataset::{Dataset, Value};
use crate::domain::error::{ModelError, ModelResult};
use crate::domain::traits::DatasetSource;

/// Loads `<dir>/<identifier>` as CSV.
/// Implements the DatasetSource trait from Layer 3.
pub struct CsvDatasetSource {
    dir:     PathBuf,
    renames: BTreeMap<String, String>,
}

impl CsvDatasetSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir:     dir.into(),
            renames: BTreeMap::new(),
        }
    }

    /// Rename columns (old name → new name) after loading.
    pub fn with_renames(mut self, renames: BTreeMap<String, String>) -> Self {
        self.renames = renames;
        self
    }
}

impl DatasetSource for CsvDatasetSource {
    fn load(&self, identifier: &str) -> ModelResult<Dataset> {
        let path = self.dir.join(identifier);
        tracing::info!("Loading dataset from '{}'", path.display());

        // The reader owns the file handle and closes it when dropped,
        // on the error paths below included.
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| ModelError::data_unavailable(identifier, e))?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| ModelError::data_unavailable(identifier, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ModelError::data_unavailable(identifier, e))?;
            rows.push(record.iter().map(Value::parse).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Err(ModelError::data_unavailable(identifier, "file has no data rows"));
        }

        let mut dataset = Dataset::new(columns, rows)?;
        dataset.rename_columns(&self.renames);

        tracing::info!(
            "Loaded {} rows x {} columns from '{}'",
            dataset.len(),
            dataset.columns().len(),
            identifier
        );
        Ok(dataset)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) {
        fs::write(dir.path().join(name), body).unwrap();
    }

    #[test]
    fn test_loads_mixed_cells() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            "train.csv",
            "Id,MSZoning,LotFrontage,SalePrice\n\
             1,RL,65,208500\n\
             2,RM,NA,181500\n",
        );

        let ds = CsvDatasetSource::new(dir.path()).load("train.csv").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns(), &["Id", "MSZoning", "LotFrontage", "SalePrice"]);
        assert_eq!(ds.rows()[0][1], Value::Category("RL".into()));
        assert_eq!(ds.rows()[1][2], Value::Missing);
        assert_eq!(ds.target_values("SalePrice").unwrap(), vec![208500.0, 181500.0]);
    }

    #[test]
    fn test_applies_renames() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "train.csv", "1stFlrSF,SalePrice\n856,208500\n");

        let renames = BTreeMap::from([("1stFlrSF".to_string(), "FirstFlrSF".to_string())]);
        let ds = CsvDatasetSource::new(dir.path())
            .with_renames(renames)
            .load("train.csv")
            .unwrap();
        assert!(ds.require_columns(&["FirstFlrSF", "SalePrice"]).is_ok());
    }

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvDatasetSource::new(dir.path()).load("nope.csv").unwrap_err();
        assert!(matches!(err, ModelError::DataUnavailable { ref identifier, .. } if identifier == "nope.csv"));
    }

    #[test]
    fn test_header_only_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "empty.csv", "a,b\n");
        assert!(matches!(
            CsvDatasetSource::new(dir.path()).load("empty.csv"),
            Err(ModelError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_ragged_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "bad.csv", "a,b\n1,2\n3\n");
        assert!(matches!(
            CsvDatasetSource::new(dir.path()).load("bad.csv"),
            Err(ModelError::DataUnavailable { .. })
        ));
    }
}
