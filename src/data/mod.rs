// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between the CSV file on disk and the rows handed
// to the trainable pipeline:
//
//   train.csv
//       │
//       ▼
//   CsvDatasetSource  → reads cells, applies renames
//       │
//       ▼
//   train_test_split  → seeded train / holdout partition
//       │
//       ▼
//   log_transform     → ln(price) for the training target
//
// Each module is responsible for exactly one step.

/// In-memory table type shared by every layer
pub mod dataset;

/// Reads CSV files from the datasets directory
pub mod loader;

/// Deterministic train/holdout partition
pub mod splitter;

/// Log transform of the prediction target and its inverse
pub mod target;
