// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only. The use cases hold a Config and
// their collaborators and call them in a fixed order:
//
//   config.rs           - config.toml + VERSION → Config
//   train_use_case.rs   - load → split → log target → fit → store
//   predict_use_case.rs - stored pipeline → predictions in price space
//
// No estimator math and no printing here; the CLI (Layer 1)
// reports results, the lower layers do the work.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

pub mod config;

// The training workflow
pub mod train_use_case;

// Scoring with a stored pipeline
pub mod predict_use_case;
