// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Concerns that touch the filesystem on behalf of the upper
// layers:
//
//   artifact_store.rs - Versioned pipeline persistence.
//                       Estimator weights go through burn's
//                       NamedMpkFileRecorder, the fitted
//                       preprocessing state through serde_json.
//                       Storing a new version evicts the old
//                       ones.
//
// Reference: Rust Book §9 (Error Handling)
//            Burn Book §5 (Checkpointing)

/// Versioned save / load / cleanup of fitted pipelines
pub mod artifact_store;
