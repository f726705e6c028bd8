// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits that name the core concepts:
// the error taxonomy, the trained artifact, and the three
// collaborator seams the orchestrator is written against.
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - Only structs, enums and traits

// Every failure a run can surface
pub mod error;

// A fitted pipeline plus its version tag
pub mod artifact;

// DatasetSource, TrainablePipeline, ArtifactSink
pub mod traits;
