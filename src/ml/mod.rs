// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All burn-specific code lives here. Other layers see only
// PricePipeline (through the TrainablePipeline trait) and the
// LinearRegressor type the artifact store records.
//
//   features.rs - imputation, rare-label grouping, ordinal
//                 encoding, min-max scaling
//   model.rs    - the linear estimator module and backends
//   trainer.rs  - full-batch Adam loop on the Lasso objective
//   pipeline.rs - transformer + estimator behind fit/predict

/// Fitted column encoders and scalers
pub mod features;

/// Linear estimator module and backend aliases
pub mod model;

/// Training loop and batch prediction
pub mod trainer;

/// PricePipeline, the TrainablePipeline implementation
pub mod pipeline;
