// ============================================================
// Layer 3 - Trained Artifact
// ============================================================
// The deliverable of one training run: the fitted pipeline and
// the version tag it is filed under. The orchestrator moves the
// artifact into the sink, so nothing keeps a handle to it after
// persistence.

/// A fitted pipeline tagged with the package version it was built by.
#[derive(Debug, Clone)]
pub struct TrainedArtifact<P> {
    pub pipeline: P,
    pub version:  String,
}

impl<P> TrainedArtifact<P> {
    pub fn new(pipeline: P, version: impl Into<String>) -> Self {
        Self {
            pipeline,
            version: version.into(),
        }
    }
}
