//! Error taxonomy for terrain generation.
//!
//! The pipeline never aborts a chunk: stages degrade (fewer rivers, no
//! hydraulic erosion, fallback biome) rather than fail. Errors surface at
//! the edges only: configuration problems at construction, resource
//! failures from the renderer collaborator.

use crate::pipeline::PipelineStage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    /// Intent out of range or settings failing invariant enforcement.
    /// Reported at construction; the caller must correct the input.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A stage began without its prerequisites complete.
    #[error("pipeline stage '{}' began without prerequisites", .0.name())]
    PrerequisiteMissing(PipelineStage),

    /// Mesh or texture upload refused by the renderer collaborator.
    /// Propagated upward; the chunk is marked unloaded.
    #[error("renderer resource failure: {0}")]
    Resource(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_stage() {
        let err = GenError::PrerequisiteMissing(PipelineStage::Rivers);
        assert!(err.to_string().contains("river generation"));
    }
}
