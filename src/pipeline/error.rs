//! Stage error taxonomy
//!
//! Stages return `Result<_, StageError>`; the orchestrator decides per stage
//! whether a failure hard-stops the run or degrades it. Errors never
//! propagate past the orchestrator boundary.

use crate::knowledge::KnowledgeError;
use crate::model::ModelError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// A required input or upstream artifact is missing
    #[error("missing input: {0}")]
    Input(String),

    /// A model or cache collaborator failed
    #[error("dependency failure: {0}")]
    Dependency(String),

    /// A pure-transform stage could not render its output
    #[error("format failure: {0}")]
    Format(String),
}

impl From<ModelError> for StageError {
    fn from(e: ModelError) -> Self {
        StageError::Dependency(e.to_string())
    }
}

impl From<KnowledgeError> for StageError {
    fn from(e: KnowledgeError) -> Self {
        StageError::Dependency(e.to_string())
    }
}
