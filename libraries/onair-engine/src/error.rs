//! Error types for engine access

use thiserror::Error;

use crate::handle::EngineOp;

/// Failures raised by, or on behalf of, an embedded engine
///
/// These never travel past [`crate::PlayerAdapter`]; it logs them and keeps
/// the most recent one for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Engine did not answer the reachability probe
    #[error("Engine unreachable: {0}")]
    Unreachable(String),

    /// An engine call threw
    #[error("Engine call {op} failed: {message}")]
    CallFailed { op: EngineOp, message: String },

    /// Engine does not expose the operation
    #[error("Engine does not support {0}")]
    Unsupported(EngineOp),

    /// Engine reported a state code outside the known set
    #[error("Unknown engine state code: {0}")]
    UnknownState(i32),

    /// Host could not mount an engine instance
    #[error("Mount failed for {embed_id}: {message}")]
    MountFailed { embed_id: String, message: String },
}

impl EngineError {
    pub fn call_failed(op: EngineOp, message: impl Into<String>) -> Self {
        Self::CallFailed {
            op,
            message: message.into(),
        }
    }
}

/// Result type for engine calls
pub type Result<T> = std::result::Result<T, EngineError>;
