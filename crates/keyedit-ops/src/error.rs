//! Operation-level errors.

use keyedit_core::EditError;
use thiserror::Error;

use crate::engine::EngineError;

/// Errors surfaced by the operation facade.
///
/// `Cancelled` is a first-class terminal outcome: callers translate it into
/// "the user stopped this", never into an error dialog. Engine-reported and
/// protocol-drift errors terminate the operation immediately; there are no
/// retries at this layer.
#[derive(Debug, Error)]
pub enum OpError {
    /// The edit conversation ended in an error.
    #[error(transparent)]
    Edit(#[from] EditError),

    /// The engine reported a failure of its own.
    #[error("engine failure: {message}")]
    Engine {
        /// The engine's description of the failure.
        message: String,
    },

    /// No engine context could be obtained.
    #[error("no usable engine available: {reason}")]
    MissingEngine {
        /// Why the engine is unavailable.
        reason: String,
    },

    /// The operation was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// A parameter was rejected before the engine was involved.
    #[error("invalid parameter: {reason}")]
    InvalidParam {
        /// What was wrong with the parameter.
        reason: String,
    },

    /// An I/O failure outside the engine conversation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A multi-item batch stopped early; `completed` items finished before
    /// the failure.
    #[error("batch stopped after {completed} item(s)")]
    Interrupted {
        /// Number of items completed before the stop.
        completed: usize,
        /// What stopped the batch.
        #[source]
        source: Box<OpError>,
    },
}

impl OpError {
    /// Build an invalid-parameter error.
    #[must_use]
    pub fn invalid_param(reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            reason: reason.into(),
        }
    }

    /// Whether this outcome is a cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Interrupted { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

impl From<EngineError> for OpError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unavailable { reason } => Self::MissingEngine { reason },
            EngineError::Cancelled => Self::Cancelled,
            EngineError::BadPassphrase => Self::Edit(EditError::BadPassphrase),
            EngineError::Failed { message } => Self::Engine { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_onto_the_taxonomy() {
        assert!(matches!(
            OpError::from(EngineError::Cancelled),
            OpError::Cancelled
        ));
        assert!(matches!(
            OpError::from(EngineError::BadPassphrase),
            OpError::Edit(EditError::BadPassphrase)
        ));
        assert!(matches!(
            OpError::from(EngineError::Unavailable {
                reason: "not installed".into()
            }),
            OpError::MissingEngine { .. }
        ));
    }

    #[test]
    fn interrupted_batches_propagate_cancellation() {
        let err = OpError::Interrupted {
            completed: 3,
            source: Box::new(OpError::Cancelled),
        };
        assert!(err.is_cancelled());

        let err = OpError::Interrupted {
            completed: 1,
            source: Box::new(OpError::Engine {
                message: "broken".into(),
            }),
        };
        assert!(!err.is_cancelled());
    }
}
