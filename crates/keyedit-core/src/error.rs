//! Structured errors for edit conversations.

use thiserror::Error;

use crate::status::StatusLine;

/// Errors that can terminate an edit conversation.
///
/// `Unexpected` is the fail-loud default for any (state, status) pair a
/// transition table does not recognize: a conversation must end with an
/// explicit error rather than hang on protocol drift.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The engine exhausted its own passphrase retry loop.
    #[error("engine rejected the passphrase")]
    BadPassphrase,

    /// The requested change is already in place (e.g. the uid is already
    /// signed by this key). Distinguishable from a general failure so the
    /// caller can decide whether it counts as success.
    #[error("the requested change was already applied")]
    AlreadyDone,

    /// The engine rejected a supplied file (e.g. an unreadable or
    /// wrongly-formatted photo) by re-requesting it.
    #[error("engine rejected the supplied file")]
    FileRejected,

    /// Protocol drift: a status line no transition covers.
    #[error("unexpected status `{status}` during {task} ({state})")]
    Unexpected {
        /// The task whose machine was running.
        task: &'static str,
        /// The state the machine was in.
        state: &'static str,
        /// The offending status line, rendered as `KEYWORD args`.
        status: String,
    },

    /// Writing an answer line failed.
    #[error("failed to write response line: {0}")]
    Write(String),

    /// The engine reported a failure of its own.
    #[error("engine failure: {0}")]
    Engine(String),
}

impl EditError {
    /// Build the protocol-drift error for an unrecognized status line.
    #[must_use]
    pub fn unexpected(task: &'static str, state: &'static str, status: &StatusLine) -> Self {
        Self::Unexpected {
            task,
            state,
            status: status.to_string(),
        }
    }
}
