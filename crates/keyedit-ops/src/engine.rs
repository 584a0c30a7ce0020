//! The narrow call/callback interface to the external OpenPGP engine.
//!
//! The engine itself (process management, wire formats, cryptography) is an
//! external collaborator. This module pins down the only surface keyedit
//! needs from it: starting one-shot operations whose progress arrives
//! through I/O callbacks, servicing ready descriptors, cancelling, and the
//! synchronous line-protocol entry point for edit conversations.

use std::os::unix::io::RawFd;

use keyedit_core::session::EditConversation;
use keyedit_core::KeyHandle;
use secrecy::SecretString;
use thiserror::Error;

use crate::reactor::IoHooks;

/// Which readiness a watched descriptor waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoDirection {
    /// Call back when the descriptor is readable.
    Read,
    /// Call back when the descriptor is writable.
    Write,
}

/// A one-shot, event-driven engine operation.
///
/// These are the calls with native asynchronous entry points in the engine;
/// everything else goes through an edit conversation instead.
#[derive(Debug)]
pub enum EngineOp {
    /// Generate a new keypair from a rendered parameter block.
    ///
    /// The block carries the passphrase, so it stays wrapped until the
    /// engine consumes it.
    GenerateKey {
        /// The engine's key-parameter block.
        parameters: SecretString,
    },
    /// Change the passphrase protecting a key's secret part.
    ChangePassphrase {
        /// The key to re-protect.
        key: KeyHandle,
    },
    /// Add a subkey to a key.
    AddSubkey {
        /// The key to extend.
        key: KeyHandle,
        /// The engine's menu number for the subkey algorithm.
        algo_choice: u8,
        /// Key length in bits.
        bits: u32,
        /// Expiry as `YYYY-MM-DD`, or `0` for never.
        expires: String,
    },
    /// Add a user ID to a key.
    AddUid {
        /// The key to extend.
        key: KeyHandle,
        /// Real-name part of the uid.
        name: String,
        /// Email part, if any.
        email: Option<String>,
        /// Comment part, if any.
        comment: Option<String>,
    },
    /// Flag a user ID as primary.
    SetPrimaryUid {
        /// The owning key.
        key: KeyHandle,
        /// The uid's 1-based actual index.
        uid_index: u32,
    },
}

/// Failures reported by the engine itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine (or a context for it) could not be obtained.
    #[error("engine unavailable: {reason}")]
    Unavailable {
        /// Why the engine is unavailable.
        reason: String,
    },

    /// The operation was cancelled at the engine.
    #[error("cancelled by the engine")]
    Cancelled,

    /// The engine's own bounded passphrase retry loop was exhausted.
    #[error("bad passphrase")]
    BadPassphrase,

    /// Any other engine-reported failure.
    #[error("{message}")]
    Failed {
        /// The engine's description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Build a general engine failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// One engine context.
///
/// A context is exclusively owned by a single reactor run or a single edit
/// session until that completes; it is never driven by two at once. All
/// methods are synchronous: the asynchronous behavior of one-shot
/// operations comes entirely from the I/O hooks.
pub trait Engine: Send {
    /// Install the reactor as the target for descriptor registrations and
    /// start/finish notifications. Must be called before [`Engine::start`].
    fn set_io_hooks(&mut self, hooks: IoHooks);

    /// Begin a one-shot operation. Completion (success, failure or
    /// cancellation) is announced through the hooks' `finished`
    /// notification, never through this return value.
    ///
    /// # Errors
    ///
    /// Returns an error only when the operation could not be started at
    /// all.
    fn start(&mut self, op: EngineOp) -> Result<(), EngineError>;

    /// Service a descriptor the event loop reported ready. The engine does
    /// a bounded amount of I/O; spurious calls are harmless.
    fn io_ready(&mut self, fd: RawFd, direction: IoDirection);

    /// Ask the running operation to stop. The engine answers with a
    /// `finished` notification carrying [`EngineError::Cancelled`], which
    /// flows through the reactor like any other completion.
    fn cancel(&mut self);

    /// Select the key that will make signatures in the next edit session.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is unusable for signing.
    fn add_signer(&mut self, signer: &KeyHandle) -> Result<(), EngineError>;

    /// Run one blocking edit conversation against `key`.
    ///
    /// The engine drives its own read/write loop over the conversation
    /// pipe, calling [`EditConversation::interpret`] once per status line
    /// and stopping as soon as it returns an error. Conversation-level
    /// failures are recorded on the session; the return value only carries
    /// failures of the engine itself (for example an exhausted passphrase
    /// retry loop).
    ///
    /// # Errors
    ///
    /// Returns an error for engine-level failures of the conversation.
    fn edit_key(
        &mut self,
        key: &KeyHandle,
        conversation: &mut dyn EditConversation,
    ) -> Result<(), EngineError>;
}

/// Source of fresh engine contexts, one per operation.
pub trait EngineProvider: Send + Sync {
    /// Open a new context.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unavailable`] when no engine can be reached.
    fn context(&self) -> Result<Box<dyn Engine>, EngineError>;
}
