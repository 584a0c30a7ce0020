//! The generic edit-session interpreter.
//!
//! One [`EditSession`] conducts exactly one conversation: for every status
//! line the engine emits, it asks the task's [`EditScript`] for the next
//! state, then for the answer to write back. The session records the first
//! error a machine reports and keeps returning it unchanged for the rest of
//! the conversation, including at EOF.
//!
//! The engine-integration layer alone is responsible for transmitting the
//! written lines and for calling [`EditConversation::interpret`] once per
//! received status line; nothing here blocks.

use std::io::Write;

use crate::error::EditError;
use crate::status::{StatusKind, StatusLine};

/// A task-specific state machine for one key-editing conversation.
///
/// Implementations own their state enum and payload. `transit` consumes one
/// actionable status line and moves to the next state, or reports an error
/// (entering a terminal error state whose response is "quit" or nothing, so
/// a lenient engine still sees the conversation wound down). `respond`
/// writes the newline-terminated answer for the current state.
pub trait EditScript: Send {
    /// Short task name used in errors and traces.
    fn task(&self) -> &'static str;

    /// Name of the current state, for diagnostics.
    fn state_name(&self) -> &'static str;

    /// Advance the machine for one actionable status line.
    fn transit(&mut self, status: &StatusLine) -> Result<(), EditError>;

    /// Write the answer lines for the current state. Zero lines is valid.
    fn respond(&mut self, out: &mut dyn Write) -> Result<(), EditError>;
}

/// Object-safe view of a session, used by engine integrations to drive any
/// task without knowing its concrete machine type.
pub trait EditConversation: Send {
    /// Consume one status line and return the session's error state.
    ///
    /// A `Some` return means the conversation is terminal; the engine
    /// integration should stop feeding status lines.
    fn interpret(&mut self, status: &StatusLine, out: &mut dyn Write) -> Option<EditError>;

    /// The recorded error, if the session is terminal.
    fn failure(&self) -> Option<&EditError>;
}

/// One edit conversation: a machine plus the first error it reported.
///
/// Created immediately before a session starts and discarded when it ends.
#[derive(Debug)]
pub struct EditSession<S> {
    script: S,
    error: Option<EditError>,
}

impl<S: EditScript> EditSession<S> {
    /// Wrap a task machine into a fresh session.
    #[must_use]
    pub fn new(script: S) -> Self {
        Self {
            script,
            error: None,
        }
    }

    /// Borrow the underlying machine.
    #[must_use]
    pub fn script(&self) -> &S {
        &self.script
    }

    /// Take the machine back out, e.g. to collect results it accumulated.
    #[must_use]
    pub fn into_script(self) -> S {
        self.script
    }
}

impl<S: EditScript> EditConversation for EditSession<S> {
    fn interpret(&mut self, status: &StatusLine, out: &mut dyn Write) -> Option<EditError> {
        // EOF and housekeeping lines never touch the machine.
        if status.is_eof() || status.kind() == StatusKind::Housekeeping {
            return self.error.clone();
        }

        tracing::trace!(
            task = self.script.task(),
            state = self.script.state_name(),
            status = %status,
            "edit status"
        );

        // The machine still observes status lines after an error (its error
        // state transitions toward "quit"), but the first error sticks.
        if let Err(err) = self.script.transit(status) {
            if self.error.is_none() {
                tracing::debug!(task = self.script.task(), error = %err, "edit session failed");
                self.error = Some(err);
            }
        }

        if self.error.is_none() {
            if let Err(err) = self.script.respond(out) {
                self.error = Some(err);
            }
        }

        self.error.clone()
    }

    fn failure(&self) -> Option<&EditError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal two-step machine used to exercise the interpreter contract.
    #[derive(Debug)]
    struct Echo {
        answered: bool,
        fail_on: Option<&'static str>,
    }

    impl EditScript for Echo {
        fn task(&self) -> &'static str {
            "echo"
        }

        fn state_name(&self) -> &'static str {
            if self.answered {
                "done"
            } else {
                "start"
            }
        }

        fn transit(&mut self, status: &StatusLine) -> Result<(), EditError> {
            if Some(status.args.as_str()) == self.fail_on {
                return Err(EditError::unexpected("echo", self.state_name(), status));
            }
            self.answered = true;
            Ok(())
        }

        fn respond(&mut self, out: &mut dyn Write) -> Result<(), EditError> {
            writeln!(out, "ok").map_err(|err| EditError::Write(err.to_string()))
        }
    }

    #[test]
    fn housekeeping_is_ignored() {
        let mut session = EditSession::new(Echo {
            answered: false,
            fail_on: None,
        });
        let mut out = Vec::new();
        let err = session.interpret(&StatusLine::new("GOT_IT", ""), &mut out);
        assert!(err.is_none());
        assert!(out.is_empty());
        assert!(!session.script().answered);
    }

    #[test]
    fn actionable_status_advances_and_responds() {
        let mut session = EditSession::new(Echo {
            answered: false,
            fail_on: None,
        });
        let mut out = Vec::new();
        let err = session.interpret(&StatusLine::new("GET_LINE", "keyedit.prompt"), &mut out);
        assert!(err.is_none());
        assert_eq!(out, b"ok\n");
    }

    #[test]
    fn eof_after_terminal_error_is_idempotent() {
        let mut session = EditSession::new(Echo {
            answered: false,
            fail_on: Some("boom"),
        });
        let mut out = Vec::new();

        let first = session.interpret(&StatusLine::new("GET_LINE", "boom"), &mut out);
        assert!(matches!(first, Some(EditError::Unexpected { .. })));
        assert!(out.is_empty(), "no answer may follow an error");

        let at_eof = session.interpret(&StatusLine::eof(), &mut out);
        assert_eq!(at_eof, first);
        let again = session.interpret(&StatusLine::eof(), &mut out);
        assert_eq!(again, first);
    }

    #[test]
    fn first_error_sticks() {
        let mut session = EditSession::new(Echo {
            answered: false,
            fail_on: Some("boom"),
        });
        let mut out = Vec::new();
        let first = session.interpret(&StatusLine::new("GET_LINE", "boom"), &mut out);
        // A later, different status must not replace the recorded error.
        let second = session.interpret(&StatusLine::new("GET_LINE", "keyedit.prompt"), &mut out);
        assert_eq!(first, second);
        assert!(out.is_empty());
    }
}
