//! Designating another key as a revoker.

use std::io::Write;

use super::{put, PROMPT, QUIT, SAVE, YES};
use crate::error::EditError;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "add-revoker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Command,
    Select,
    Confirm,
    Quit,
    Error,
}

/// Adds a designated revoker, identified by key id. Appointing a revoker is
/// irreversible, so the engine always asks for confirmation.
#[derive(Debug)]
pub struct AddRevoker {
    state: State,
    revoker: String,
}

impl AddRevoker {
    /// Machine that appoints the key identified by `revoker`.
    #[must_use]
    pub fn new(revoker: impl Into<String>) -> Self {
        Self {
            state: State::Start,
            revoker: revoker.into(),
        }
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }
}

impl EditScript for AddRevoker {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Command => "command",
            State::Select => "select",
            State::Confirm => "confirm",
            State::Quit => "quit",
            State::Error => "error",
        }
    }

    fn transit(&mut self, status: &StatusLine) -> Result<(), EditError> {
        let cue = (status.kind(), status.args.as_str());
        self.state = match self.state {
            State::Start => match cue {
                (StatusKind::GetLine, PROMPT) => State::Command,
                _ => return Err(self.drift(status)),
            },
            State::Command => match cue {
                (StatusKind::GetLine, "keyedit.add_revoker") => State::Select,
                _ => return Err(self.drift(status)),
            },
            State::Select => match cue {
                (StatusKind::GetBool, "keyedit.add_revoker.okay") => State::Confirm,
                _ => return Err(self.drift(status)),
            },
            State::Confirm => match cue {
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => return Err(self.drift(status)),
            },
            State::Quit => match cue {
                (StatusKind::GetBool, SAVE) => State::Confirm,
                _ => return Err(self.drift(status)),
            },
            State::Error => match cue {
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => State::Error,
            },
        };
        Ok(())
    }

    fn respond(&mut self, out: &mut dyn Write) -> Result<(), EditError> {
        match self.state {
            State::Command => put(out, "addrevoker"),
            State::Select => put(out, &self.revoker),
            State::Confirm => put(out, YES),
            State::Quit => put(out, QUIT),
            State::Start | State::Error => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::support::run;

    #[test]
    fn appoints_a_revoker_with_confirmation_and_save() {
        let script = AddRevoker::new("8E2A59CE6D3A8F2B");
        let statuses = [
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "keyedit.add_revoker"),
            ("GET_BOOL", "keyedit.add_revoker.okay"),
            ("GET_LINE", "keyedit.prompt"),
            ("GET_BOOL", "keyedit.save.okay"),
        ];
        let (out, error) = run(script, &statuses);
        assert_eq!(out, "addrevoker\n8E2A59CE6D3A8F2B\nY\nquit\nY\n");
        assert!(error.is_none());
    }

    #[test]
    fn missing_confirmation_is_drift() {
        let script = AddRevoker::new("8E2A59CE6D3A8F2B");
        let statuses = [
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "keyedit.add_revoker"),
            ("GET_LINE", "keyedit.prompt"),
        ];
        let (out, error) = run(script, &statuses);
        assert_eq!(out, "addrevoker\n8E2A59CE6D3A8F2B\n");
        assert!(matches!(error, Some(EditError::Unexpected { .. })));
    }
}
