//! Deleting a subkey.

use std::io::Write;

use super::{put, PROMPT, QUIT, SAVE, YES};
use crate::error::EditError;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "delete-subkey";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Select,
    Command,
    Confirm,
    Quit,
    Error,
}

/// Deletes the subkey at `index` after confirming the removal question.
#[derive(Debug)]
pub struct DeleteSubkey {
    state: State,
    index: u32,
}

impl DeleteSubkey {
    /// Machine that deletes subkey `index`.
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self {
            state: State::Start,
            index,
        }
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }
}

impl EditScript for DeleteSubkey {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Select => "select",
            State::Command => "command",
            State::Confirm => "confirm",
            State::Quit => "quit",
            State::Error => "error",
        }
    }

    fn transit(&mut self, status: &StatusLine) -> Result<(), EditError> {
        let cue = (status.kind(), status.args.as_str());
        self.state = match self.state {
            State::Start => match cue {
                (StatusKind::GetLine, PROMPT) => State::Select,
                _ => return Err(self.drift(status)),
            },
            State::Select => match cue {
                (StatusKind::GetLine, PROMPT) => State::Command,
                _ => return Err(self.drift(status)),
            },
            State::Command => match cue {
                (StatusKind::GetBool, "keyedit.remove.subkey.okay") => State::Confirm,
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => return Err(self.drift(status)),
            },
            // The prompt always follows the confirmation.
            State::Confirm => State::Quit,
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
            State::Select => put(out, format_args!("key {}", self.index)),
            State::Command => put(out, "delkey"),
            State::Confirm => put(out, YES),
            State::Quit => put(out, QUIT),
            State::Start | State::Error => Ok(()),
        }
    }
}
