//! Changing the owner trust of a key.

use std::io::Write;

use super::{put, PROMPT, QUIT, SAVE, YES};
use crate::error::EditError;
use crate::params::TrustLevel;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "trust";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Command,
    Value,
    Confirm,
    Quit,
    Error,
}

/// Sets the owner trust to a new level.
///
/// Only ultimate trust triggers an extra confirmation question; every other
/// level goes straight from the value back to the prompt.
#[derive(Debug)]
pub struct SetTrust {
    state: State,
    level: TrustLevel,
}

impl SetTrust {
    /// Machine for setting the owner trust to `level`.
    #[must_use]
    pub fn new(level: TrustLevel) -> Self {
        Self {
            state: State::Start,
            level,
        }
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }
}

impl EditScript for SetTrust {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Command => "command",
            State::Value => "value",
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
                (StatusKind::GetLine, "edit_ownertrust.value") => State::Value,
                _ => return Err(self.drift(status)),
            },
            State::Value => match cue {
                (StatusKind::GetLine, PROMPT) => State::Quit,
                (StatusKind::GetBool, "edit_ownertrust.set_ultimate.okay") => State::Confirm,
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
            State::Command => put(out, "trust"),
            State::Value => put(out, self.level.menu_choice()),
            State::Confirm => put(out, YES),
            State::Quit => put(out, QUIT),
            State::Start | State::Error => Ok(()),
        }
    }
}
