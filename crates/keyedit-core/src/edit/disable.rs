//! Enabling or disabling a key.

use std::io::Write;

use super::{put, PROMPT, QUIT};
use crate::error::EditError;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "disable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Command,
    Quit,
    Error,
}

/// Enables or disables a key. The toggle takes effect immediately, so the
/// conversation is just the command followed by quit, with no save answer.
#[derive(Debug)]
pub struct SetDisabled {
    state: State,
    command: &'static str,
}

impl SetDisabled {
    /// Machine that disables (`true`) or enables (`false`) the key.
    #[must_use]
    pub fn new(disabled: bool) -> Self {
        Self {
            state: State::Start,
            command: if disabled { "disable" } else { "enable" },
        }
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }
}

impl EditScript for SetDisabled {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Command => "command",
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
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => return Err(self.drift(status)),
            },
            State::Quit => return Err(self.drift(status)),
            State::Error => match cue {
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => State::Error,
            },
        };
        Ok(())
    }

    fn respond(&mut self, out: &mut dyn Write) -> Result<(), EditError> {
        match self.state {
            State::Command => put(out, self.command),
            State::Quit => put(out, QUIT),
            State::Start | State::Error => Ok(()),
        }
    }
}
