//! Making a user ID (or photo) the primary one.

use std::io::Write;

use super::{put, PROMPT, QUIT, SAVE, YES};
use crate::error::EditError;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "primary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Select,
    Command,
    Quit,
    Save,
    Error,
}

/// Marks the uid at `index` as primary. Photo uids live in the same
/// numbering, so the same machine makes a photo primary.
#[derive(Debug)]
pub struct SetPrimary {
    state: State,
    index: u32,
}

impl SetPrimary {
    /// Machine that marks uid `index` as primary.
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

impl EditScript for SetPrimary {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Select => "select",
            State::Command => "command",
            State::Quit => "quit",
            State::Save => "save",
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
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => return Err(self.drift(status)),
            },
            State::Quit => match cue {
                (StatusKind::GetBool, SAVE) => State::Save,
                _ => return Err(self.drift(status)),
            },
            State::Save => return Err(self.drift(status)),
            State::Error => match cue {
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => State::Error,
            },
        };
        Ok(())
    }

    fn respond(&mut self, out: &mut dyn Write) -> Result<(), EditError> {
        match self.state {
            State::Select => put(out, format_args!("uid {}", self.index)),
            State::Command => put(out, "primary"),
            State::Quit => put(out, QUIT),
            State::Save => put(out, YES),
            State::Start | State::Error => Ok(()),
        }
    }
}
