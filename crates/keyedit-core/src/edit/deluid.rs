//! Deleting a user ID (or photo).

use std::io::Write;

use super::{put, PROMPT, QUIT, SAVE, YES};
use crate::error::EditError;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "delete-uid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Select,
    Command,
    Confirm,
    Quit,
    Save,
    Error,
}

/// Deletes the uid at `index`. Photo uids live in the same numbering, so
/// the same machine deletes a photo.
#[derive(Debug)]
pub struct DeleteUid {
    state: State,
    index: u32,
}

impl DeleteUid {
    /// Machine that deletes uid `index`.
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

impl EditScript for DeleteUid {
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
                (StatusKind::GetBool, "keyedit.remove.uid.okay") => State::Confirm,
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => return Err(self.drift(status)),
            },
            State::Confirm => match cue {
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
            State::Command => put(out, "deluid"),
            State::Confirm => put(out, YES),
            State::Quit => put(out, QUIT),
            State::Save => put(out, YES),
            State::Start | State::Error => Ok(()),
        }
    }
}
