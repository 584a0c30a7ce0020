//! Changing the expiration date of a subkey (or the primary key).

use std::io::Write;

use chrono::NaiveDate;

use super::{put, PROMPT, QUIT, SAVE, YES};
use crate::error::EditError;
use crate::params::expiry_argument;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "expire";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Select,
    Command,
    Date,
    Quit,
    Save,
    Error,
}

/// Sets the expiry of the subkey at `index` (0 addresses the primary key)
/// to a date, or to "never" when no date is given.
#[derive(Debug)]
pub struct SetExpiry {
    state: State,
    index: u32,
    expires: Option<NaiveDate>,
}

impl SetExpiry {
    /// Machine for setting the expiry of subkey `index`.
    #[must_use]
    pub fn new(index: u32, expires: Option<NaiveDate>) -> Self {
        Self {
            state: State::Start,
            index,
            expires,
        }
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }
}

impl EditScript for SetExpiry {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Select => "select",
            State::Command => "command",
            State::Date => "date",
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
                (StatusKind::GetLine, "keygen.valid") => State::Date,
                _ => return Err(self.drift(status)),
            },
            State::Date => match cue {
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
            State::Select => put(out, format_args!("key {}", self.index)),
            State::Command => put(out, "expire"),
            State::Date => put(out, expiry_argument(self.expires)),
            State::Quit => put(out, QUIT),
            State::Save => put(out, YES),
            State::Start | State::Error => Ok(()),
        }
    }
}
