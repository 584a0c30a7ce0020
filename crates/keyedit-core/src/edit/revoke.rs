//! Revoking a subkey with a reason and free-text description.

use std::io::Write;

use super::{put, PROMPT, QUIT, SAVE, YES};
use crate::error::EditError;
use crate::params::RevokeReason;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "revoke-subkey";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Select,
    Command,
    Confirm,
    Reason,
    Description,
    EndDescription,
    Quit,
    Error,
}

/// Revokes the subkey at `index`.
///
/// The revocation reason is two-part free text: a numeric reason code, then
/// one description line; when the engine asks for more text, a blank line
/// terminates the description. The index is sent verbatim with no bounds
/// validation, so an out-of-range selection surfaces as an engine error.
#[derive(Debug)]
pub struct RevokeSubkey {
    state: State,
    index: u32,
    reason: RevokeReason,
    description: String,
}

impl RevokeSubkey {
    /// Machine that revokes subkey `index` for `reason`.
    #[must_use]
    pub fn new(index: u32, reason: RevokeReason, description: impl Into<String>) -> Self {
        Self {
            state: State::Start,
            index,
            reason,
            description: description.into(),
        }
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }
}

impl EditScript for RevokeSubkey {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Select => "select",
            State::Command => "command",
            State::Confirm => "confirm",
            State::Reason => "reason",
            State::Description => "description",
            State::EndDescription => "end-description",
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
                (StatusKind::GetBool, "keyedit.revoke.subkey.okay") => State::Confirm,
                _ => return Err(self.drift(status)),
            },
            State::Confirm => match cue {
                (StatusKind::GetLine, "ask_revocation_reason.code") => State::Reason,
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => return Err(self.drift(status)),
            },
            State::Reason => match cue {
                (StatusKind::GetLine, "ask_revocation_reason.text") => State::Description,
                _ => return Err(self.drift(status)),
            },
            State::Description => match cue {
                (StatusKind::GetLine, "ask_revocation_reason.text") => State::EndDescription,
                (StatusKind::GetBool, "ask_revocation_reason.okay") => State::Confirm,
                _ => return Err(self.drift(status)),
            },
            State::EndDescription => match cue {
                (StatusKind::GetBool, "ask_revocation_reason.okay") => State::Confirm,
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
            State::Select => put(out, format_args!("key {}", self.index)),
            State::Command => put(out, "revkey"),
            State::Confirm => put(out, YES),
            State::Reason => put(out, self.reason.code()),
            State::Description => put(out, &self.description),
            // Blank line ends the description.
            State::EndDescription => put(out, ""),
            State::Quit => put(out, QUIT),
            State::Start | State::Error => Ok(()),
        }
    }
}
