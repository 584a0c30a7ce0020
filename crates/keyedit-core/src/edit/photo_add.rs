//! Attaching a photo to a key.

use std::io::Write;
use std::path::PathBuf;

use super::{put, PROMPT, QUIT, SAVE, YES};
use crate::error::EditError;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "add-photo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Command,
    Uri,
    Big,
    Quit,
    Save,
    Error,
}

/// Adds the image at a file path as a photo uid.
///
/// Oversized images trigger a confirmation question, answered yes. The
/// engine re-requesting the filename means it rejected the file; that is a
/// distinct terminal [`EditError::FileRejected`], never a retry loop.
#[derive(Debug)]
pub struct AddPhoto {
    state: State,
    filename: PathBuf,
}

impl AddPhoto {
    /// Machine that attaches the image at `filename`.
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            state: State::Start,
            filename: filename.into(),
        }
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }

    fn rejected(&mut self) -> EditError {
        self.state = State::Error;
        EditError::FileRejected
    }
}

impl EditScript for AddPhoto {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Command => "command",
            State::Uri => "uri",
            State::Big => "big",
            State::Quit => "quit",
            State::Save => "save",
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
                (StatusKind::GetLine, "photoid.jpeg.add") => State::Uri,
                _ => return Err(self.drift(status)),
            },
            State::Uri => match cue {
                (StatusKind::GetLine, PROMPT) => State::Quit,
                (StatusKind::GetBool, "photoid.jpeg.size") => State::Big,
                // Asked for the file again: the engine could not use it.
                (StatusKind::GetLine, "photoid.jpeg.add") => return Err(self.rejected()),
                _ => return Err(self.drift(status)),
            },
            State::Big => match cue {
                (StatusKind::GetLine, PROMPT) => State::Quit,
                (StatusKind::GetLine, "photoid.jpeg.add") => return Err(self.rejected()),
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
            State::Command => put(out, "addphoto"),
            State::Uri => put(out, self.filename.display()),
            State::Big => put(out, YES),
            State::Quit => put(out, QUIT),
            State::Save => put(out, YES),
            State::Start | State::Error => Ok(()),
        }
    }
}
