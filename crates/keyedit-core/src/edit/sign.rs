//! Signing a user ID (or all of them) with a selected key.

use std::io::Write;

use super::{put, PROMPT, QUIT, SAVE, NO, YES};
use crate::error::EditError;
use crate::params::{SignCheck, SignOptions};
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "sign";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Uid,
    Command,
    Expire,
    Confirm,
    Check,
    Quit,
    Error,
}

/// Signs the uid at `index`, or every uid when `index` is 0 (selecting uid 0
/// clears the selection, which makes the engine ask the sign-all question).
///
/// The local and no-revoke options are folded into the command name itself;
/// the expire option answers the signature-expiry question when the engine
/// asks it. A re-prompt straight after the sign command means the uid is
/// already signed by this key, reported as [`EditError::AlreadyDone`].
#[derive(Debug)]
pub struct SignUid {
    state: State,
    index: u32,
    command: String,
    expire: bool,
    check: SignCheck,
}

impl SignUid {
    /// Machine for signing `index` with the given check level and options.
    #[must_use]
    pub fn new(index: u32, check: SignCheck, options: SignOptions) -> Self {
        Self {
            state: State::Start,
            index,
            command: options.command(),
            expire: options.expires,
            check,
        }
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }
}

impl EditScript for SignUid {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Uid => "uid",
            State::Command => "command",
            State::Expire => "expire",
            State::Confirm => "confirm",
            State::Check => "check",
            State::Quit => "quit",
            State::Error => "error",
        }
    }

    fn transit(&mut self, status: &StatusLine) -> Result<(), EditError> {
        let cue = (status.kind(), status.args.as_str());
        self.state = match self.state {
            State::Start => match cue {
                (StatusKind::GetLine, PROMPT) => State::Uid,
                _ => return Err(self.drift(status)),
            },
            State::Uid => match cue {
                (StatusKind::GetLine, PROMPT) => State::Command,
                _ => return Err(self.drift(status)),
            },
            State::Command => match cue {
                (StatusKind::GetBool, "keyedit.sign_all.okay") => State::Confirm,
                (StatusKind::GetBool, "sign_uid.okay") => State::Confirm,
                (StatusKind::GetLine, "sign_uid.expire") => State::Expire,
                (StatusKind::GetLine, "sign_uid.class") => State::Check,
                // Back at the prompt without any question: already signed.
                (StatusKind::GetLine, PROMPT) => {
                    self.state = State::Error;
                    return Err(EditError::AlreadyDone);
                }
                _ => return Err(self.drift(status)),
            },
            State::Expire => match cue {
                (StatusKind::GetLine, "sign_uid.class") => State::Check,
                _ => return Err(self.drift(status)),
            },
            State::Confirm => match cue {
                (StatusKind::GetLine, "sign_uid.class") => State::Check,
                (StatusKind::GetBool, "sign_uid.okay") => State::Confirm,
                (StatusKind::GetLine, "sign_uid.expire") => State::Expire,
                (StatusKind::GetLine, PROMPT) => State::Quit,
                _ => return Err(self.drift(status)),
            },
            State::Check => match cue {
                (StatusKind::GetBool, "sign_uid.okay") => State::Confirm,
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
            State::Uid => put(out, format_args!("uid {}", self.index)),
            State::Command => put(out, &self.command),
            State::Expire => put(out, if self.expire { YES } else { NO }),
            State::Confirm => put(out, YES),
            State::Check => put(out, self.check.class()),
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
    fn signs_one_uid_with_class_and_confirmation() {
        let script = SignUid::new(2, SignCheck::Careful, SignOptions::default());
        let statuses = [
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "sign_uid.class"),
            ("GET_BOOL", "sign_uid.okay"),
            ("GET_LINE", "keyedit.prompt"),
            ("GET_BOOL", "keyedit.save.okay"),
        ];
        let (out, error) = run(script, &statuses);
        assert_eq!(out, "uid 2\nsign\n3\nY\nquit\nY\n");
        assert!(error.is_none());
    }

    #[test]
    fn signs_all_uids_with_the_sign_all_confirmation() {
        let script = SignUid::new(0, SignCheck::NoAnswer, SignOptions::default());
        let statuses = [
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "keyedit.prompt"),
            ("GET_BOOL", "keyedit.sign_all.okay"),
            ("GET_LINE", "sign_uid.class"),
            ("GET_BOOL", "sign_uid.okay"),
            ("GET_LINE", "keyedit.prompt"),
            ("GET_BOOL", "keyedit.save.okay"),
        ];
        let (out, error) = run(script, &statuses);
        assert_eq!(out, "uid 0\nsign\nY\n0\nY\nquit\nY\n");
        assert!(error.is_none());
    }

    #[test]
    fn answers_the_expiry_question_on_the_way_to_the_class() {
        let script = SignUid::new(
            1,
            SignCheck::Casual,
            SignOptions {
                expires: true,
                ..Default::default()
            },
        );
        let statuses = [
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "sign_uid.expire"),
            ("GET_LINE", "sign_uid.class"),
            ("GET_BOOL", "sign_uid.okay"),
            ("GET_LINE", "keyedit.prompt"),
            ("GET_BOOL", "keyedit.save.okay"),
        ];
        let (out, error) = run(script, &statuses);
        assert_eq!(out, "uid 1\nsign\nY\n2\nY\nquit\nY\n");
        assert!(error.is_none());
    }

    #[test]
    fn command_name_carries_the_options() {
        let script = SignUid::new(
            1,
            SignCheck::NoAnswer,
            SignOptions {
                local: true,
                no_revoke: true,
                expires: false,
            },
        );
        let statuses = [
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "keyedit.prompt"),
        ];
        let (out, _) = run(script, &statuses);
        assert_eq!(out, "uid 1\nnrlsign\n");
    }

    #[test]
    fn prompt_after_command_means_already_signed() {
        let script = SignUid::new(1, SignCheck::NoAnswer, SignOptions::default());
        let statuses = [
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "keyedit.prompt"),
            ("GET_LINE", "keyedit.prompt"),
        ];
        let (out, error) = run(script, &statuses);
        assert_eq!(out, "uid 1\nsign\n");
        assert_eq!(error, Some(EditError::AlreadyDone));
    }

    #[test]
    fn unexpected_status_is_protocol_drift() {
        let script = SignUid::new(1, SignCheck::NoAnswer, SignOptions::default());
        let statuses = [("GET_LINE", "keygen.name")];
        let (out, error) = run(script, &statuses);
        assert!(out.is_empty());
        assert!(matches!(error, Some(EditError::Unexpected { .. })));
    }

    #[test]
    fn housekeeping_lines_do_not_advance_the_machine() {
        let script = SignUid::new(3, SignCheck::NotChecked, SignOptions::default());
        let statuses = [
            ("USERID_HINT", "ABCD1234 Alice <alice@example.org>"),
            ("GET_LINE", "keyedit.prompt"),
            ("GOOD_PASSPHRASE", ""),
            ("GET_LINE", "keyedit.prompt"),
        ];
        let (out, error) = run(script, &statuses);
        assert_eq!(out, "uid 3\nsign\n");
        assert!(error.is_none());
    }
}
