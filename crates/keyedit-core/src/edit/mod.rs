//! The concrete edit-task state machines.
//!
//! Each submodule implements one key-editing conversation as an
//! [`EditScript`](crate::session::EditScript): a totally ordered state enum
//! with one start state and at least one terminal quit state, a transition
//! table with a fail-loud default branch, and a response table. The
//! conversational structure these tables encode is part of the engine's
//! interactive protocol; changing a transition changes what gets written to
//! a key.
//!
//! Two machines are deliberately shared: deleting a photo runs the
//! delete-uid machine and making a photo primary runs the primary-uid
//! machine, both addressed through the interleaved uid numbering.

use std::fmt;
use std::io::Write;

use crate::error::EditError;

pub mod delkey;
pub mod deluid;
pub mod disable;
pub mod expire;
pub mod photo_add;
pub mod photo_load;
pub mod primary;
pub mod revoke;
pub mod revoker;
pub mod sign;
pub mod trust;

pub use delkey::DeleteSubkey;
pub use deluid::DeleteUid;
pub use disable::SetDisabled;
pub use expire::SetExpiry;
pub use photo_add::AddPhoto;
pub use photo_load::{LoadPhotos, LoadedPhoto};
pub use primary::SetPrimary;
pub use revoke::RevokeSubkey;
pub use revoker::AddRevoker;
pub use sign::SignUid;
pub use trust::SetTrust;

/// The engine's main edit prompt.
pub(crate) const PROMPT: &str = "keyedit.prompt";
/// The save-on-quit confirmation prompt.
pub(crate) const SAVE: &str = "keyedit.save.okay";
/// Affirmative answer.
pub(crate) const YES: &str = "Y";
/// Negative answer.
pub(crate) const NO: &str = "N";
/// The command that ends an edit conversation.
pub(crate) const QUIT: &str = "quit";

/// Write one newline-terminated answer line.
pub(crate) fn put(out: &mut dyn Write, line: impl fmt::Display) -> Result<(), EditError> {
    writeln!(out, "{line}").map_err(|err| EditError::Write(err.to_string()))
}
