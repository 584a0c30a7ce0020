//! Listing the photos attached to a key.
//!
//! There is no way to ask the engine for photo bytes directly: the machine
//! selects each uid in turn and issues `showphoto`, which makes the engine
//! run its viewer helper. The integration layer points that helper at a
//! fixed temp path through an environment variable; after each uid this
//! machine reads whatever landed there and deletes it. A missing or empty
//! file means "no photo on this uid", not an error.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{put, PROMPT, QUIT};
use crate::error::EditError;
use crate::session::EditScript;
use crate::status::{StatusKind, StatusLine};

const TASK: &str = "load-photos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Select,
    OutputImage,
    Deselect,
    Quit,
    Error,
}

/// One rendered photo collected during a listing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPhoto {
    /// 1-based uid slot the photo was found on.
    pub uid_index: u32,
    /// The raw image bytes the engine's helper wrote.
    pub image: Vec<u8>,
}

/// Iterates every uid slot of a key, collecting rendered photos.
///
/// The iteration is the batch boundary for cancellation: once the stop flag
/// is set, the machine finishes the uid in flight and quits instead of
/// selecting the next one.
#[derive(Debug)]
pub struct LoadPhotos {
    state: State,
    uid: u32,
    total: u32,
    output: PathBuf,
    photos: Vec<LoadedPhoto>,
    stop: Option<Arc<AtomicBool>>,
}

impl LoadPhotos {
    /// Machine that iterates `total` uid slots, reading rendered images
    /// from `output`.
    #[must_use]
    pub fn new(total: u32, output: impl Into<PathBuf>) -> Self {
        Self {
            state: State::Start,
            uid: 1,
            total,
            output: output.into(),
            photos: Vec::new(),
            stop: None,
        }
    }

    /// Attach a stop flag; when set, no further uid is started.
    #[must_use]
    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Photos collected so far.
    #[must_use]
    pub fn photos(&self) -> &[LoadedPhoto] {
        &self.photos
    }

    /// Take ownership of the collected photos.
    #[must_use]
    pub fn into_photos(self) -> Vec<LoadedPhoto> {
        self.photos
    }

    fn drift(&mut self, status: &StatusLine) -> EditError {
        let state = self.state_name();
        self.state = State::Error;
        EditError::unexpected(TASK, state, status)
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Pick up whatever the engine's helper wrote for the current uid.
    fn collect(&mut self) {
        if !self.output.exists() {
            return;
        }
        match fs::read(&self.output) {
            Ok(image) if image.is_empty() => {}
            Ok(image) => self.photos.push(LoadedPhoto {
                uid_index: self.uid,
                image,
            }),
            Err(err) => {
                tracing::warn!(path = %self.output.display(), error = %err, "couldn't read rendered photo");
            }
        }
        if let Err(err) = fs::remove_file(&self.output) {
            tracing::warn!(path = %self.output.display(), error = %err, "couldn't remove rendered photo");
        }
    }
}

impl EditScript for LoadPhotos {
    fn task(&self) -> &'static str {
        TASK
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            State::Start => "start",
            State::Select => "select",
            State::OutputImage => "output-image",
            State::Deselect => "deselect",
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
                (StatusKind::GetLine, PROMPT) => State::OutputImage,
                _ => return Err(self.drift(status)),
            },
            State::OutputImage => {
                // The helper has run by the time the prompt comes back.
                self.collect();
                match cue {
                    (StatusKind::GetLine, PROMPT) => State::Deselect,
                    _ => return Err(self.drift(status)),
                }
            }
            State::Deselect => {
                if self.uid < self.total && !self.stop_requested() {
                    self.uid += 1;
                    match cue {
                        (StatusKind::GetLine, PROMPT) => State::Select,
                        _ => return Err(self.drift(status)),
                    }
                } else {
                    match cue {
                        (StatusKind::GetLine, PROMPT) => State::Quit,
                        _ => return Err(self.drift(status)),
                    }
                }
            }
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
            State::Select | State::Deselect => put(out, format_args!("uid {}", self.uid)),
            State::OutputImage => put(out, "showphoto"),
            State::Quit => put(out, QUIT),
            State::Start | State::Error => Ok(()),
        }
    }
}
