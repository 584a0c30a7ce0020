//! Photo-listing plumbing: the temp output path and the environment the
//! engine's render helper runs under.
//!
//! The helper invoked by the engine cannot be passed arguments, so the
//! output path travels through an environment variable and the helper's
//! directory is prepended to `PATH` for the duration of the session. Both
//! are restored when the guard drops.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::OpError;

/// Reserve a unique `.jpg` path for the render helper's output.
///
/// The file itself is removed again immediately: the helper creates it
/// fresh for every photo, and a leftover file would read as a photo on a
/// uid that has none.
pub(crate) fn temp_image_path(config: &Config) -> Result<PathBuf, OpError> {
    let file = tempfile::Builder::new()
        .prefix("keyedit-photo-")
        .suffix(".jpg")
        .tempfile_in(&config.temp_dir)?;
    let path = file.path().to_path_buf();
    file.close()?;
    Ok(path)
}

/// Environment changes applied for one photo-listing session.
pub(crate) struct SessionEnv {
    saved: Vec<(String, Option<OsString>)>,
}

impl SessionEnv {
    /// Point the render helper at `output` and put the helper directory on
    /// the search path.
    pub(crate) fn apply(config: &Config, output: &Path) -> Self {
        let mut saved = Vec::new();

        saved.push((config.photo_env.clone(), env::var_os(&config.photo_env)));
        env::set_var(&config.photo_env, output);

        if let Some(helper_dir) = &config.helper_dir {
            let old_path = env::var_os("PATH");
            let mut entries = vec![helper_dir.clone()];
            if let Some(old) = &old_path {
                entries.extend(env::split_paths(old));
            }
            match env::join_paths(entries) {
                Ok(joined) => {
                    saved.push(("PATH".to_string(), old_path));
                    env::set_var("PATH", joined);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "couldn't extend PATH with the helper directory");
                }
            }
        }

        Self { saved }
    }
}

impl Drop for SessionEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => env::set_var(&key, value),
                None => env::remove_var(&key),
            }
        }
    }
}
