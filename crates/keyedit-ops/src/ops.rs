//! The public key-operation facade.
//!
//! One async method per capability. Event-driven operations go through the
//! reactor; edit-based operations run their blocking conversation on a
//! worker thread and marshal only the final result back. Parameter
//! validation that needs no engine (name lengths, key length ranges,
//! secret-part guards) happens up front, before a context is opened.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use keyedit_core::edit::{
    AddPhoto, AddRevoker, DeleteSubkey, DeleteUid, LoadPhotos, LoadedPhoto, RevokeSubkey,
    SetDisabled, SetExpiry, SetPrimary, SetTrust, SignUid,
};
use keyedit_core::params::{expiry_argument, DSA_MAX};
use keyedit_core::session::{EditConversation, EditScript, EditSession};
use keyedit_core::{
    EditError, KeyAlgo, KeyHandle, PhotoHandle, RevokeReason, SignCheck, SignOptions,
    SubkeyHandle, TrustLevel, UidHandle,
};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::engine::{Engine, EngineError, EngineOp, EngineProvider};
use crate::error::OpError;
use crate::photos;
use crate::reactor::Reactor;

/// Parameters for generating a new keypair.
#[derive(Debug)]
pub struct KeygenParams {
    /// Real name for the initial uid; at least five characters.
    pub name: String,
    /// Email part of the initial uid.
    pub email: Option<String>,
    /// Comment part of the initial uid.
    pub comment: Option<String>,
    /// Passphrase protecting the secret part.
    pub passphrase: SecretString,
    /// Key algorithm; combined types produce an encryption subkey too.
    pub algo: KeyAlgo,
    /// Key length in bits.
    pub bits: u32,
    /// Expiry date, or `None` for a key that never expires.
    pub expires: Option<NaiveDate>,
}

impl KeygenParams {
    fn validate(&self) -> Result<(), OpError> {
        if self.name.trim().chars().count() < 5 {
            return Err(OpError::invalid_param(
                "name must be at least 5 characters",
            ));
        }
        if !matches!(
            self.algo,
            KeyAlgo::RsaRsa | KeyAlgo::DsaElgamal | KeyAlgo::Dsa | KeyAlgo::RsaSign
        ) {
            return Err(OpError::invalid_param(
                "algorithm is not usable for key generation",
            ));
        }
        if !self.algo.accepts_length(self.bits) {
            return Err(OpError::invalid_param(format!(
                "{} bits is out of range for the chosen algorithm",
                self.bits
            )));
        }
        Ok(())
    }

    /// Render the engine's key-parameter block.
    fn render(&self) -> SecretString {
        let mut block = String::from("<GnupgKeyParms format=\"internal\">\n");

        let (key_type, key_length) = match self.algo {
            KeyAlgo::Dsa | KeyAlgo::DsaElgamal => ("DSA", self.bits.min(DSA_MAX)),
            _ => ("RSA", self.bits),
        };
        block.push_str(&format!(
            "Key-Type: {key_type}\nKey-Usage: sign\nKey-Length: {key_length}\n"
        ));

        match self.algo {
            KeyAlgo::DsaElgamal => block.push_str(&format!(
                "Subkey-Type: ELG-E\nSubkey-Length: {}\nSubkey-Usage: encrypt\n",
                self.bits
            )),
            KeyAlgo::RsaRsa => block.push_str(&format!(
                "Subkey-Type: RSA\nSubkey-Length: {}\nSubkey-Usage: encrypt\n",
                self.bits
            )),
            _ => {}
        }

        block.push_str(&format!("Name-Real: {}\n", self.name));
        if let Some(email) = self.email.as_deref().filter(|email| !email.is_empty()) {
            block.push_str(&format!("Name-Email: {email}\n"));
        }
        if let Some(comment) = self.comment.as_deref().filter(|comment| !comment.is_empty()) {
            block.push_str(&format!("Name-Comment: {comment}\n"));
        }
        block.push_str(&format!("Expire-Date: {}\n", expiry_argument(self.expires)));
        block.push_str(&format!("Passphrase: {}\n", self.passphrase.expose_secret()));
        block.push_str("</GnupgKeyParms>");

        SecretString::from(block)
    }
}

/// Asynchronous key operations over an external OpenPGP engine.
///
/// Every operation opens a fresh engine context from the provider and owns
/// it exclusively until completion.
#[derive(Clone)]
pub struct KeyOps {
    provider: Arc<dyn EngineProvider>,
    config: Arc<Config>,
    reactor: Reactor,
}

impl KeyOps {
    /// Build the facade over an engine provider.
    #[must_use]
    pub fn new(provider: Arc<dyn EngineProvider>, config: &Config) -> Self {
        Self {
            provider,
            config: Arc::new(config.clone()),
            reactor: Reactor::new(config),
        }
    }

    /// The configuration this facade was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn context(&self) -> Result<Box<dyn Engine>, OpError> {
        self.provider.context().map_err(OpError::from)
    }

    // ------------------------------------------------------------------
    // Event-driven operations
    // ------------------------------------------------------------------

    /// Generate a new keypair.
    ///
    /// # Errors
    ///
    /// Invalid parameters, engine failures, or [`OpError::Cancelled`].
    pub async fn generate_keypair(
        &self,
        params: &KeygenParams,
        cancel: CancellationToken,
    ) -> Result<(), OpError> {
        params.validate()?;
        self.one_shot(
            EngineOp::GenerateKey {
                parameters: params.render(),
            },
            cancel,
        )
        .await
    }

    /// Change the passphrase protecting `key`'s secret part. The engine
    /// prompts for old and new passphrases itself.
    ///
    /// # Errors
    ///
    /// Engine failures, bad passphrase, or [`OpError::Cancelled`].
    pub async fn change_passphrase(
        &self,
        key: &KeyHandle,
        cancel: CancellationToken,
    ) -> Result<(), OpError> {
        ensure_secret(key, "key")?;
        self.one_shot(EngineOp::ChangePassphrase { key: key.clone() }, cancel)
            .await
    }

    /// Add a subkey to `key`.
    ///
    /// # Errors
    ///
    /// Invalid algorithm or length, engine failures, or cancellation.
    pub async fn add_subkey(
        &self,
        key: &KeyHandle,
        algo: KeyAlgo,
        bits: u32,
        expires: Option<NaiveDate>,
        cancel: CancellationToken,
    ) -> Result<(), OpError> {
        ensure_secret(key, "key")?;
        let algo_choice = self
            .config
            .algos
            .subkey_choice(algo)
            .ok_or_else(|| OpError::invalid_param("algorithm is not usable for subkeys"))?;
        if !algo.accepts_length(bits) {
            return Err(OpError::invalid_param(format!(
                "{bits} bits is out of range for the chosen algorithm"
            )));
        }
        self.one_shot(
            EngineOp::AddSubkey {
                key: key.clone(),
                algo_choice,
                bits,
                expires: expiry_argument(expires),
            },
            cancel,
        )
        .await
    }

    /// Add a user ID to `key`.
    ///
    /// # Errors
    ///
    /// Invalid name, engine failures, or cancellation.
    pub async fn add_uid(
        &self,
        key: &KeyHandle,
        name: &str,
        email: Option<&str>,
        comment: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<(), OpError> {
        ensure_secret(key, "key")?;
        if name.trim().chars().count() < 5 {
            return Err(OpError::invalid_param(
                "name must be at least 5 characters",
            ));
        }
        self.one_shot(
            EngineOp::AddUid {
                key: key.clone(),
                name: name.to_string(),
                email: email.map(str::to_string),
                comment: comment.map(str::to_string),
            },
            cancel,
        )
        .await
    }

    /// Flag `uid` as its key's primary user ID.
    ///
    /// # Errors
    ///
    /// Engine failures or cancellation.
    pub async fn set_primary_uid(
        &self,
        uid: &UidHandle,
        cancel: CancellationToken,
    ) -> Result<(), OpError> {
        self.one_shot(
            EngineOp::SetPrimaryUid {
                key: KeyHandle::new(uid.keyid.clone()),
                uid_index: uid.actual_index,
            },
            cancel,
        )
        .await
    }

    async fn one_shot(&self, op: EngineOp, cancel: CancellationToken) -> Result<(), OpError> {
        let engine = self.context()?;
        self.reactor.run(engine, op, cancel).await
    }

    // ------------------------------------------------------------------
    // Edit-session operations
    // ------------------------------------------------------------------

    /// Sign every uid of `key` with `signer`.
    ///
    /// A key that `signer` already signed counts as success here; use
    /// [`KeyOps::sign_uid`] to observe the already-signed outcome.
    ///
    /// # Errors
    ///
    /// Engine or conversation failures.
    pub async fn sign_key(
        &self,
        key: &KeyHandle,
        signer: &KeyHandle,
        check: SignCheck,
        options: SignOptions,
    ) -> Result<(), OpError> {
        match self.sign(key.clone(), 0, signer, check, options).await {
            Err(OpError::Edit(EditError::AlreadyDone)) => Ok(()),
            outcome => outcome,
        }
    }

    /// Sign one uid with `signer`. An already-signed uid surfaces as
    /// [`EditError::AlreadyDone`] so the caller can decide what it means.
    ///
    /// # Errors
    ///
    /// Engine or conversation failures, including the already-done case.
    pub async fn sign_uid(
        &self,
        uid: &UidHandle,
        signer: &KeyHandle,
        check: SignCheck,
        options: SignOptions,
    ) -> Result<(), OpError> {
        self.sign(
            KeyHandle::new(uid.keyid.clone()),
            uid.actual_index,
            signer,
            check,
            options,
        )
        .await
    }

    async fn sign(
        &self,
        key: KeyHandle,
        index: u32,
        signer: &KeyHandle,
        check: SignCheck,
        options: SignOptions,
    ) -> Result<(), OpError> {
        ensure_secret(signer, "signing key")?;
        let signer = signer.clone();
        let script = SignUid::new(index, check, options);
        let (_, outcome) = self
            .edit_session(key, script, move |engine| engine.add_signer(&signer))
            .await?;
        outcome
    }

    /// Set the owner trust of `key`.
    ///
    /// # Errors
    ///
    /// Invalid level for the key kind, or conversation failures.
    pub async fn set_trust(&self, key: &KeyHandle, level: TrustLevel) -> Result<(), OpError> {
        if key.secret && level == TrustLevel::Unknown {
            return Err(OpError::invalid_param(
                "a key with its secret part cannot have unknown trust",
            ));
        }
        if !key.secret && level == TrustLevel::Ultimate {
            return Err(OpError::invalid_param(
                "ultimate trust requires the secret part",
            ));
        }
        self.run_edit(key.clone(), SetTrust::new(level)).await?;
        Ok(())
    }

    /// Enable or disable `key`.
    ///
    /// # Errors
    ///
    /// Conversation failures.
    pub async fn set_disabled(&self, key: &KeyHandle, disabled: bool) -> Result<(), OpError> {
        self.run_edit(key.clone(), SetDisabled::new(disabled)).await?;
        Ok(())
    }

    /// Set (or clear) the expiry of a subkey. Index 0 addresses the
    /// primary key.
    ///
    /// # Errors
    ///
    /// Conversation failures.
    pub async fn set_expiry(
        &self,
        subkey: &SubkeyHandle,
        expires: Option<NaiveDate>,
    ) -> Result<(), OpError> {
        self.run_edit(
            KeyHandle::new(subkey.keyid.clone()),
            SetExpiry::new(subkey.index, expires),
        )
        .await?;
        Ok(())
    }

    /// Appoint `revoker` as a designated revoker for `key`. Irreversible.
    ///
    /// # Errors
    ///
    /// Missing secret parts or conversation failures.
    pub async fn add_revoker(&self, key: &KeyHandle, revoker: &KeyHandle) -> Result<(), OpError> {
        ensure_secret(key, "key")?;
        ensure_secret(revoker, "revoker key")?;
        self.run_edit(key.clone(), AddRevoker::new(revoker.keyid.clone()))
            .await?;
        Ok(())
    }

    /// Delete a subkey.
    ///
    /// # Errors
    ///
    /// Conversation failures.
    pub async fn delete_subkey(&self, subkey: &SubkeyHandle) -> Result<(), OpError> {
        self.run_edit(
            KeyHandle::new(subkey.keyid.clone()),
            DeleteSubkey::new(subkey.index),
        )
        .await?;
        Ok(())
    }

    /// Revoke a subkey. The index is sent verbatim; an out-of-range
    /// selection surfaces as the engine's own refusal.
    ///
    /// # Errors
    ///
    /// Conversation or engine failures.
    pub async fn revoke_subkey(
        &self,
        subkey: &SubkeyHandle,
        reason: RevokeReason,
        description: &str,
    ) -> Result<(), OpError> {
        self.run_edit(
            KeyHandle::new(subkey.keyid.clone()),
            RevokeSubkey::new(subkey.index, reason, description),
        )
        .await?;
        Ok(())
    }

    /// Delete a user ID.
    ///
    /// # Errors
    ///
    /// Conversation failures.
    pub async fn delete_uid(&self, uid: &UidHandle) -> Result<(), OpError> {
        self.run_edit(
            KeyHandle::new(uid.keyid.clone()),
            DeleteUid::new(uid.actual_index),
        )
        .await?;
        Ok(())
    }

    /// Delete a photo. Photos share the uid numbering, so this runs the
    /// delete-uid conversation at the photo's actual index.
    ///
    /// # Errors
    ///
    /// Conversation failures.
    pub async fn delete_photo(&self, photo: &PhotoHandle) -> Result<(), OpError> {
        self.run_edit(
            KeyHandle::new(photo.keyid.clone()),
            DeleteUid::new(photo.actual_index),
        )
        .await?;
        Ok(())
    }

    /// Make a photo the primary uid.
    ///
    /// # Errors
    ///
    /// Conversation failures.
    pub async fn set_primary_photo(&self, photo: &PhotoHandle) -> Result<(), OpError> {
        self.run_edit(
            KeyHandle::new(photo.keyid.clone()),
            SetPrimary::new(photo.actual_index),
        )
        .await?;
        Ok(())
    }

    /// Attach the image at `path` to `key` as a photo uid.
    ///
    /// # Errors
    ///
    /// A missing or empty file, [`EditError::FileRejected`] when the
    /// engine turns the file down, or other conversation failures.
    pub async fn add_photo(&self, key: &KeyHandle, path: &Path) -> Result<(), OpError> {
        let metadata = std::fs::metadata(path)
            .map_err(|_| OpError::invalid_param(format!("no readable file at {}", path.display())))?;
        if metadata.len() == 0 {
            return Err(OpError::invalid_param(format!(
                "{} is empty",
                path.display()
            )));
        }
        self.run_edit(key.clone(), AddPhoto::new(path)).await?;
        Ok(())
    }

    /// Load every photo attached to `key`.
    ///
    /// Iterates all of the key's uid slots, asking the engine to render
    /// each photo to a temp file published through the configured
    /// environment variable. A uid without a photo contributes nothing. On
    /// failure partway through, the error reports how many photos were
    /// already collected. Cancellation takes effect between uids.
    ///
    /// # Errors
    ///
    /// [`OpError::Interrupted`] for mid-batch failures,
    /// [`OpError::Cancelled`] when the token fired.
    pub async fn load_photos(
        &self,
        key: &KeyHandle,
        cancel: CancellationToken,
    ) -> Result<Vec<LoadedPhoto>, OpError> {
        if key.uid_slots == 0 {
            return Ok(Vec::new());
        }

        let output = photos::temp_image_path(&self.config)?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let watcher_token = cancel.clone();
        let watcher = tokio::spawn(async move {
            watcher_token.cancelled().await;
            flag.store(true, Ordering::Relaxed);
        });

        let env = photos::SessionEnv::apply(&self.config, &output);
        let script = LoadPhotos::new(key.uid_slots, &output).with_stop(stop);
        let result = self.edit_session(key.clone(), script, |_| Ok(())).await;
        drop(env);
        watcher.abort();

        let (script, outcome) = result?;
        let photos = script.into_photos();
        match outcome {
            Ok(()) => {
                if cancel.is_cancelled() {
                    Err(OpError::Cancelled)
                } else {
                    Ok(photos)
                }
            }
            Err(source) => Err(OpError::Interrupted {
                completed: photos.len(),
                source: Box::new(source),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Edit-session plumbing
    // ------------------------------------------------------------------

    async fn run_edit<S>(&self, key: KeyHandle, script: S) -> Result<S, OpError>
    where
        S: EditScript + 'static,
    {
        let (script, outcome) = self.edit_session(key, script, |_| Ok(())).await?;
        outcome?;
        Ok(script)
    }

    /// Run one blocking edit conversation on a worker thread.
    ///
    /// Returns the machine together with the conversation outcome so
    /// callers can salvage partial results (photo listing) even when the
    /// conversation failed. A recorded session error takes precedence over
    /// the engine's own result.
    async fn edit_session<S, F>(
        &self,
        key: KeyHandle,
        script: S,
        prepare: F,
    ) -> Result<(S, Result<(), OpError>), OpError>
    where
        S: EditScript + 'static,
        F: FnOnce(&mut dyn Engine) -> Result<(), EngineError> + Send + 'static,
    {
        let mut engine = self.context()?;
        let worker = tokio::task::spawn_blocking(move || {
            let mut session = EditSession::new(script);
            let result = prepare(engine.as_mut())
                .and_then(|()| engine.edit_key(&key, &mut session));
            (session, result)
        });
        let (session, engine_result) = worker.await.map_err(|err| OpError::Engine {
            message: format!("edit worker failed: {err}"),
        })?;

        let outcome = match session.failure() {
            Some(edit_err) => Err(OpError::Edit(edit_err.clone())),
            None => engine_result.map_err(OpError::from),
        };
        Ok((session.into_script(), outcome))
    }
}

fn ensure_secret(key: &KeyHandle, role: &str) -> Result<(), OpError> {
    if key.secret {
        Ok(())
    } else {
        Err(OpError::invalid_param(format!(
            "{role} must have its secret part available"
        )))
    }
}
