//! Explicit configuration, resolved once at startup.
//!
//! Everything here used to be ambient in one form or another: the algorithm
//! menu numbers depend on the engine version, the photo side channel is an
//! environment-variable contract, and dispatch tracing is a debug switch.
//! Passing one `Config` by reference into the reactor and facade keeps all
//! of it out of process-wide state.

use std::env;
use std::path::PathBuf;

use keyedit_core::KeyAlgo;

/// Engine-version-derived `keygen.algo` menu numbers.
///
/// The interactive algorithm menu is not stable across engine versions, so
/// the numbers are resolved once against the running engine and carried
/// here. Defaults match current engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgoTable {
    /// RSA signing key with RSA encryption subkey.
    pub rsa_rsa: u8,
    /// DSA signing key with ElGamal encryption subkey.
    pub dsa_elgamal: u8,
    /// DSA, sign only.
    pub dsa_sign: u8,
    /// RSA, sign only.
    pub rsa_sign: u8,
    /// ElGamal, encrypt only.
    pub elgamal_enc: u8,
    /// RSA, encrypt only.
    pub rsa_enc: u8,
}

impl Default for AlgoTable {
    fn default() -> Self {
        Self {
            rsa_rsa: 1,
            dsa_elgamal: 2,
            dsa_sign: 3,
            rsa_sign: 4,
            elgamal_enc: 5,
            rsa_enc: 6,
        }
    }
}

impl AlgoTable {
    /// The menu number for adding a subkey of `algo`, if subkeys of that
    /// algorithm exist.
    #[must_use]
    pub fn subkey_choice(&self, algo: KeyAlgo) -> Option<u8> {
        match algo {
            KeyAlgo::Dsa => Some(self.dsa_sign),
            KeyAlgo::Elgamal => Some(self.elgamal_enc),
            KeyAlgo::RsaSign => Some(self.rsa_sign),
            KeyAlgo::RsaEncrypt => Some(self.rsa_enc),
            KeyAlgo::RsaRsa | KeyAlgo::DsaElgamal => None,
        }
    }
}

/// Configuration shared by the reactor and the operation facade.
#[derive(Debug, Clone)]
pub struct Config {
    /// Algorithm menu numbers for the running engine version.
    pub algos: AlgoTable,
    /// Environment variable through which the photo-render helper learns
    /// where to write its output.
    pub photo_env: String,
    /// Directory holding the render helper, prepended to `PATH` for the
    /// duration of a photo listing.
    pub helper_dir: Option<PathBuf>,
    /// Directory for rendered-photo temp files.
    pub temp_dir: PathBuf,
    /// Emit a trace line for every descriptor dispatch.
    pub trace_io: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algos: AlgoTable::default(),
            photo_env: "KEYEDIT_PHOTO_FILE".to_string(),
            helper_dir: None,
            temp_dir: env::temp_dir(),
            trace_io: false,
        }
    }
}
