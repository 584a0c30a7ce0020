//! Parameter types shared by the edit machines and the operation facade.
//!
//! The numeric answers here (trust menu choices, signature classes,
//! revocation reason codes) are part of the engine's interactive protocol
//! and must match it exactly.

use chrono::NaiveDate;

/// Owner-trust levels, in the engine's menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrustLevel {
    /// Trust is not known.
    Unknown,
    /// Do not trust this owner.
    Never,
    /// Trust marginally.
    Marginal,
    /// Trust fully.
    Full,
    /// Ultimate trust; only valid for keys with the secret part present and
    /// the only level that requires an extra confirmation step.
    Ultimate,
}

impl TrustLevel {
    /// The numeric menu choice the engine expects for this level.
    #[must_use]
    pub fn menu_choice(self) -> u8 {
        match self {
            Self::Unknown => 1,
            Self::Never => 2,
            Self::Marginal => 3,
            Self::Full => 4,
            Self::Ultimate => 5,
        }
    }
}

/// How carefully the identity behind a uid was verified before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignCheck {
    /// Decline to answer.
    #[default]
    NoAnswer,
    /// Not checked at all.
    NotChecked,
    /// Casually checked.
    Casual,
    /// Carefully checked.
    Careful,
}

impl SignCheck {
    /// The signature class digit the engine expects.
    #[must_use]
    pub fn class(self) -> u8 {
        match self {
            Self::NoAnswer => 0,
            Self::NotChecked => 1,
            Self::Casual => 2,
            Self::Careful => 3,
        }
    }
}

/// Options folded into a signing conversation.
///
/// `local` and `no_revoke` become prefixes of the command name itself
/// (`lsign`, `nrsign`, `nrlsign`); `expires` answers the expiry question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignOptions {
    /// Produce a local (non-exportable) signature.
    pub local: bool,
    /// Produce a non-revocable signature.
    pub no_revoke: bool,
    /// Let the signature expire together with the key.
    pub expires: bool,
}

impl SignOptions {
    /// The composite command name for these options.
    #[must_use]
    pub fn command(self) -> String {
        format!(
            "{}{}sign",
            if self.no_revoke { "nr" } else { "" },
            if self.local { "l" } else { "" },
        )
    }
}

/// Why a subkey is being revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeReason {
    /// No particular reason.
    NoReason,
    /// The key has been compromised.
    Compromised,
    /// The key was superseded by another.
    Superseded,
    /// The key is no longer used.
    NotUsed,
}

impl RevokeReason {
    /// The reason code the engine expects.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::NoReason => 0,
            Self::Compromised => 1,
            Self::Superseded => 2,
            Self::NotUsed => 3,
        }
    }
}

/// Key algorithms usable for generation and subkey creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgo {
    /// RSA signing key with an RSA encryption subkey (generation only).
    RsaRsa,
    /// DSA signing key with an ElGamal encryption subkey (generation only).
    DsaElgamal,
    /// DSA, sign only.
    Dsa,
    /// RSA, sign only.
    RsaSign,
    /// ElGamal, encrypt only (subkeys only).
    Elgamal,
    /// RSA, encrypt only (subkeys only).
    RsaEncrypt,
}

/// Minimum length for DSA keys.
pub const DSA_MIN: u32 = 768;
/// Maximum length for DSA keys.
pub const DSA_MAX: u32 = 3072;
/// Minimum length for ElGamal keys.
pub const ELGAMAL_MIN: u32 = 768;
/// Minimum length for RSA keys.
pub const RSA_MIN: u32 = 1024;
/// Maximum length for RSA and ElGamal keys.
pub const LENGTH_MAX: u32 = 4096;
/// Default length when the caller has no preference.
pub const LENGTH_DEFAULT: u32 = 2048;

impl KeyAlgo {
    /// Whether `bits` is an acceptable length for this algorithm.
    #[must_use]
    pub fn accepts_length(self, bits: u32) -> bool {
        match self {
            Self::Dsa => (DSA_MIN..=DSA_MAX).contains(&bits),
            Self::DsaElgamal | Self::Elgamal => (ELGAMAL_MIN..=LENGTH_MAX).contains(&bits),
            Self::RsaRsa | Self::RsaSign | Self::RsaEncrypt => {
                (RSA_MIN..=LENGTH_MAX).contains(&bits)
            }
        }
    }
}

/// Render an optional expiry date the way the engine expects free-text
/// dates: `YYYY-MM-DD`, or `0` for "never expires".
#[must_use]
pub fn expiry_argument(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => "0".to_string(),
    }
}
