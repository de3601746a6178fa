//! E2EE error types.

use std::fmt;

use sealedchat_crypto::CryptoError;
use thiserror::Error;

/// Result type for E2EE operations.
pub type E2eeResult<T> = Result<T, E2eeError>;

/// A private key a [`KeySession`](crate::KeySession) may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Personal,
    Org,
    Transport,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Personal => "personal",
            Self::Org => "org",
            Self::Transport => "transport",
        })
    }
}

/// Errors that can occur in message, memory and org key operations.
#[derive(Debug, Error)]
pub enum E2eeError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("{0} key not unlocked")]
    NotUnlocked(SessionKey),

    #[error("recovery keys not present on key record")]
    MissingRecoveryKeys,

    #[error("decrypted content is not valid UTF-8")]
    InvalidUtf8,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("key derivation worker failed: {0}")]
    Worker(String),
}

impl E2eeError {
    /// True when the failure is a secret or ciphertext mismatch rather than
    /// bad input or missing state.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Crypto(e) if e.is_authentication_failure())
    }
}
