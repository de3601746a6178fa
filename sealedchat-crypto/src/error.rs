//! Error types for the crypto layer.
//!
//! Authentication failures carry no detail. A wrong key, a wrong context, a
//! corrupted IV and a tampered tag all surface as the same variant.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in crypto operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid hex in {field}")]
    InvalidHex { field: &'static str },

    #[error("passcode must not be empty")]
    EmptyPasscode,

    #[error("passcode too short (min {min} characters)")]
    PasscodeTooShort { min: usize },

    #[error("recovery code must be exactly 20 digits")]
    InvalidRecoveryCodeFormat,

    #[error("unknown encryption context: {0}")]
    UnknownContext(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("decryption failed")]
    Decryption,

    #[error("incorrect passcode")]
    IncorrectPasscode,

    #[error("invalid recovery code")]
    InvalidRecoveryCode,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("stored public key does not match decrypted private key")]
    KeyMismatch,
}

impl CryptoError {
    /// True for failures caused by a secret or ciphertext mismatch rather
    /// than malformed input.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::Decryption | Self::IncorrectPasscode | Self::InvalidRecoveryCode
        )
    }
}
