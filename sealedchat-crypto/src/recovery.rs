//! Numeric recovery codes.
//!
//! A recovery code is 20 random decimal digits (about 66 bits), meant to be
//! written down and typed back in. It is shown grouped as
//! `1234-5678-9012-3456-7890`; parsing strips the separators.

use std::fmt;

use rand::Rng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Number of digits in a recovery code.
pub const RECOVERY_CODE_LENGTH: usize = 20;

/// Digits per displayed group.
pub const RECOVERY_CODE_GROUP: usize = 4;

/// A recovery code held in memory. Zeroized on drop, redacted in `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RecoveryCode(String);

impl RecoveryCode {
    /// Generates a fresh 20-digit code.
    pub fn generate() -> Self {
        Self(generate_recovery_code(RECOVERY_CODE_LENGTH))
    }

    /// Parses user input, formatted or not.
    pub fn parse(input: &str) -> CryptoResult<Self> {
        parse_recovery_code(input).map(Self)
    }

    /// The bare digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The digits grouped for display.
    pub fn formatted(&self) -> String {
        format_recovery_code(&self.0)
    }
}

impl fmt::Debug for RecoveryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecoveryCode([REDACTED])")
    }
}

/// Returns `length` uniformly random decimal digits.
pub fn generate_recovery_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Groups digits into hyphen-separated clusters of four.
pub fn format_recovery_code(code: &str) -> String {
    code.chars()
        .collect::<Vec<_>>()
        .chunks(RECOVERY_CODE_GROUP)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// Strips hyphens and whitespace and checks for exactly 20 digits.
pub fn parse_recovery_code(input: &str) -> CryptoResult<String> {
    let digits: String = input
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();

    if digits.len() != RECOVERY_CODE_LENGTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::InvalidRecoveryCodeFormat);
    }
    Ok(digits)
}
