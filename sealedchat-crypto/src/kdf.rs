//! Key derivation.
//!
//! Two derivations feed the symmetric cipher:
//!
//! 1. **Passcode**: Argon2id over a user-typed passcode or recovery code and
//!    a random 32-byte salt. Deliberately slow and memory-hard, so a six-digit
//!    passcode is still expensive to brute-force offline.
//! 2. **ECDH**: X25519 shared secret, then HKDF-SHA512 with a 32-byte salt and
//!    the context string as `info`.
//!
//! ```text
//! Argon2id(passcode, salt, t=4, m=128 MiB, p=2)      -> 32-byte key
//! HKDF-SHA512(ikm = X25519(priv, pub), salt, info)   -> 32-byte key
//! ```

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::context::EncryptionContext;
use crate::error::{CryptoError, CryptoResult};
use crate::keypair::{PrivateKey, PublicKey};

/// Size of a derived symmetric key in bytes.
pub const DERIVED_KEY_SIZE: usize = 32;

/// Size of every salt (Argon2id and HKDF) in bytes.
pub const SALT_SIZE: usize = 32;

/// Argon2id cost parameters.
///
/// These are not stored alongside encrypted key material, so every party
/// that wraps or unwraps a key must agree on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Number of passes over memory.
    pub time_cost: u32,
    /// Memory size in KiB.
    pub memory_cost_kib: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            time_cost: 4,
            memory_cost_kib: 131_072, // 128 MiB
            parallelism: 2,
        }
    }
}

impl KdfParams {
    fn to_argon2(self) -> CryptoResult<Argon2<'static>> {
        let params = Params::new(
            self.memory_cost_kib,
            self.time_cost,
            self.parallelism,
            Some(DERIVED_KEY_SIZE),
        )
        .map_err(|e| CryptoError::KeyDerivation(format!("invalid argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// A random 32-byte salt.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Salt(#[serde(with = "hex::serde")] [u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copies a salt out of a slice, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::InvalidFieldLength {
                field: "salt",
                expected: SALT_SIZE,
                actual: bytes.len(),
            })
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", hex::encode(self.0))
    }
}

/// A 32-byte symmetric key produced by one of the derivations.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; DERIVED_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Output of [`derive_key_from_ecdh`]: the key and the salt it was derived
/// with. The salt must travel with the ciphertext.
#[derive(Debug)]
pub struct EcdhDerivation {
    pub derived_key: DerivedKey,
    pub salt: Salt,
}

/// Derives a symmetric key from a passcode using Argon2id.
///
/// This is CPU- and memory-expensive by design (hundreds of milliseconds and
/// `memory_cost_kib` of working set). Do not call it on a latency-sensitive
/// thread.
pub fn derive_key_from_passcode(
    passcode: &str,
    salt: &[u8],
    params: &KdfParams,
) -> CryptoResult<DerivedKey> {
    if passcode.is_empty() {
        return Err(CryptoError::EmptyPasscode);
    }
    let salt = Salt::from_slice(salt)?;

    let mut out = [0u8; DERIVED_KEY_SIZE];
    params
        .to_argon2()?
        .hash_password_into(passcode.as_bytes(), salt.as_bytes(), &mut out)
        .map_err(|e| CryptoError::KeyDerivation(format!("argon2 failed: {e}")))?;

    let key = DerivedKey(out);
    out.zeroize();
    Ok(key)
}

/// Derives a symmetric key from an X25519 exchange and HKDF-SHA512.
///
/// With `salt = None` a fresh salt is generated and returned; the
/// counterparty passes that same salt to arrive at the same key. The context
/// is the HKDF `info`, so distinct contexts yield unrelated keys.
pub fn derive_key_from_ecdh(
    private_key: &PrivateKey,
    public_key: &PublicKey,
    context: EncryptionContext,
    salt: Option<&Salt>,
) -> CryptoResult<EcdhDerivation> {
    let salt = salt.copied().unwrap_or_else(Salt::random);

    let secret = private_key.to_static_secret();
    let shared = secret.diffie_hellman(&public_key.to_dalek());
    // Low-order points give an all-zero shared secret.
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidPublicKey);
    }

    let hk = Hkdf::<Sha512>::new(Some(salt.as_bytes()), shared.as_bytes());
    let mut okm = [0u8; DERIVED_KEY_SIZE];
    hk.expand(context.info(), &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(format!("hkdf expand failed: {e}")))?;

    let derived_key = DerivedKey(okm);
    okm.zeroize();
    Ok(EcdhDerivation { derived_key, salt })
}
