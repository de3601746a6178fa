//! X25519 key pairs.
//!
//! `PrivateKey` is zeroized on drop, has a redacting `Debug`, and does not
//! implement `Serialize`. The only way to persist one is to wrap it in
//! [`EncryptedKeyMaterial`](crate::keys::EncryptedKeyMaterial).

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec;
use crate::error::{CryptoError, CryptoResult};

/// Size of X25519 private and public keys in bytes.
pub const KEY_SIZE: usize = 32;

/// An X25519 private key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; KEY_SIZE]);

impl PrivateKey {
    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copies a key out of a slice, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parses a 64-character hex private key.
    pub fn from_hex(input: &str) -> CryptoResult<Self> {
        let mut bytes: [u8; KEY_SIZE] = codec::decode_fixed("private_key", input)?;
        let key = Self(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Borrows the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Derives the matching public key.
    pub fn public_key(&self) -> PublicKey {
        public_key_of(self)
    }

    pub(crate) fn to_static_secret(&self) -> StaticSecret {
        StaticSecret::from(self.0)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// An X25519 public key, serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(#[serde(with = "hex::serde")] [u8; KEY_SIZE]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parses a 64-character hex public key.
    pub fn from_hex(input: &str) -> CryptoResult<Self> {
        codec::decode_fixed("public_key", input).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        codec::encode(self.0)
    }

    pub(crate) fn to_dalek(self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// An X25519 key pair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Rebuilds a key pair from its private half.
    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }
}

/// Generates a new X25519 key pair from the thread-local CSPRNG.
pub fn generate_keypair() -> KeyPair {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rng().fill_bytes(&mut bytes);
    let private_key = PrivateKey::from_bytes(bytes);
    bytes.zeroize();
    KeyPair::from_private_key(private_key)
}

/// Scalar-multiplies the private key against the X25519 base point.
pub fn public_key_of(private_key: &PrivateKey) -> PublicKey {
    let secret = private_key.to_static_secret();
    PublicKey(*x25519_dalek::PublicKey::from(&secret).as_bytes())
}
