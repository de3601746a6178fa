//! Ephemeral-ECDH envelope encryption.
//!
//! Every call generates a one-time X25519 key pair, derives an AES key from
//! `X25519(ephemeral, recipient)` with a fresh HKDF salt and the context as
//! `info`, encrypts, and drops the ephemeral private key. Two payloads to the
//! same recipient share no derivable secret, which gives per-message forward
//! secrecy without session state.

use serde::{Deserialize, Serialize};

use crate::cipher::{self, IV_SIZE, TAG_SIZE};
use crate::context::EncryptionContext;
use crate::error::CryptoResult;
use crate::kdf::{SALT_SIZE, Salt, derive_key_from_ecdh};
use crate::keypair::{KEY_SIZE, PrivateKey, PublicKey, generate_keypair};

/// The unit of asymmetric encryption output.
///
/// Serializes with the backend's field names and lowercase hex values.
/// Fixed-size fields reject any other length on deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    #[serde(with = "hex::serde")]
    pub ephemeral_public_key: [u8; KEY_SIZE],
    #[serde(with = "hex::serde")]
    pub iv: [u8; IV_SIZE],
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub auth_tag: [u8; TAG_SIZE],
    #[serde(with = "hex::serde")]
    pub hkdf_salt: [u8; SALT_SIZE],
}

/// Encrypts `plaintext` to `recipient` under `context`.
pub fn encrypt_to_public_key(
    recipient: &PublicKey,
    plaintext: &[u8],
    context: EncryptionContext,
) -> CryptoResult<EncryptedPayload> {
    let ephemeral = generate_keypair();
    let derivation = derive_key_from_ecdh(&ephemeral.private_key, recipient, context, None)?;
    let encrypted = cipher::encrypt_aes_gcm(derivation.derived_key.as_bytes(), plaintext, None)?;

    Ok(EncryptedPayload {
        ephemeral_public_key: *ephemeral.public_key.as_bytes(),
        iv: encrypted.iv,
        ciphertext: encrypted.ciphertext,
        auth_tag: encrypted.auth_tag,
        hkdf_salt: *derivation.salt.as_bytes(),
    })
}

/// Decrypts a payload with the recipient's private key.
///
/// `context` must be the one used at encryption time; any other context
/// fails authentication.
pub fn decrypt_with_private_key(
    private_key: &PrivateKey,
    payload: &EncryptedPayload,
    context: EncryptionContext,
) -> CryptoResult<Vec<u8>> {
    let ephemeral = PublicKey::from_bytes(payload.ephemeral_public_key);
    let salt = Salt::from_bytes(payload.hkdf_salt);
    let derivation = derive_key_from_ecdh(private_key, &ephemeral, context, Some(&salt))?;

    cipher::decrypt_aes_gcm(
        derivation.derived_key.as_bytes(),
        &payload.iv,
        &payload.ciphertext,
        &payload.auth_tag,
        None,
    )
}
