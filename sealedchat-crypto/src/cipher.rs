//! AES-256-GCM with a 16-byte IV and a detached 16-byte tag.
//!
//! The 16-byte IV matches the processing service's format; it is processed by
//! GHASH like any non-96-bit GCM nonce. A fresh random IV is drawn for every
//! call, so an IV is never reused under the same key.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Size of a symmetric key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the GCM IV in bytes.
pub const IV_SIZE: usize = 16;

/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Output of [`encrypt_aes_gcm`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    #[serde(with = "hex::serde")]
    pub iv: [u8; IV_SIZE],
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub auth_tag: [u8; TAG_SIZE],
}

fn cipher_for(key: &[u8]) -> CryptoResult<Aes256Gcm16> {
    Aes256Gcm16::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_SIZE,
        actual: key.len(),
    })
}

/// Encrypts `plaintext` under a 32-byte key with a fresh random IV.
pub fn encrypt_aes_gcm(
    key: &[u8],
    plaintext: &[u8],
    aad: Option<&[u8]>,
) -> CryptoResult<EncryptedData> {
    let cipher = cipher_for(key)?;

    let mut iv = [0u8; IV_SIZE];
    rand::rng().fill_bytes(&mut iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(
            Nonce::<U16>::from_slice(&iv),
            aad.unwrap_or_default(),
            &mut buffer,
        )
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut auth_tag = [0u8; TAG_SIZE];
    auth_tag.copy_from_slice(tag.as_slice());

    Ok(EncryptedData {
        iv,
        ciphertext: buffer,
        auth_tag,
    })
}

/// Decrypts and authenticates an AES-256-GCM ciphertext.
///
/// Length problems with the key, IV or tag are input errors. Anything that
/// gets past those checks and still fails is reported as
/// [`CryptoError::Decryption`] without saying which part was wrong.
pub fn decrypt_aes_gcm(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    auth_tag: &[u8],
    aad: Option<&[u8]>,
) -> CryptoResult<Vec<u8>> {
    let cipher = cipher_for(key)?;
    check_len("iv", iv, IV_SIZE)?;
    check_len("auth_tag", auth_tag, TAG_SIZE)?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(iv),
            aad.unwrap_or_default(),
            &mut buffer,
            Tag::<U16>::from_slice(auth_tag),
        )
        .map_err(|_| CryptoError::Decryption)?;

    Ok(buffer)
}

/// Decrypts an [`EncryptedData`] produced by [`encrypt_aes_gcm`].
pub fn decrypt_data(
    key: &[u8],
    data: &EncryptedData,
    aad: Option<&[u8]>,
) -> CryptoResult<Vec<u8>> {
    decrypt_aes_gcm(key, &data.iv, &data.ciphertext, &data.auth_tag, aad)
}

fn check_len(field: &'static str, value: &[u8], expected: usize) -> CryptoResult<()> {
    if value.len() != expected {
        return Err(CryptoError::InvalidFieldLength {
            field,
            expected,
            actual: value.len(),
        });
    }
    Ok(())
}
