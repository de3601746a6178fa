//! Long-term key management.
//!
//! A user owns one X25519 key pair. The private half is stored twice, each
//! copy wrapped with AES-256-GCM under an Argon2id-derived key:
//!
//! - **personal**: derived from the user's passcode
//! - **recovery**: derived from a one-time 20-digit recovery code
//!
//! Both copies wrap the same private key, and each has its own salt.
//! Rotating the passcode rewrites only the personal copy, so the recovery
//! code stays valid, and vice versa.

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::cipher::{self, IV_SIZE, TAG_SIZE};
use crate::compare::secure_compare;
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{KdfParams, Salt, derive_key_from_passcode};
use crate::keypair::{KEY_SIZE, PrivateKey, PublicKey, generate_keypair, public_key_of};
use crate::recovery::RecoveryCode;

/// Minimum passcode length in characters.
pub const MIN_PASSCODE_LENGTH: usize = 6;

/// A private key wrapped under a passcode- or recovery-code-derived key.
///
/// Every binary field is fixed-size, so a truncated or padded record fails
/// to deserialize instead of reaching Argon2id and reporting a wrong
/// passcode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKeyMaterial {
    pub public_key: PublicKey,
    #[serde(with = "hex::serde")]
    pub encrypted_private_key: [u8; KEY_SIZE],
    #[serde(with = "hex::serde")]
    pub iv: [u8; IV_SIZE],
    #[serde(with = "hex::serde")]
    pub tag: [u8; TAG_SIZE],
    pub salt: Salt,
}

/// Everything produced by first-time key setup.
///
/// Not `Serialize`: `raw_private_key` exists only so the caller can stay
/// unlocked right after setup, and `recovery_code` is shown to the user once.
/// Persist `personal` and `recovery` together, never one without the other.
#[derive(Debug)]
pub struct KeySetupResult {
    pub personal: EncryptedKeyMaterial,
    pub recovery: EncryptedKeyMaterial,
    pub recovery_code: RecoveryCode,
    pub raw_private_key: PrivateKey,
}

/// Which secret unlocks a piece of key material. Selects the error reported
/// on authentication failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Unlock {
    Passcode,
    RecoveryCode,
}

impl Unlock {
    fn auth_error(self) -> CryptoError {
        match self {
            Self::Passcode => CryptoError::IncorrectPasscode,
            Self::RecoveryCode => CryptoError::InvalidRecoveryCode,
        }
    }
}

fn validate_passcode(passcode: &str) -> CryptoResult<()> {
    if passcode.chars().count() < MIN_PASSCODE_LENGTH {
        return Err(CryptoError::PasscodeTooShort {
            min: MIN_PASSCODE_LENGTH,
        });
    }
    Ok(())
}

fn wrap_private_key(
    private_key: &PrivateKey,
    secret: &str,
    params: &KdfParams,
) -> CryptoResult<EncryptedKeyMaterial> {
    let salt = Salt::random();
    let key = derive_key_from_passcode(secret, salt.as_bytes(), params)?;
    let encrypted = cipher::encrypt_aes_gcm(key.as_bytes(), private_key.as_bytes(), None)?;
    let encrypted_private_key: [u8; KEY_SIZE] =
        encrypted.ciphertext.as_slice().try_into().map_err(|_| {
            CryptoError::Encryption(format!(
                "wrapped key is {} bytes, expected {KEY_SIZE}",
                encrypted.ciphertext.len()
            ))
        })?;

    Ok(EncryptedKeyMaterial {
        public_key: public_key_of(private_key),
        encrypted_private_key,
        iv: encrypted.iv,
        tag: encrypted.auth_tag,
        salt,
    })
}

fn unwrap_private_key(
    secret: &str,
    material: &EncryptedKeyMaterial,
    params: &KdfParams,
    unlock: Unlock,
) -> CryptoResult<PrivateKey> {
    let key = derive_key_from_passcode(secret, material.salt.as_bytes(), params)?;
    let plaintext = Zeroizing::new(
        cipher::decrypt_aes_gcm(
            key.as_bytes(),
            &material.iv,
            &material.encrypted_private_key,
            &material.tag,
            None,
        )
        .map_err(|e| match e {
            CryptoError::Decryption => unlock.auth_error(),
            other => other,
        })?,
    );
    let private_key = PrivateKey::from_slice(&plaintext)?;

    let derived_public = public_key_of(&private_key);
    if !secure_compare(derived_public.as_bytes(), material.public_key.as_bytes()) {
        return Err(CryptoError::KeyMismatch);
    }
    Ok(private_key)
}

/// Generates a key pair and wraps it under `passcode` and a fresh recovery
/// code, using the default Argon2id parameters.
pub fn generate_and_encrypt_keys(passcode: &str) -> CryptoResult<KeySetupResult> {
    generate_and_encrypt_keys_with_params(passcode, &KdfParams::default())
}

/// [`generate_and_encrypt_keys`] with explicit Argon2id parameters.
pub fn generate_and_encrypt_keys_with_params(
    passcode: &str,
    params: &KdfParams,
) -> CryptoResult<KeySetupResult> {
    validate_passcode(passcode)?;

    let keypair = generate_keypair();
    let recovery_code = RecoveryCode::generate();

    let personal = wrap_private_key(&keypair.private_key, passcode, params)?;
    let recovery = wrap_private_key(&keypair.private_key, recovery_code.as_str(), params)?;
    debug!("generated user key pair with passcode and recovery copies");

    Ok(KeySetupResult {
        personal,
        recovery,
        recovery_code,
        raw_private_key: keypair.private_key,
    })
}

/// Unwraps passcode-protected key material.
///
/// Any authentication failure is reported as
/// [`CryptoError::IncorrectPasscode`].
pub fn decrypt_private_key(
    passcode: &str,
    material: &EncryptedKeyMaterial,
) -> CryptoResult<PrivateKey> {
    decrypt_private_key_with_params(passcode, material, &KdfParams::default())
}

/// [`decrypt_private_key`] with explicit Argon2id parameters.
pub fn decrypt_private_key_with_params(
    passcode: &str,
    material: &EncryptedKeyMaterial,
    params: &KdfParams,
) -> CryptoResult<PrivateKey> {
    unwrap_private_key(passcode, material, params, Unlock::Passcode)
}

/// Unwraps recovery-code-protected key material. Accepts the code with or
/// without display separators.
///
/// Any authentication failure is reported as
/// [`CryptoError::InvalidRecoveryCode`].
pub fn decrypt_private_key_with_recovery_code(
    recovery_code: &str,
    material: &EncryptedKeyMaterial,
) -> CryptoResult<PrivateKey> {
    decrypt_private_key_with_recovery_code_and_params(
        recovery_code,
        material,
        &KdfParams::default(),
    )
}

/// [`decrypt_private_key_with_recovery_code`] with explicit Argon2id
/// parameters.
pub fn decrypt_private_key_with_recovery_code_and_params(
    recovery_code: &str,
    material: &EncryptedKeyMaterial,
    params: &KdfParams,
) -> CryptoResult<PrivateKey> {
    let code = RecoveryCode::parse(recovery_code)?;
    unwrap_private_key(code.as_str(), material, params, Unlock::RecoveryCode)
}

/// Re-wraps the personal copy under a new passcode.
///
/// Fails with [`CryptoError::IncorrectPasscode`] if `current_passcode` does
/// not unwrap `material`. The recovery copy is not involved.
pub fn change_passcode(
    current_passcode: &str,
    new_passcode: &str,
    material: &EncryptedKeyMaterial,
) -> CryptoResult<EncryptedKeyMaterial> {
    change_passcode_with_params(current_passcode, new_passcode, material, &KdfParams::default())
}

/// [`change_passcode`] with explicit Argon2id parameters.
pub fn change_passcode_with_params(
    current_passcode: &str,
    new_passcode: &str,
    material: &EncryptedKeyMaterial,
    params: &KdfParams,
) -> CryptoResult<EncryptedKeyMaterial> {
    let private_key = decrypt_private_key_with_params(current_passcode, material, params)?;
    validate_passcode(new_passcode)?;

    let rewrapped = wrap_private_key(&private_key, new_passcode, params)?;
    debug!("passcode rotated");
    Ok(rewrapped)
}

/// Sets a new passcode using the recovery code, for a user who has lost the
/// old passcode. Returns fresh personal material; the recovery copy stays
/// valid.
pub fn reset_passcode_with_recovery_code(
    recovery_code: &str,
    new_passcode: &str,
    recovery_material: &EncryptedKeyMaterial,
) -> CryptoResult<EncryptedKeyMaterial> {
    reset_passcode_with_recovery_code_and_params(
        recovery_code,
        new_passcode,
        recovery_material,
        &KdfParams::default(),
    )
}

/// [`reset_passcode_with_recovery_code`] with explicit Argon2id parameters.
pub fn reset_passcode_with_recovery_code_and_params(
    recovery_code: &str,
    new_passcode: &str,
    recovery_material: &EncryptedKeyMaterial,
    params: &KdfParams,
) -> CryptoResult<EncryptedKeyMaterial> {
    let private_key = decrypt_private_key_with_recovery_code_and_params(
        recovery_code,
        recovery_material,
        params,
    )?;
    validate_passcode(new_passcode)?;

    let rewrapped = wrap_private_key(&private_key, new_passcode, params)?;
    debug!("passcode reset via recovery code");
    Ok(rewrapped)
}

/// Issues a new recovery code for an unlocked user, replacing the old
/// recovery copy. The personal copy is not involved.
pub fn regenerate_recovery_code(
    private_key: &PrivateKey,
) -> CryptoResult<(RecoveryCode, EncryptedKeyMaterial)> {
    regenerate_recovery_code_with_params(private_key, &KdfParams::default())
}

/// [`regenerate_recovery_code`] with explicit Argon2id parameters.
pub fn regenerate_recovery_code_with_params(
    private_key: &PrivateKey,
    params: &KdfParams,
) -> CryptoResult<(RecoveryCode, EncryptedKeyMaterial)> {
    let code = RecoveryCode::generate();
    let material = wrap_private_key(private_key, code.as_str(), params)?;
    debug!("recovery code regenerated");
    Ok((code, material))
}
