//! Cryptographic layer for SealedChat.
//!
//! Provides the primitives and key management behind end-to-end encrypted
//! chat:
//! - X25519 key pairs
//! - Argon2id for passcode and recovery-code key derivation
//! - X25519 + HKDF-SHA512 for ECDH key derivation with domain separation
//! - AES-256-GCM (16-byte IV, detached tag) for authenticated encryption
//! - Ephemeral-ECDH envelopes to a recipient's public key
//!
//! # Architecture
//!
//! ```text
//! passcode ──Argon2id──┐                 ┌── personal copy
//!                      ├─ AES-256-GCM ───┤
//! recovery ──Argon2id──┘  (private key)  └── recovery copy
//!
//! plaintext ── X25519(ephemeral, recipient) ── HKDF(salt, context) ── AES-256-GCM
//! ```
//!
//! The server only ever sees wrapped private keys and envelopes. Nothing in
//! this crate holds global state; every secret is passed in and out
//! explicitly, and secret types zeroize on drop.

mod cipher;
pub mod codec;
mod compare;
mod context;
pub mod envelope;
mod error;
mod kdf;
mod keypair;
pub mod keys;
pub mod recovery;

pub use cipher::{
    EncryptedData, IV_SIZE, KEY_SIZE as SYMMETRIC_KEY_SIZE, TAG_SIZE, decrypt_aes_gcm,
    decrypt_data, encrypt_aes_gcm,
};
pub use compare::secure_compare;
pub use context::EncryptionContext;
pub use envelope::{EncryptedPayload, decrypt_with_private_key, encrypt_to_public_key};
pub use error::{CryptoError, CryptoResult};
pub use kdf::{
    DERIVED_KEY_SIZE, DerivedKey, EcdhDerivation, KdfParams, SALT_SIZE, Salt,
    derive_key_from_ecdh, derive_key_from_passcode,
};
pub use keypair::{KEY_SIZE, KeyPair, PrivateKey, PublicKey, generate_keypair, public_key_of};
pub use keys::{
    EncryptedKeyMaterial, KeySetupResult, MIN_PASSCODE_LENGTH, change_passcode,
    decrypt_private_key, decrypt_private_key_with_recovery_code, generate_and_encrypt_keys,
    regenerate_recovery_code, reset_passcode_with_recovery_code,
};
pub use recovery::{
    RECOVERY_CODE_LENGTH, RecoveryCode, format_recovery_code, generate_recovery_code,
    parse_recovery_code,
};
