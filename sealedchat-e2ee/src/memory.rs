//! Long-term memory entries, encrypted under `memory-storage`.

use sealedchat_crypto::{
    EncryptedPayload, EncryptionContext, PrivateKey, PublicKey, encrypt_to_public_key,
};

use crate::error::E2eeResult;
use crate::message::decrypt_text;

/// Encrypts a memory entry to its owner.
pub fn encrypt_memory(public_key: &PublicKey, content: &str) -> E2eeResult<EncryptedPayload> {
    Ok(encrypt_to_public_key(
        public_key,
        content.as_bytes(),
        EncryptionContext::MemoryStorage,
    )?)
}

/// Decrypts a memory entry.
pub fn decrypt_memory(private_key: &PrivateKey, payload: &EncryptedPayload) -> E2eeResult<String> {
    decrypt_text(private_key, payload, EncryptionContext::MemoryStorage)
}
