//! Message encryption.
//!
//! Each function fixes the context for one kind of payload, so a caller
//! cannot encrypt a stored turn under a transport context by accident.
//! Text is UTF-8 at this boundary.
//!
//! | Direction | Context |
//! |---|---|
//! | client -> enclave | `client-to-enclave-transport` |
//! | enclave -> client | `enclave-to-client-transport` |
//! | stored user turn | `user-message-storage` |
//! | stored assistant turn | `assistant-message-storage` |

use sealedchat_crypto::{
    EncryptedPayload, EncryptionContext, PrivateKey, PublicKey, decrypt_with_private_key,
    encrypt_to_public_key,
};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{E2eeError, E2eeResult};
use crate::types::{DecryptedMessage, MessageRole, StoredMessage, TransportMessage};

/// Decrypts under `context` and decodes the plaintext as UTF-8.
pub(crate) fn decrypt_text(
    private_key: &PrivateKey,
    payload: &EncryptedPayload,
    context: EncryptionContext,
) -> E2eeResult<String> {
    let plaintext = Zeroizing::new(decrypt_with_private_key(private_key, payload, context)?);
    std::str::from_utf8(&plaintext)
        .map(str::to_owned)
        .map_err(|_| E2eeError::InvalidUtf8)
}

/// Encrypts an outbound message to the processing enclave.
pub fn encrypt_message_to_enclave(
    enclave_public_key: &PublicKey,
    message: &str,
) -> E2eeResult<EncryptedPayload> {
    Ok(encrypt_to_public_key(
        enclave_public_key,
        message.as_bytes(),
        EncryptionContext::ClientToEnclaveTransport,
    )?)
}

/// Enclave side of [`encrypt_message_to_enclave`].
pub fn decrypt_message_at_enclave(
    enclave_private_key: &PrivateKey,
    payload: &EncryptedPayload,
) -> E2eeResult<String> {
    decrypt_text(
        enclave_private_key,
        payload,
        EncryptionContext::ClientToEnclaveTransport,
    )
}

/// Enclave side of a streamed reply: encrypts to the client's transport key.
pub fn encrypt_message_from_enclave(
    client_public_key: &PublicKey,
    message: &str,
) -> E2eeResult<EncryptedPayload> {
    Ok(encrypt_to_public_key(
        client_public_key,
        message.as_bytes(),
        EncryptionContext::EnclaveToClientTransport,
    )?)
}

/// Decrypts a reply chunk produced by the enclave.
pub fn decrypt_message_from_enclave(
    private_key: &PrivateKey,
    payload: &EncryptedPayload,
) -> E2eeResult<String> {
    decrypt_text(
        private_key,
        payload,
        EncryptionContext::EnclaveToClientTransport,
    )
}

/// Encrypts a conversation turn for storage under its role's context.
pub fn encrypt_stored_message(
    public_key: &PublicKey,
    message: &str,
    role: MessageRole,
) -> E2eeResult<StoredMessage> {
    let encrypted_content =
        encrypt_to_public_key(public_key, message.as_bytes(), role.storage_context())?;
    Ok(StoredMessage {
        role,
        encrypted_content,
    })
}

/// Decrypts a stored turn. A payload stored under the other role's context
/// fails authentication.
pub fn decrypt_stored_message(
    private_key: &PrivateKey,
    payload: &EncryptedPayload,
    role: MessageRole,
) -> E2eeResult<String> {
    decrypt_text(private_key, payload, role.storage_context())
}

/// Decrypts stored history in order. Fails on the first turn that does not
/// decrypt.
pub fn decrypt_stored_messages(
    private_key: &PrivateKey,
    messages: &[StoredMessage],
) -> E2eeResult<Vec<DecryptedMessage>> {
    let decrypted = messages
        .iter()
        .map(|m| {
            Ok(DecryptedMessage {
                role: m.role,
                content: decrypt_stored_message(private_key, &m.encrypted_content, m.role)?,
            })
        })
        .collect::<E2eeResult<Vec<_>>>()?;
    debug!("decrypted {} stored messages", decrypted.len());
    Ok(decrypted)
}

/// Moves stored history from rest to transit: each turn is decrypted with
/// the caller's key and re-encrypted to the enclave under
/// `client-to-enclave-transport`.
///
/// Plaintext exists only inside this call and is zeroized per turn.
pub fn re_encrypt_history_for_transport(
    private_key: &PrivateKey,
    enclave_public_key: &PublicKey,
    messages: &[StoredMessage],
) -> E2eeResult<Vec<TransportMessage>> {
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        let plaintext = Zeroizing::new(decrypt_with_private_key(
            private_key,
            &message.encrypted_content,
            message.role.storage_context(),
        )?);
        let encrypted_content = encrypt_to_public_key(
            enclave_public_key,
            &plaintext,
            EncryptionContext::ClientToEnclaveTransport,
        )?;
        out.push(TransportMessage {
            role: message.role,
            encrypted_content,
        });
    }
    debug!("re-encrypted {} history messages for transport", out.len());
    Ok(out)
}
