//! The unlocked-session key holder.
//!
//! A [`KeySession`] owns the decrypted private keys for one signed-in user:
//! their personal key, optionally an org key, and optionally a transport
//! key used to receive enclave replies. Each key is either absent or
//! present. [`KeySession::lock`] zeroizes all of them.
//!
//! Sessions are plain owned values. Nothing here is global, and two sessions
//! never share key material.

use std::fmt;

use sealedchat_crypto::{EncryptedPayload, PrivateKey, PublicKey, public_key_of};
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::error::{E2eeError, E2eeResult, SessionKey};
use crate::kdf_worker::KdfWorker;
use crate::message;
use crate::org;
use crate::types::{
    DecryptedMessage, KeyRecord, MemberKeyDistribution, OrgMember, StoredMessage,
    TransportMessage,
};

/// Decrypted key material for one signed-in user.
pub struct KeySession {
    worker: KdfWorker,
    personal: Option<PrivateKey>,
    org: Option<PrivateKey>,
    transport: Option<PrivateKey>,
}

impl KeySession {
    pub fn new(worker: KdfWorker) -> Self {
        Self {
            worker,
            personal: None,
            org: None,
            transport: None,
        }
    }

    /// The worker used for passcode and recovery-code derivation.
    pub fn worker(&self) -> &KdfWorker {
        &self.worker
    }

    /// Unlocks with the user's passcode. On failure the session is left as
    /// it was.
    pub async fn unlock_with_passcode(
        &mut self,
        passcode: &str,
        record: &KeyRecord,
    ) -> E2eeResult<()> {
        let key = self
            .worker
            .decrypt_private_key(passcode, &record.personal())
            .await?;
        self.install_personal(key);
        info!("session unlocked with passcode");
        Ok(())
    }

    /// Unlocks with the recovery code. Fails with
    /// [`E2eeError::MissingRecoveryKeys`] if the record has no recovery copy.
    pub async fn unlock_with_recovery_code(
        &mut self,
        recovery_code: &str,
        record: &KeyRecord,
    ) -> E2eeResult<()> {
        let material = record.recovery()?;
        let key = self
            .worker
            .decrypt_private_key_with_recovery_code(recovery_code, &material)
            .await?;
        self.install_personal(key);
        info!("session unlocked with recovery code");
        Ok(())
    }

    /// Unlocks with an already-decrypted key, e.g. the raw key returned by
    /// first-time setup.
    pub fn unlock_with_key(&mut self, private_key: PrivateKey) {
        self.install_personal(private_key);
        info!("session unlocked with raw key");
    }

    fn install_personal(&mut self, private_key: PrivateKey) {
        // A new personal key invalidates any org key unwrapped with the old one.
        self.org.zeroize();
        self.personal = Some(private_key);
    }

    pub fn is_unlocked(&self) -> bool {
        self.personal.is_some()
    }

    /// Zeroizes every held key. The session can be unlocked again.
    pub fn lock(&mut self) {
        self.personal.zeroize();
        self.org.zeroize();
        self.transport.zeroize();
        info!("session locked");
    }

    pub fn personal_key(&self) -> E2eeResult<&PrivateKey> {
        self.personal
            .as_ref()
            .ok_or(E2eeError::NotUnlocked(SessionKey::Personal))
    }

    pub fn public_key(&self) -> E2eeResult<PublicKey> {
        self.personal_key().map(public_key_of)
    }

    /// Decrypts this user's copy of the org key and holds it.
    pub fn load_org_key(&mut self, encrypted_org_key: &EncryptedPayload) -> E2eeResult<()> {
        let org_key = org::decrypt_org_key(self.personal_key()?, encrypted_org_key)?;
        self.org = Some(org_key);
        debug!("org key loaded into session");
        Ok(())
    }

    pub fn org_key(&self) -> E2eeResult<&PrivateKey> {
        self.org
            .as_ref()
            .ok_or(E2eeError::NotUnlocked(SessionKey::Org))
    }

    /// Holds the private key enclave replies are encrypted to.
    pub fn set_transport_key(&mut self, private_key: PrivateKey) {
        self.transport = Some(private_key);
    }

    pub fn transport_key(&self) -> E2eeResult<&PrivateKey> {
        self.transport
            .as_ref()
            .ok_or(E2eeError::NotUnlocked(SessionKey::Transport))
    }

    /// Decrypts one of this user's stored turns.
    pub fn decrypt_stored_message(&self, message: &StoredMessage) -> E2eeResult<String> {
        message::decrypt_stored_message(
            self.personal_key()?,
            &message.encrypted_content,
            message.role,
        )
    }

    /// Decrypts this user's stored history.
    pub fn decrypt_stored_messages(
        &self,
        messages: &[StoredMessage],
    ) -> E2eeResult<Vec<DecryptedMessage>> {
        message::decrypt_stored_messages(self.personal_key()?, messages)
    }

    /// Decrypts a turn stored under the org key.
    pub fn decrypt_org_stored_message(&self, message: &StoredMessage) -> E2eeResult<String> {
        message::decrypt_stored_message(self.org_key()?, &message.encrypted_content, message.role)
    }

    /// Re-encrypts this user's stored history for the enclave.
    pub fn re_encrypt_history_for_transport(
        &self,
        enclave_public_key: &PublicKey,
        messages: &[StoredMessage],
    ) -> E2eeResult<Vec<TransportMessage>> {
        let private_key = self.personal_key()?;
        message::re_encrypt_history_for_transport(private_key, enclave_public_key, messages)
    }

    /// Decrypts a streamed reply with the transport key.
    pub fn decrypt_reply(&self, payload: &EncryptedPayload) -> E2eeResult<String> {
        message::decrypt_message_from_enclave(self.transport_key()?, payload)
    }

    /// Encrypts the held org key to each pending member.
    pub fn distribute_org_key_to_members(
        &self,
        members: &[OrgMember],
    ) -> E2eeResult<Vec<MemberKeyDistribution>> {
        org::distribute_decrypted_org_key(self.org_key()?, members)
    }
}

impl fmt::Debug for KeySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySession")
            .field("personal", &self.personal.is_some())
            .field("org", &self.org.is_some())
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}
