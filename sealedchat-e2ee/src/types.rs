//! Records exchanged with the storage backend.
//!
//! Field names are the backend's snake_case names. Binary values travel as
//! lowercase hex, and fixed-size fields are length-checked on
//! deserialization.

use sealedchat_crypto::codec::hex_option;
use sealedchat_crypto::{
    EncryptedKeyMaterial, EncryptedPayload, EncryptionContext, IV_SIZE, KEY_SIZE, KeySetupResult,
    PublicKey, Salt, TAG_SIZE,
};
use serde::{Deserialize, Serialize};

use crate::error::{E2eeError, E2eeResult};

/// A user's key record as stored by the backend.
///
/// The passcode-wrapped copy is always present. The recovery copy may be
/// absent on records created before recovery codes existed. Both wrapped
/// keys are exactly [`KEY_SIZE`] bytes, so a damaged record is rejected when
/// it is parsed rather than after a passcode has been run through Argon2id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub public_key: PublicKey,
    #[serde(with = "hex::serde")]
    pub encrypted_private_key: [u8; KEY_SIZE],
    #[serde(with = "hex::serde")]
    pub iv: [u8; IV_SIZE],
    #[serde(with = "hex::serde")]
    pub tag: [u8; TAG_SIZE],
    pub salt: Salt,
    #[serde(default, with = "hex_option")]
    pub recovery_encrypted_private_key: Option<[u8; KEY_SIZE]>,
    #[serde(default, with = "hex_option")]
    pub recovery_iv: Option<[u8; IV_SIZE]>,
    #[serde(default, with = "hex_option")]
    pub recovery_tag: Option<[u8; TAG_SIZE]>,
    #[serde(default)]
    pub recovery_salt: Option<Salt>,
}

impl KeyRecord {
    /// Builds the record to persist after first-time setup. Both copies come
    /// from the same setup, so they are always stored together.
    pub fn from_setup(setup: &KeySetupResult) -> Self {
        let personal = setup.personal.clone();
        let recovery = setup.recovery.clone();
        Self {
            public_key: personal.public_key,
            encrypted_private_key: personal.encrypted_private_key,
            iv: personal.iv,
            tag: personal.tag,
            salt: personal.salt,
            recovery_encrypted_private_key: Some(recovery.encrypted_private_key),
            recovery_iv: Some(recovery.iv),
            recovery_tag: Some(recovery.tag),
            recovery_salt: Some(recovery.salt),
        }
    }

    /// Parses a record as returned by the backend.
    pub fn from_json(json: &str) -> E2eeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the record in the backend's wire format.
    pub fn to_json(&self) -> E2eeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The passcode-wrapped copy.
    pub fn personal(&self) -> EncryptedKeyMaterial {
        EncryptedKeyMaterial {
            public_key: self.public_key,
            encrypted_private_key: self.encrypted_private_key,
            iv: self.iv,
            tag: self.tag,
            salt: self.salt,
        }
    }

    /// The recovery-code-wrapped copy, or
    /// [`E2eeError::MissingRecoveryKeys`] if any recovery field is absent.
    pub fn recovery(&self) -> E2eeResult<EncryptedKeyMaterial> {
        match (
            self.recovery_encrypted_private_key,
            self.recovery_iv,
            self.recovery_tag,
            self.recovery_salt,
        ) {
            (Some(encrypted), Some(iv), Some(tag), Some(salt)) => Ok(EncryptedKeyMaterial {
                public_key: self.public_key,
                encrypted_private_key: encrypted,
                iv,
                tag,
                salt,
            }),
            _ => Err(E2eeError::MissingRecoveryKeys),
        }
    }

    /// True if all four recovery fields are present.
    pub fn has_recovery(&self) -> bool {
        self.recovery().is_ok()
    }

    /// Replaces the passcode-wrapped copy, e.g. after a passcode change.
    pub fn set_personal(&mut self, material: EncryptedKeyMaterial) {
        self.public_key = material.public_key;
        self.encrypted_private_key = material.encrypted_private_key;
        self.iv = material.iv;
        self.tag = material.tag;
        self.salt = material.salt;
    }

    /// Replaces the recovery-code-wrapped copy.
    pub fn set_recovery(&mut self, material: EncryptedKeyMaterial) {
        self.recovery_encrypted_private_key = Some(material.encrypted_private_key);
        self.recovery_iv = Some(material.iv);
        self.recovery_tag = Some(material.tag);
        self.recovery_salt = Some(material.salt);
    }
}

/// Author of a stored conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// The storage context a turn with this role is encrypted under.
    pub const fn storage_context(self) -> EncryptionContext {
        match self {
            Self::User => EncryptionContext::UserMessageStorage,
            Self::Assistant => EncryptionContext::AssistantMessageStorage,
        }
    }
}

/// A persisted conversation turn. The role is required: it selects the
/// context the content was encrypted under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: MessageRole,
    pub encrypted_content: EncryptedPayload,
}

/// A stored turn after decryption. Lives in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    pub role: MessageRole,
    pub content: String,
}

impl std::fmt::Debug for DecryptedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedMessage")
            .field("role", &self.role)
            .field("content", &format_args!("[{} bytes]", self.content.len()))
            .finish()
    }
}

/// A membership eligible to receive the org key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMember {
    pub membership_id: String,
    pub public_key: PublicKey,
}

/// The org private key encrypted to one member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberKeyDistribution {
    pub membership_id: String,
    pub encrypted_org_key: EncryptedPayload,
}

/// Where a membership stands with respect to the org key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKeyState {
    /// The member has not set up a personal key yet.
    NoPersonalKey,
    /// The member has a personal key but no copy of the org key.
    Pending,
    /// The member holds an encrypted copy of the org key.
    HasOrgKey,
}

impl MemberKeyState {
    /// Derives the state from what the membership record holds.
    pub fn from_membership(has_personal_key: bool, has_org_key: bool) -> Self {
        match (has_personal_key, has_org_key) {
            (_, true) => Self::HasOrgKey,
            (true, false) => Self::Pending,
            (false, false) => Self::NoPersonalKey,
        }
    }

    /// True when an admin can and should distribute the org key.
    pub fn needs_distribution(self) -> bool {
        self == Self::Pending
    }
}

/// A history turn re-encrypted for the processing enclave under
/// `client-to-enclave-transport`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportMessage {
    pub role: MessageRole,
    pub encrypted_content: EncryptedPayload,
}
