//! Domain-separation contexts.
//!
//! Each context string is mixed into HKDF as the `info` parameter, so the
//! same key pair yields unrelated symmetric keys per purpose. The strings are
//! a wire contract with the processing service and must match it byte for
//! byte. Adding a variant requires the same change on the other side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// The closed set of contexts used with ephemeral-ECDH encryption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionContext {
    /// Client to processing enclave, outbound message.
    ClientToEnclaveTransport,
    /// Processing enclave to client, streamed reply.
    EnclaveToClientTransport,
    /// Persisted user turn.
    UserMessageStorage,
    /// Persisted assistant turn.
    AssistantMessageStorage,
    /// Org shared key wrapped to a member's public key.
    OrgKeyDistribution,
    /// Persisted long-term memory entry.
    MemoryStorage,
}

impl EncryptionContext {
    /// Every context, in wire-table order.
    pub const ALL: [EncryptionContext; 6] = [
        Self::ClientToEnclaveTransport,
        Self::EnclaveToClientTransport,
        Self::UserMessageStorage,
        Self::AssistantMessageStorage,
        Self::OrgKeyDistribution,
        Self::MemoryStorage,
    ];

    /// The wire string for this context.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientToEnclaveTransport => "client-to-enclave-transport",
            Self::EnclaveToClientTransport => "enclave-to-client-transport",
            Self::UserMessageStorage => "user-message-storage",
            Self::AssistantMessageStorage => "assistant-message-storage",
            Self::OrgKeyDistribution => "org-key-distribution",
            Self::MemoryStorage => "memory-storage",
        }
    }

    /// HKDF `info` bytes.
    pub fn info(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl fmt::Display for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionContext {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ctx| ctx.as_str() == s)
            .ok_or_else(|| CryptoError::UnknownContext(s.to_string()))
    }
}
