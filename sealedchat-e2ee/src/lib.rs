//! End-to-end encryption for SealedChat conversations.
//!
//! Builds on `sealedchat-crypto` to provide:
//! - Message encryption with fixed contexts for transport and storage
//! - Long-term memory entry encryption
//! - Organization key creation and distribution to members
//! - An unlocked-session holder that zeroizes its keys on lock
//! - Backend wire records for keys, stored messages and distributions
//!
//! Argon2id runs on tokio's blocking pool through [`KdfWorker`]; everything
//! else is synchronous.

pub mod config;
pub mod error;
pub mod kdf_worker;
pub mod memory;
pub mod message;
pub mod org;
pub mod session;
pub mod types;

pub use config::E2eeConfig;
pub use error::{E2eeError, E2eeResult, SessionKey};
pub use kdf_worker::KdfWorker;
pub use memory::{decrypt_memory, encrypt_memory};
pub use message::{
    decrypt_message_at_enclave, decrypt_message_from_enclave, decrypt_stored_message,
    decrypt_stored_messages, encrypt_message_from_enclave, encrypt_message_to_enclave,
    encrypt_stored_message, re_encrypt_history_for_transport,
};
pub use org::{
    OrgKeySetup, create_org_key, decrypt_distributed_org_key, decrypt_org_key,
    distribute_org_key_to_member, distribute_org_key_to_members, encrypt_org_key_for_member,
};
pub use session::KeySession;
pub use types::*;
