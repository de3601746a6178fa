//! Organization key distribution.
//!
//! An org owns one X25519 key pair. Its private key is never stored in the
//! clear: each holder gets a copy encrypted to their personal public key
//! under `org-key-distribution`.
//!
//! ```text
//! no key ──create_org_key──> admin has key ──distribute──> member has key
//!                                               ^
//!                          member pending ──────┘
//! ```
//!
//! Distribution decrypts the admin's copy, then re-encrypts it to each
//! member. The batch variant decrypts once for all members.

use sealedchat_crypto::{
    EncryptedPayload, EncryptionContext, PrivateKey, PublicKey, decrypt_with_private_key,
    encrypt_to_public_key, generate_keypair,
};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::E2eeResult;
use crate::types::{MemberKeyDistribution, OrgMember};

/// Output of [`create_org_key`].
///
/// Not `Serialize`: persist `org_public_key` and `admin_encrypted_org_key`;
/// `org_private_key` is for immediate use by the creating admin.
#[derive(Debug)]
pub struct OrgKeySetup {
    pub org_public_key: PublicKey,
    pub admin_encrypted_org_key: EncryptedPayload,
    pub org_private_key: PrivateKey,
}

/// Generates a new org key pair and encrypts the private key to the admin.
pub fn create_org_key(admin_public_key: &PublicKey) -> E2eeResult<OrgKeySetup> {
    let org = generate_keypair();
    let admin_encrypted_org_key = encrypt_org_key_for_member(&org.private_key, admin_public_key)?;
    info!("created org key pair");

    Ok(OrgKeySetup {
        org_public_key: org.public_key,
        admin_encrypted_org_key,
        org_private_key: org.private_key,
    })
}

/// Encrypts the org private key to one member's public key.
pub fn encrypt_org_key_for_member(
    org_private_key: &PrivateKey,
    member_public_key: &PublicKey,
) -> E2eeResult<EncryptedPayload> {
    Ok(encrypt_to_public_key(
        member_public_key,
        org_private_key.as_bytes(),
        EncryptionContext::OrgKeyDistribution,
    )?)
}

/// Recovers the org private key from a copy encrypted to `member_private_key`.
pub fn decrypt_org_key(
    member_private_key: &PrivateKey,
    encrypted_org_key: &EncryptedPayload,
) -> E2eeResult<PrivateKey> {
    let plaintext = Zeroizing::new(decrypt_with_private_key(
        member_private_key,
        encrypted_org_key,
        EncryptionContext::OrgKeyDistribution,
    )?);
    Ok(PrivateKey::from_slice(&plaintext)?)
}

/// Re-encrypts the org key held by an admin to a single member.
///
/// Fails if the admin's copy does not decrypt under `admin_private_key`, or
/// if `member_public_key` is not a usable X25519 key.
pub fn distribute_org_key_to_member(
    admin_private_key: &PrivateKey,
    admin_encrypted_org_key: &EncryptedPayload,
    member_public_key: &PublicKey,
) -> E2eeResult<EncryptedPayload> {
    let org_private_key = decrypt_org_key(admin_private_key, admin_encrypted_org_key)?;
    let payload = encrypt_org_key_for_member(&org_private_key, member_public_key)?;
    debug!("distributed org key to one member");
    Ok(payload)
}

/// Batch form of [`distribute_org_key_to_member`]. The admin's copy is
/// decrypted once; results keep the order of `members`.
///
/// Fails as a whole if any member key is unusable, so nothing partial is
/// handed back for storage.
pub fn distribute_org_key_to_members(
    admin_private_key: &PrivateKey,
    admin_encrypted_org_key: &EncryptedPayload,
    members: &[OrgMember],
) -> E2eeResult<Vec<MemberKeyDistribution>> {
    let org_private_key = decrypt_org_key(admin_private_key, admin_encrypted_org_key)?;
    distribute_decrypted_org_key(&org_private_key, members)
}

/// Encrypts an already-decrypted org key to each member.
pub(crate) fn distribute_decrypted_org_key(
    org_private_key: &PrivateKey,
    members: &[OrgMember],
) -> E2eeResult<Vec<MemberKeyDistribution>> {
    let distributions = members
        .iter()
        .map(|member| {
            let encrypted_org_key =
                encrypt_org_key_for_member(org_private_key, &member.public_key)?;
            debug!("encrypted org key for membership {}", member.membership_id);
            Ok(MemberKeyDistribution {
                membership_id: member.membership_id.clone(),
                encrypted_org_key,
            })
        })
        .collect::<E2eeResult<Vec<_>>>()?;
    info!("distributed org key to {} members", distributions.len());
    Ok(distributions)
}

/// Member side of distribution: recovers the org private key.
pub fn decrypt_distributed_org_key(
    member_private_key: &PrivateKey,
    encrypted_org_key: &EncryptedPayload,
) -> E2eeResult<PrivateKey> {
    decrypt_org_key(member_private_key, encrypted_org_key)
}
