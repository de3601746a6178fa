use pretty_assertions::assert_eq;
use sealedchat_crypto::{CryptoError, EncryptionContext, decrypt_with_private_key, generate_keypair};
use sealedchat_e2ee::{
    DecryptedMessage, E2eeError, MessageRole, StoredMessage, decrypt_message_at_enclave,
    decrypt_stored_message, decrypt_stored_messages, encrypt_stored_message,
    re_encrypt_history_for_transport,
};

fn history(public_key: &sealedchat_crypto::PublicKey) -> Vec<StoredMessage> {
    vec![
        encrypt_stored_message(public_key, "What is a nonce?", MessageRole::User).unwrap(),
        encrypt_stored_message(public_key, "A number used once.", MessageRole::Assistant).unwrap(),
        encrypt_stored_message(public_key, "Thanks ✓", MessageRole::User).unwrap(),
    ]
}

// ── Role contexts ───────────────────────────────────────────────

#[test]
fn user_payload_read_as_assistant_fails() {
    let kp = generate_keypair();
    let stored = encrypt_stored_message(&kp.public_key, "secret", MessageRole::User).unwrap();

    let err = decrypt_stored_message(
        &kp.private_key,
        &stored.encrypted_content,
        MessageRole::Assistant,
    )
    .unwrap_err();
    match err {
        E2eeError::Crypto(CryptoError::Decryption) => {}
        other => panic!("expected decryption failure, got: {other:?}"),
    }
}

#[test]
fn stored_message_uses_role_context() {
    let kp = generate_keypair();
    let stored =
        encrypt_stored_message(&kp.public_key, "reply", MessageRole::Assistant).unwrap();

    let raw = decrypt_with_private_key(
        &kp.private_key,
        &stored.encrypted_content,
        EncryptionContext::AssistantMessageStorage,
    )
    .unwrap();
    assert_eq!(raw, b"reply");
}

#[test]
fn batch_decrypt_keeps_order_and_roles() {
    let kp = generate_keypair();
    let decrypted = decrypt_stored_messages(&kp.private_key, &history(&kp.public_key)).unwrap();

    assert_eq!(
        decrypted,
        vec![
            DecryptedMessage {
                role: MessageRole::User,
                content: "What is a nonce?".into(),
            },
            DecryptedMessage {
                role: MessageRole::Assistant,
                content: "A number used once.".into(),
            },
            DecryptedMessage {
                role: MessageRole::User,
                content: "Thanks ✓".into(),
            },
        ]
    );
}

#[test]
fn batch_decrypt_fails_on_mislabelled_role() {
    let kp = generate_keypair();
    let mut messages = history(&kp.public_key);
    messages[1].role = MessageRole::User;

    assert!(decrypt_stored_messages(&kp.private_key, &messages).is_err());
}

#[test]
fn decrypted_message_debug_hides_content() {
    let msg = DecryptedMessage {
        role: MessageRole::User,
        content: "my password is hunter2".into(),
    };
    let debug = format!("{msg:?}");
    assert!(!debug.contains("hunter2"));
}

// ── History re-encryption ───────────────────────────────────────

#[test]
fn history_reaches_enclave_intact() {
    let user = generate_keypair();
    let enclave = generate_keypair();
    let stored = history(&user.public_key);

    let transport =
        re_encrypt_history_for_transport(&user.private_key, &enclave.public_key, &stored).unwrap();
    assert_eq!(transport.len(), stored.len());

    let texts: Vec<String> = transport
        .iter()
        .map(|m| decrypt_message_at_enclave(&enclave.private_key, &m.encrypted_content).unwrap())
        .collect();
    assert_eq!(texts, ["What is a nonce?", "A number used once.", "Thanks ✓"]);
    assert_eq!(
        transport.iter().map(|m| m.role).collect::<Vec<_>>(),
        [MessageRole::User, MessageRole::Assistant, MessageRole::User]
    );
}

#[test]
fn re_encrypted_history_is_not_readable_by_user_key() {
    let user = generate_keypair();
    let enclave = generate_keypair();
    let transport = re_encrypt_history_for_transport(
        &user.private_key,
        &enclave.public_key,
        &history(&user.public_key),
    )
    .unwrap();

    assert!(
        decrypt_message_at_enclave(&user.private_key, &transport[0].encrypted_content).is_err()
    );
}

#[test]
fn re_encrypt_with_wrong_key_fails() {
    let user = generate_keypair();
    let other = generate_keypair();
    let enclave = generate_keypair();

    let err = re_encrypt_history_for_transport(
        &other.private_key,
        &enclave.public_key,
        &history(&user.public_key),
    )
    .unwrap_err();
    assert!(err.is_authentication_failure());
}

// ── Wire format ─────────────────────────────────────────────────

#[test]
fn stored_message_wire_shape() {
    let kp = generate_keypair();
    let stored = encrypt_stored_message(&kp.public_key, "hi", MessageRole::Assistant).unwrap();

    let value = serde_json::to_value(&stored).unwrap();
    assert_eq!(value["role"], "assistant");
    let content = value["encrypted_content"].as_object().unwrap();
    for field in ["ephemeral_public_key", "iv", "ciphertext", "auth_tag", "hkdf_salt"] {
        assert!(content[field].is_string(), "missing {field}");
    }

    let back: StoredMessage = serde_json::from_value(value).unwrap();
    assert_eq!(back, stored);
}

#[test]
fn stored_message_without_role_rejected() {
    let kp = generate_keypair();
    let stored = encrypt_stored_message(&kp.public_key, "hi", MessageRole::User).unwrap();
    let mut value = serde_json::to_value(&stored).unwrap();
    value.as_object_mut().unwrap().remove("role");

    assert!(serde_json::from_value::<StoredMessage>(value).is_err());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_role() -> impl Strategy<Value = MessageRole> {
        prop_oneof![Just(MessageRole::User), Just(MessageRole::Assistant)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn stored_text_roundtrip(text in ".{0,200}", role in any_role()) {
            let kp = generate_keypair();
            let stored = encrypt_stored_message(&kp.public_key, &text, role).unwrap();
            let back =
                decrypt_stored_message(&kp.private_key, &stored.encrypted_content, role).unwrap();
            prop_assert_eq!(back, text);
        }
    }
}
