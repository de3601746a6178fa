use pretty_assertions::assert_eq;
use sealedchat_crypto::{CryptoError, KdfParams, generate_keypair};
use sealedchat_e2ee::{
    E2eeConfig, E2eeError, KdfWorker, KeyRecord, KeySession, MessageRole, OrgMember,
    SessionKey, create_org_key, decrypt_distributed_org_key, decrypt_message_at_enclave,
    encrypt_message_from_enclave, encrypt_org_key_for_member, encrypt_stored_message,
};
use tracing_subscriber::EnvFilter;

fn worker() -> KdfWorker {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("sealedchat_e2ee=debug"))
        .with_test_writer()
        .try_init();

    let config = E2eeConfig {
        kdf: KdfParams {
            time_cost: 1,
            memory_cost_kib: 1024,
            parallelism: 1,
        },
        max_concurrent_derivations: 2,
    };
    KdfWorker::new(&config).unwrap()
}

async fn setup_record(worker: &KdfWorker, passcode: &str) -> (KeyRecord, String) {
    let setup = worker.generate_and_encrypt_keys(passcode).await.unwrap();
    (
        KeyRecord::from_setup(&setup),
        setup.recovery_code.formatted(),
    )
}

// ── Lifecycle ───────────────────────────────────────────────────

#[tokio::test]
async fn new_session_is_locked() {
    let session = KeySession::new(worker());
    assert!(!session.is_unlocked());
    assert!(matches!(
        session.personal_key(),
        Err(E2eeError::NotUnlocked(SessionKey::Personal))
    ));
    assert!(matches!(
        session.org_key(),
        Err(E2eeError::NotUnlocked(SessionKey::Org))
    ));
    assert!(matches!(
        session.transport_key(),
        Err(E2eeError::NotUnlocked(SessionKey::Transport))
    ));
}

#[tokio::test]
async fn unlock_with_passcode_then_lock() {
    let worker = worker();
    let (record, _) = setup_record(&worker, "123456").await;
    let mut session = KeySession::new(worker);

    session.unlock_with_passcode("123456", &record).await.unwrap();
    assert!(session.is_unlocked());
    assert_eq!(session.public_key().unwrap(), record.public_key);

    session.lock();
    assert!(!session.is_unlocked());
    assert!(session.public_key().is_err());
}

#[tokio::test]
async fn wrong_passcode_leaves_session_locked() {
    let worker = worker();
    let (record, _) = setup_record(&worker, "123456").await;
    let mut session = KeySession::new(worker);

    let err = session.unlock_with_passcode("wrong1", &record).await.unwrap_err();
    match err {
        E2eeError::Crypto(CryptoError::IncorrectPasscode) => {}
        other => panic!("expected incorrect passcode, got: {other:?}"),
    }
    assert!(!session.is_unlocked());
}

#[tokio::test]
async fn unlock_with_recovery_code() {
    let worker = worker();
    let (record, code) = setup_record(&worker, "123456").await;
    let mut session = KeySession::new(worker);

    session.unlock_with_recovery_code(&code, &record).await.unwrap();
    assert_eq!(session.public_key().unwrap(), record.public_key);
}

#[tokio::test]
async fn recovery_unlock_without_recovery_keys() {
    let worker = worker();
    let (mut record, code) = setup_record(&worker, "123456").await;
    record.recovery_salt = None;
    let mut session = KeySession::new(worker);

    let err = session.unlock_with_recovery_code(&code, &record).await.unwrap_err();
    assert!(matches!(err, E2eeError::MissingRecoveryKeys));
}

#[tokio::test]
async fn unlock_with_raw_key_after_setup() {
    let worker = worker();
    let setup = worker.generate_and_encrypt_keys("123456").await.unwrap();
    let expected = setup.personal.public_key;
    let mut session = KeySession::new(worker);

    session.unlock_with_key(setup.raw_private_key);
    assert_eq!(session.public_key().unwrap(), expected);
}

#[tokio::test]
async fn debug_output_shows_presence_only() {
    let mut session = KeySession::new(worker());
    session.unlock_with_key(generate_keypair().private_key);
    let debug = format!("{session:?}");
    assert!(debug.contains("personal: true"));
    assert!(debug.contains("org: false"));
}

// ── Passcode rotation through the worker ────────────────────────

#[tokio::test]
async fn change_and_reset_passcode() {
    let worker = worker();
    let (mut record, code) = setup_record(&worker, "123456").await;

    let rotated = worker
        .change_passcode("123456", "abcdef", &record.personal())
        .await
        .unwrap();
    record.set_personal(rotated);

    let mut session = KeySession::new(worker.clone());
    assert!(session.unlock_with_passcode("123456", &record).await.is_err());
    session.unlock_with_passcode("abcdef", &record).await.unwrap();

    let reset = worker
        .reset_passcode_with_recovery_code(&code, "zyxwvu", &record.recovery().unwrap())
        .await
        .unwrap();
    record.set_personal(reset);
    session.lock();
    session.unlock_with_passcode("zyxwvu", &record).await.unwrap();
}

#[tokio::test]
async fn regenerated_recovery_code_unlocks() {
    let worker = worker();
    let (mut record, old_code) = setup_record(&worker, "123456").await;
    let mut session = KeySession::new(worker.clone());
    session.unlock_with_passcode("123456", &record).await.unwrap();

    let (code, material) = worker
        .regenerate_recovery_code(session.personal_key().unwrap())
        .await
        .unwrap();
    record.set_recovery(material);

    let mut fresh = KeySession::new(worker);
    assert!(fresh.unlock_with_recovery_code(&old_code, &record).await.is_err());
    fresh.unlock_with_recovery_code(code.as_str(), &record).await.unwrap();
}

#[tokio::test]
async fn concurrent_unlocks_share_the_limit() {
    let worker = worker();
    let (record, _) = setup_record(&worker, "123456").await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let worker = worker.clone();
            let record = record.clone();
            tokio::spawn(async move {
                let mut session = KeySession::new(worker);
                session.unlock_with_passcode("123456", &record).await.map(|_| session.is_unlocked())
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().unwrap());
    }
}

// ── Messages and org keys ───────────────────────────────────────

#[tokio::test]
async fn session_decrypts_own_history() {
    let user = generate_keypair();
    let stored = encrypt_stored_message(&user.public_key, "hello", MessageRole::User).unwrap();
    let mut session = KeySession::new(worker());

    assert!(matches!(
        session.decrypt_stored_message(&stored),
        Err(E2eeError::NotUnlocked(SessionKey::Personal))
    ));

    session.unlock_with_key(user.private_key.clone());
    assert_eq!(session.decrypt_stored_message(&stored).unwrap(), "hello");
    assert_eq!(session.decrypt_stored_messages(&[stored]).unwrap()[0].content, "hello");
}

#[tokio::test]
async fn session_round_trip_with_enclave() {
    let user = generate_keypair();
    let enclave = generate_keypair();
    let transport = generate_keypair();
    let history = vec![
        encrypt_stored_message(&user.public_key, "q", MessageRole::User).unwrap(),
        encrypt_stored_message(&user.public_key, "a", MessageRole::Assistant).unwrap(),
    ];

    let mut session = KeySession::new(worker());
    session.unlock_with_key(user.private_key.clone());
    session.set_transport_key(transport.private_key.clone());

    let outbound = session
        .re_encrypt_history_for_transport(&enclave.public_key, &history)
        .unwrap();
    assert_eq!(
        decrypt_message_at_enclave(&enclave.private_key, &outbound[1].encrypted_content).unwrap(),
        "a"
    );

    let reply = encrypt_message_from_enclave(&transport.public_key, "streamed").unwrap();
    assert_eq!(session.decrypt_reply(&reply).unwrap(), "streamed");

    session.lock();
    assert!(matches!(
        session.decrypt_reply(&reply),
        Err(E2eeError::NotUnlocked(SessionKey::Transport))
    ));
}

#[tokio::test]
async fn org_key_requires_personal_key() {
    let mut session = KeySession::new(worker());
    let admin = generate_keypair();
    let org = create_org_key(&admin.public_key).unwrap();

    assert!(matches!(
        session.load_org_key(&org.admin_encrypted_org_key),
        Err(E2eeError::NotUnlocked(SessionKey::Personal))
    ));
}

#[tokio::test]
async fn admin_session_distributes_to_pending_members() {
    let admin = generate_keypair();
    let member = generate_keypair();
    let org = create_org_key(&admin.public_key).unwrap();

    let mut session = KeySession::new(worker());
    session.unlock_with_key(admin.private_key.clone());
    assert!(matches!(
        session.distribute_org_key_to_members(&[]),
        Err(E2eeError::NotUnlocked(SessionKey::Org))
    ));

    session.load_org_key(&org.admin_encrypted_org_key).unwrap();
    let out = session
        .distribute_org_key_to_members(&[OrgMember {
            membership_id: "mem_1".into(),
            public_key: member.public_key,
        }])
        .unwrap();

    let recovered =
        decrypt_distributed_org_key(&member.private_key, &out[0].encrypted_org_key).unwrap();
    assert_eq!(recovered.as_bytes(), org.org_private_key.as_bytes());
}

#[tokio::test]
async fn member_session_reads_org_history() {
    let member = generate_keypair();
    let org = generate_keypair();
    let encrypted_org_key =
        encrypt_org_key_for_member(&org.private_key, &member.public_key).unwrap();
    let shared =
        encrypt_stored_message(&org.public_key, "team note", MessageRole::Assistant).unwrap();

    let mut session = KeySession::new(worker());
    session.unlock_with_key(member.private_key.clone());
    session.load_org_key(&encrypted_org_key).unwrap();

    assert_eq!(session.decrypt_org_stored_message(&shared).unwrap(), "team note");
    assert!(session.decrypt_stored_message(&shared).is_err());
}

#[tokio::test]
async fn relocking_with_new_key_drops_org_key() {
    let member = generate_keypair();
    let org = generate_keypair();
    let encrypted_org_key =
        encrypt_org_key_for_member(&org.private_key, &member.public_key).unwrap();

    let mut session = KeySession::new(worker());
    session.unlock_with_key(member.private_key.clone());
    session.load_org_key(&encrypted_org_key).unwrap();
    session.unlock_with_key(generate_keypair().private_key);

    assert!(session.org_key().is_err());
}
