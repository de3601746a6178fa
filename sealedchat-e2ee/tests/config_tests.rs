use pretty_assertions::assert_eq;
use sealedchat_crypto::KdfParams;
use sealedchat_e2ee::{E2eeConfig, E2eeError, KdfWorker};

#[test]
fn default_kdf_params() {
    let config = E2eeConfig::default();
    assert_eq!(
        config.kdf,
        KdfParams {
            time_cost: 4,
            memory_cost_kib: 131_072,
            parallelism: 2,
        }
    );
}

#[test]
fn default_single_derivation() {
    let config = E2eeConfig::default();
    assert_eq!(config.max_concurrent_derivations, 1);
}

#[test]
fn default_is_valid() {
    assert!(E2eeConfig::default().validate().is_ok());
}

#[test]
fn serialization_roundtrip() {
    let config = E2eeConfig {
        kdf: KdfParams {
            time_cost: 2,
            memory_cost_kib: 4096,
            parallelism: 1,
        },
        max_concurrent_derivations: 3,
    };
    let json = serde_json::to_string(&config).unwrap();
    let deserialized: E2eeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn missing_fields_take_defaults() {
    let config: E2eeConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, E2eeConfig::default());
}

#[test]
fn zero_concurrency_rejected() {
    let config = E2eeConfig {
        max_concurrent_derivations: 0,
        ..E2eeConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration: max_concurrent_derivations must be at least 1"
    );
}

#[test]
fn zero_time_cost_rejected() {
    let mut config = E2eeConfig::default();
    config.kdf.time_cost = 0;
    assert!(matches!(config.validate(), Err(E2eeError::Config(_))));
}

#[test]
fn zero_parallelism_rejected() {
    let mut config = E2eeConfig::default();
    config.kdf.parallelism = 0;
    assert!(matches!(config.validate(), Err(E2eeError::Config(_))));
}

#[test]
fn memory_below_argon2_minimum_rejected() {
    let mut config = E2eeConfig::default();
    config.kdf.parallelism = 4;
    config.kdf.memory_cost_kib = 31;
    let err = config.validate().unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration: kdf.memory_cost_kib must be at least 32 for parallelism 4"
    );
}

#[test]
fn worker_refuses_invalid_config() {
    let config = E2eeConfig {
        max_concurrent_derivations: 0,
        ..E2eeConfig::default()
    };
    assert!(KdfWorker::new(&config).is_err());
}
