//! Offloads Argon2id derivation from the async runtime.
//!
//! A derivation at default cost takes hundreds of milliseconds and 128 MiB,
//! so it runs on tokio's blocking pool. A semaphore caps how many run at
//! once; the permit moves into the blocking task and is released only when
//! the derivation finishes, even if the caller stops waiting.

use std::sync::Arc;

use sealedchat_crypto::keys::{
    change_passcode_with_params, decrypt_private_key_with_params,
    decrypt_private_key_with_recovery_code_and_params, generate_and_encrypt_keys_with_params,
    regenerate_recovery_code_with_params, reset_passcode_with_recovery_code_and_params,
};
use sealedchat_crypto::{
    CryptoResult, EncryptedKeyMaterial, KdfParams, KeySetupResult, PrivateKey, RecoveryCode,
};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::E2eeConfig;
use crate::error::{E2eeError, E2eeResult};

/// Runs passcode and recovery-code operations on the blocking pool.
///
/// Cheap to clone; clones share the same concurrency limit.
#[derive(Clone, Debug)]
pub struct KdfWorker {
    params: KdfParams,
    permits: Arc<Semaphore>,
}

impl KdfWorker {
    /// Creates a worker from a validated config.
    pub fn new(config: &E2eeConfig) -> E2eeResult<Self> {
        config.validate()?;
        Ok(Self {
            params: config.kdf,
            permits: Arc::new(Semaphore::new(config.max_concurrent_derivations)),
        })
    }

    /// The Argon2id parameters every operation uses.
    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> E2eeResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&KdfParams) -> CryptoResult<T> + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| E2eeError::Worker(e.to_string()))?;
        let params = self.params;

        debug!("starting {op} on blocking pool");
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f(&params)
        })
        .await
        .map_err(|e| {
            warn!("{op} task failed: {e}");
            E2eeError::Worker(format!("{op}: {e}"))
        })?;

        Ok(result?)
    }

    /// Generates and wraps a new key pair. See
    /// [`generate_and_encrypt_keys`](sealedchat_crypto::generate_and_encrypt_keys).
    pub async fn generate_and_encrypt_keys(&self, passcode: &str) -> E2eeResult<KeySetupResult> {
        let passcode = Zeroizing::new(passcode.to_owned());
        self.run("key setup", move |params| {
            generate_and_encrypt_keys_with_params(&passcode, params)
        })
        .await
    }

    /// Unwraps passcode-protected key material.
    pub async fn decrypt_private_key(
        &self,
        passcode: &str,
        material: &EncryptedKeyMaterial,
    ) -> E2eeResult<PrivateKey> {
        let passcode = Zeroizing::new(passcode.to_owned());
        let material = material.clone();
        self.run("passcode unlock", move |params| {
            decrypt_private_key_with_params(&passcode, &material, params)
        })
        .await
    }

    /// Unwraps recovery-code-protected key material.
    pub async fn decrypt_private_key_with_recovery_code(
        &self,
        recovery_code: &str,
        material: &EncryptedKeyMaterial,
    ) -> E2eeResult<PrivateKey> {
        let code = Zeroizing::new(recovery_code.to_owned());
        let material = material.clone();
        self.run("recovery unlock", move |params| {
            decrypt_private_key_with_recovery_code_and_params(&code, &material, params)
        })
        .await
    }

    /// Re-wraps the personal copy under a new passcode.
    pub async fn change_passcode(
        &self,
        current_passcode: &str,
        new_passcode: &str,
        material: &EncryptedKeyMaterial,
    ) -> E2eeResult<EncryptedKeyMaterial> {
        let current = Zeroizing::new(current_passcode.to_owned());
        let new = Zeroizing::new(new_passcode.to_owned());
        let material = material.clone();
        self.run("passcode change", move |params| {
            change_passcode_with_params(&current, &new, &material, params)
        })
        .await
    }

    /// Sets a new passcode using the recovery code.
    pub async fn reset_passcode_with_recovery_code(
        &self,
        recovery_code: &str,
        new_passcode: &str,
        recovery_material: &EncryptedKeyMaterial,
    ) -> E2eeResult<EncryptedKeyMaterial> {
        let code = Zeroizing::new(recovery_code.to_owned());
        let new = Zeroizing::new(new_passcode.to_owned());
        let material = recovery_material.clone();
        self.run("passcode reset", move |params| {
            reset_passcode_with_recovery_code_and_params(&code, &new, &material, params)
        })
        .await
    }

    /// Issues a new recovery code and recovery copy.
    pub async fn regenerate_recovery_code(
        &self,
        private_key: &PrivateKey,
    ) -> E2eeResult<(RecoveryCode, EncryptedKeyMaterial)> {
        let private_key = private_key.clone();
        self.run("recovery code regeneration", move |params| {
            regenerate_recovery_code_with_params(&private_key, params)
        })
        .await
    }
}

impl Default for KdfWorker {
    fn default() -> Self {
        let config = E2eeConfig::default();
        Self {
            params: config.kdf,
            permits: Arc::new(Semaphore::new(config.max_concurrent_derivations)),
        }
    }
}
