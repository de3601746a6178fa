//! E2EE configuration.

use sealedchat_crypto::KdfParams;
use serde::{Deserialize, Serialize};

use crate::error::{E2eeError, E2eeResult};

/// Configuration for passcode unlock and key derivation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct E2eeConfig {
    /// Argon2id cost. Must match the parameters the key material was
    /// wrapped with.
    #[serde(default)]
    pub kdf: KdfParams,

    /// Upper bound on Argon2id derivations running at once. Each one holds
    /// `kdf.memory_cost_kib` of memory for its whole duration.
    #[serde(default = "default_max_concurrent_derivations")]
    pub max_concurrent_derivations: usize,
}

fn default_max_concurrent_derivations() -> usize {
    1
}

impl Default for E2eeConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            max_concurrent_derivations: default_max_concurrent_derivations(),
        }
    }
}

impl E2eeConfig {
    /// Checks the values Argon2 and the worker pool would reject later.
    pub fn validate(&self) -> E2eeResult<()> {
        if self.max_concurrent_derivations == 0 {
            return Err(E2eeError::Config(
                "max_concurrent_derivations must be at least 1".to_string(),
            ));
        }
        if self.kdf.time_cost == 0 {
            return Err(E2eeError::Config("kdf.time_cost must be at least 1".to_string()));
        }
        if self.kdf.parallelism == 0 {
            return Err(E2eeError::Config(
                "kdf.parallelism must be at least 1".to_string(),
            ));
        }
        let min_memory = 8 * self.kdf.parallelism;
        if self.kdf.memory_cost_kib < min_memory {
            return Err(E2eeError::Config(format!(
                "kdf.memory_cost_kib must be at least {min_memory} for parallelism {}",
                self.kdf.parallelism
            )));
        }
        Ok(())
    }
}
