//! Runtime configuration.
//!
//! Both sections default to the production values, so an empty or
//! partial TOML file is valid:
//!
//! ```toml
//! [kdf]
//! iterations = 100000
//! salt_len = 16
//!
//! [lockout]
//! lock_threshold = 3
//! escalation_ceiling = 5
//! lock_window_secs = 86400
//! ```

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::error::Result;
use crate::vault::LockoutPolicy;

/// Tunables for key derivation and vault lockout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VeilConfig {
    /// Passcode key derivation
    pub kdf: KdfParams,
    /// Vault lockout thresholds
    pub lockout: LockoutPolicy,
}

impl VeilConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.kdf.validate()?;
        self.lockout.validate()
    }
}
