//! Persistence seam for vault lock state.
//!
//! The lockout record is shared and contended (several devices, rapid
//! retries), so the only write a store offers is a conditional one: the
//! new value lands only if the stored value still equals what the writer
//! read. [`VaultGuard`](super::VaultGuard) builds its atomic
//! read-modify-write on top of that.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::policy::VaultLockState;
use crate::error::Result;

/// Identifier of one protected vault
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultId(String);

impl VaultId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keyed storage for [`VaultLockState`] records
#[async_trait]
pub trait LockStateStore: Send + Sync {
    /// Read the current state; an unknown vault is Clear
    async fn load(&self, vault: &VaultId) -> Result<VaultLockState>;

    /// Replace the state with `new` only if it currently equals `expected`
    ///
    /// Returns whether the write happened.
    async fn compare_and_swap(
        &self,
        vault: &VaultId,
        expected: &VaultLockState,
        new: VaultLockState,
    ) -> Result<bool>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    states: Mutex<HashMap<VaultId, VaultLockState>>,
}

impl MemoryLockStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vaults with a non-Clear record
    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    /// Whether every vault is Clear
    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }
}

#[async_trait]
impl LockStateStore for MemoryLockStore {
    async fn load(&self, vault: &VaultId) -> Result<VaultLockState> {
        Ok(self.states.lock().get(vault).copied().unwrap_or_default())
    }

    async fn compare_and_swap(
        &self,
        vault: &VaultId,
        expected: &VaultLockState,
        new: VaultLockState,
    ) -> Result<bool> {
        let mut states = self.states.lock();
        let current = states.get(vault).copied().unwrap_or_default();
        if current != *expected {
            return Ok(false);
        }

        // Clear records are not kept
        if new.is_clear() {
            states.remove(vault);
        } else {
            states.insert(vault.clone(), new);
        }
        Ok(true)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_vault_is_clear() {
        let store = MemoryLockStore::new();
        let state = store.load(&VaultId::new("nope")).await.unwrap();
        assert!(state.is_clear());
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = MemoryLockStore::new();
        let vault = VaultId::generate();
        let one = VaultLockState::restore(1, None);

        assert!(store
            .compare_and_swap(&vault, &VaultLockState::clear(), one)
            .await
            .unwrap());
        assert_eq!(store.load(&vault).await.unwrap(), one);

        // Stale expectation is refused
        let two = VaultLockState::restore(2, None);
        assert!(!store
            .compare_and_swap(&vault, &VaultLockState::clear(), two)
            .await
            .unwrap());
        assert_eq!(store.load(&vault).await.unwrap(), one);
    }

    #[tokio::test]
    async fn test_clear_records_are_dropped() {
        let store = MemoryLockStore::new();
        let vault = VaultId::generate();
        let one = VaultLockState::restore(1, None);

        store
            .compare_and_swap(&vault, &VaultLockState::clear(), one)
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        store
            .compare_and_swap(&vault, &one, VaultLockState::clear())
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_vault_ids_are_unique() {
        let a = VaultId::generate();
        let b = VaultId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
