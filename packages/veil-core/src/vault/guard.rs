//! # Vault Guard
//!
//! Applies [`LockoutPolicy`] transitions to stored lock state atomically.
//!
//! ## Update Loop
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ATOMIC READ-MODIFY-WRITE                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   ┌──────────┐     ┌──────────────────┐     ┌──────────────────────┐   │
//! │   │  load()  │────►│ policy transition│────►│ compare_and_swap()   │   │
//! │   └──────────┘     │ (pure function)  │     │ expected = loaded    │   │
//! │        ▲           └──────────────────┘     └──────────┬───────────┘   │
//! │        │                                               │               │
//! │        │            lost the race                      │ won           │
//! │        └───────────────────────────────────────────────┤               │
//! │                                                        ▼               │
//! │                                              return the outcome        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A write only lands on the exact value its transition was computed
//! from, so N concurrent failures always end in the same state as some
//! one-at-a-time ordering of them. No increment is lost and two racing
//! fourth failures cannot both skip the escalation.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::policy::{AccessDecision, FailureOutcome, LockoutPolicy, VaultLockState};
use super::store::{LockStateStore, MemoryLockStore, VaultId};
use crate::error::{Error, Result};
use crate::time;

/// Upper bound on conditional-write retries for one operation
pub const MAX_CAS_ATTEMPTS: usize = 64;

/// Per-vault lockout enforcement over a shared store
pub struct VaultGuard<S: ?Sized = MemoryLockStore> {
    store: Arc<S>,
    policy: LockoutPolicy,
}

impl<S: ?Sized> Clone for VaultGuard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: LockStateStore + ?Sized> VaultGuard<S> {
    /// Create a guard, rejecting an invalid policy
    pub fn new(store: Arc<S>, policy: LockoutPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { store, policy })
    }

    /// The policy in force
    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Current stored state of a vault
    pub async fn state(&self, vault: &VaultId) -> Result<VaultLockState> {
        self.store.load(vault).await
    }

    /// Whether an unlock attempt may proceed now
    pub async fn check_access(&self, vault: &VaultId) -> Result<AccessDecision> {
        self.check_access_at(vault, time::now()).await
    }

    /// Whether an unlock attempt may proceed at `now`
    pub async fn check_access_at(
        &self,
        vault: &VaultId,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision> {
        Ok(self.store.load(vault).await?.check_access(now))
    }

    /// Record a failed unlock attempt now
    pub async fn record_failure(&self, vault: &VaultId) -> Result<FailureOutcome> {
        self.record_failure_at(vault, time::now()).await
    }

    /// Record a failed unlock attempt at `now`
    ///
    /// The caller must act on [`FailureOutcome::ForceReauthentication`].
    pub async fn record_failure_at(
        &self,
        vault: &VaultId,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome> {
        let policy = self.policy;
        let outcome = self
            .update(vault, |state| policy.record_failure(state, now))
            .await?;

        match outcome {
            FailureOutcome::ForceReauthentication => {
                tracing::warn!(vault = %vault, "Vault failure ceiling reached, forcing re-authentication");
            }
            FailureOutcome::Recorded {
                failed_attempts,
                lock_until: Some(until),
            } if failed_attempts >= policy.lock_threshold => {
                tracing::warn!(vault = %vault, failed_attempts, lock_until = %until, "Vault locked");
            }
            FailureOutcome::Recorded {
                failed_attempts, ..
            } => {
                tracing::debug!(vault = %vault, failed_attempts, "Recorded failed vault unlock");
            }
        }

        Ok(outcome)
    }

    /// Record a successful unlock, returning the vault to Clear
    pub async fn record_success(&self, vault: &VaultId) -> Result<()> {
        let policy = self.policy;
        self.update(vault, |state| (policy.record_success(state), ()))
            .await?;
        tracing::debug!(vault = %vault, "Vault unlocked, lock state cleared");
        Ok(())
    }

    /// Conditional-write retry loop
    async fn update<F, T>(&self, vault: &VaultId, transition: F) -> Result<T>
    where
        F: Fn(&VaultLockState) -> (VaultLockState, T),
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.store.load(vault).await?;
            let (next, out) = transition(&current);

            if next == current {
                return Ok(out);
            }
            if self.store.compare_and_swap(vault, &current, next).await? {
                return Ok(out);
            }

            tracing::debug!(vault = %vault, attempt, "Lock state changed underneath, retrying");
        }

        tracing::warn!(vault = %vault, attempts = MAX_CAS_ATTEMPTS, "Giving up on contended lock state");
        Err(Error::StorageContention(vault.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
