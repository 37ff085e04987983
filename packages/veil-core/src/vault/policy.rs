//! # Lockout Policy
//!
//! The pure transition functions of the vault lockout state machine.
//!
//! ## State Machine
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     VAULT LOCKOUT STATE MACHINE                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   ┌─────────┐  failure   ┌─────────┐  3rd failure  ┌──────────┐        │
//! │   │  Clear  │───────────►│ Warning │──────────────►│  Locked  │        │
//! │   │ 0, None │            │ 1..2    │               │ 3..4,+24h│        │
//! │   └─────────┘            └─────────┘               └────┬─────┘        │
//! │        ▲                      │                         │ 5th failure  │
//! │        │                      │                         ▼              │
//! │        │   success            │              ┌────────────────────┐    │
//! │        ├──────────────────────┘              │ ForceReauth signal │    │
//! │        │   (from any state)                  │ counter reset to 0 │    │
//! │        │                                     │ lock window kept   │    │
//! │        └─────────────────────────────────────┴────────────────────┘    │
//! │                                                                         │
//! │   check_access: Denied while lock_until > now, Allowed otherwise        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every lock is time-bounded. Reaching the ceiling does not lock harder;
//! it hands control back to a stronger authentication factor upstream.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Failures that start a lock window
pub const DEFAULT_LOCK_THRESHOLD: u32 = 3;

/// Failures that trigger forced re-authentication
pub const DEFAULT_ESCALATION_CEILING: u32 = 5;

/// Lock window length (24 hours)
pub const DEFAULT_LOCK_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Longest lock window a policy may configure (one year)
pub const MAX_LOCK_WINDOW_SECS: i64 = 365 * 24 * 60 * 60;

/// Lockout thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutPolicy {
    /// Failed attempts that start a lock window
    pub lock_threshold: u32,
    /// Failed attempts that trigger forced re-authentication
    pub escalation_ceiling: u32,
    /// Lock window length in seconds
    pub lock_window_secs: i64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            lock_threshold: DEFAULT_LOCK_THRESHOLD,
            escalation_ceiling: DEFAULT_ESCALATION_CEILING,
            lock_window_secs: DEFAULT_LOCK_WINDOW_SECS,
        }
    }
}

impl LockoutPolicy {
    /// Reject policies the state machine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.lock_threshold == 0 {
            return Err(Error::InvalidConfig(
                "lockout.lock_threshold must be positive".into(),
            ));
        }
        if self.escalation_ceiling <= self.lock_threshold {
            return Err(Error::InvalidConfig(format!(
                "lockout.escalation_ceiling ({}) must exceed lock_threshold ({})",
                self.escalation_ceiling, self.lock_threshold
            )));
        }
        if self.lock_window_secs <= 0 || self.lock_window_secs > MAX_LOCK_WINDOW_SECS {
            return Err(Error::InvalidConfig(format!(
                "lockout.lock_window_secs must be between 1 and {}, got {}",
                MAX_LOCK_WINDOW_SECS, self.lock_window_secs
            )));
        }
        Ok(())
    }

    /// Lock window as a duration
    ///
    /// Clamped to `0..=MAX_LOCK_WINDOW_SECS` so an unvalidated policy
    /// still yields a representable duration.
    pub fn lock_window(&self) -> Duration {
        Duration::seconds(self.lock_window_secs.clamp(0, MAX_LOCK_WINDOW_SECS))
    }

    /// End of a lock window starting at `now`, saturating at the last
    /// representable instant
    fn lock_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.lock_window())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Apply one failed unlock attempt
    ///
    /// Pure: returns the next state and what the caller must do about it.
    pub fn record_failure(
        &self,
        state: &VaultLockState,
        now: DateTime<Utc>,
    ) -> (VaultLockState, FailureOutcome) {
        let attempts = state.failed_attempts.saturating_add(1);

        if attempts >= self.escalation_ceiling {
            // The escalation consumes the counter; any running lock stays.
            let next = VaultLockState {
                failed_attempts: 0,
                lock_until: state.lock_until,
            };
            return (next, FailureOutcome::ForceReauthentication);
        }

        let lock_until = if attempts >= self.lock_threshold {
            Some(self.lock_end(now))
        } else {
            state.lock_until
        };

        let next = VaultLockState {
            failed_attempts: attempts,
            lock_until,
        };
        (
            next,
            FailureOutcome::Recorded {
                failed_attempts: attempts,
                lock_until,
            },
        )
    }

    /// Apply a successful unlock
    pub fn record_success(&self, _state: &VaultLockState) -> VaultLockState {
        VaultLockState::clear()
    }
}

/// Lockout bookkeeping for one vault
///
/// Only the transitions on [`LockoutPolicy`] produce new values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultLockState {
    failed_attempts: u32,
    lock_until: Option<DateTime<Utc>>,
}

impl VaultLockState {
    /// The state of a new vault
    pub fn clear() -> Self {
        Self::default()
    }

    /// Rebuild a state read back from persistent storage
    pub fn restore(failed_attempts: u32, lock_until: Option<DateTime<Utc>>) -> Self {
        Self {
            failed_attempts,
            lock_until,
        }
    }

    /// Failed attempts since the last success or escalation
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// End of the current lock window, if one was ever set
    pub fn lock_until(&self) -> Option<DateTime<Utc>> {
        self.lock_until
    }

    /// Whether this is the Clear state
    pub fn is_clear(&self) -> bool {
        self.failed_attempts == 0 && self.lock_until.is_none()
    }

    /// Decide whether an unlock attempt may proceed at `now`
    pub fn check_access(&self, now: DateTime<Utc>) -> AccessDecision {
        match self.lock_until {
            Some(until) if until > now => AccessDecision::Denied {
                remaining: until - now,
            },
            _ => AccessDecision::Allowed,
        }
    }

    /// Coarse phase for display
    pub fn phase(&self, now: DateTime<Utc>) -> LockPhase {
        if matches!(self.check_access(now), AccessDecision::Denied { .. }) {
            LockPhase::Locked
        } else if self.failed_attempts == 0 {
            LockPhase::Clear
        } else {
            LockPhase::Warning
        }
    }
}

/// Coarse lockout phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    /// No failures on record
    Clear,
    /// Some failures, not locked
    Warning,
    /// Inside a lock window
    Locked,
}

/// Result of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The unlock attempt may proceed
    Allowed,
    /// The vault is locked for `remaining` more time
    Denied {
        /// Time left in the lock window
        remaining: Duration,
    },
}

impl AccessDecision {
    /// Whether access is allowed
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    /// Remaining lock time rounded to the nearest minute, at least one
    pub fn retry_after_minutes(&self) -> Option<i64> {
        match self {
            AccessDecision::Allowed => None,
            AccessDecision::Denied { remaining } => {
                let minutes = (remaining.num_milliseconds() + 30_000).div_euclid(60_000);
                Some(minutes.max(1))
            }
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.retry_after_minutes() {
            None => f.write_str("Vault access allowed."),
            Some(1) => f.write_str("Vault is locked. Try again in 1 minute."),
            Some(n) => write!(f, "Vault is locked. Try again in {} minutes.", n),
        }
    }
}

/// What a recorded failure means for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The failure was counted
    Recorded {
        /// Failures on record after this one
        failed_attempts: u32,
        /// Lock window end, if the vault is (or was) locked
        lock_until: Option<DateTime<Utc>>,
    },
    /// The ceiling was reached; the caller must force re-authentication
    ForceReauthentication,
}

// ============================================================================
// TESTS
// ============================================================================
