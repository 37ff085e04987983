//! # Vault Module
//!
//! Lockout enforcement for passcode-protected vaults shared between two
//! users.
//!
//! - [`policy`]: the pure state machine (thresholds, transitions, access checks)
//! - [`store`]: the keyed, conditionally-written persistence seam
//! - [`guard`]: atomic application of transitions against a store
//!
//! ```text
//! unlock attempt
//!      │
//!      ▼
//! guard.check_access ──Denied──► "Vault is locked. Try again in N minutes."
//!      │ Allowed
//!      ▼
//! open SealedVaultKey with passcode
//!      │
//!      ├── ok ────► guard.record_success   (back to Clear)
//!      └── wrong ─► guard.record_failure   (may lock, may force re-auth)
//! ```

pub mod guard;
pub mod policy;
pub mod store;

pub use guard::{VaultGuard, MAX_CAS_ATTEMPTS};
pub use policy::{AccessDecision, FailureOutcome, LockPhase, LockoutPolicy, VaultLockState};
pub use store::{LockStateStore, MemoryLockStore, VaultId};
