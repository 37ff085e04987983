//! # Vault Demo
//!
//! Seals a vault key under a passcode, then walks a run of wrong guesses
//! through the lockout state machine.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example vault_demo
//! ```

use std::sync::Arc;

use veil_core::vault::MemoryLockStore;
use veil_core::{FailureOutcome, LockoutPolicy, PasswordKeyDeriver, VaultGuard, VaultId};

#[tokio::main]
async fn main() {
    println!("=== Veil Core: Vault Lockout Demo ===\n");

    // Step 1: Seal the vault key
    println!("Step 1: Sealing a fresh vault key under passcode 1809...");
    let deriver = PasswordKeyDeriver::default();
    let vault_key = deriver.generate_vault_key().expect("Failed to generate vault key");
    let sealed = deriver.seal(&vault_key, "1809").expect("Failed to seal");
    println!(
        "  Sealed record: {}",
        sealed.to_json().expect("Failed to serialize")
    );
    println!();

    // Step 2: Guess wrong until the guard escalates
    println!("Step 2: Guessing wrong passcodes...");
    let guard = VaultGuard::new(Arc::new(MemoryLockStore::new()), LockoutPolicy::default())
        .expect("Invalid policy");
    let vault = VaultId::generate();

    for guess in ["0000", "1111", "2222", "3333", "4444"] {
        if deriver.open(&sealed, guess).is_ok() {
            println!("  [FAILED] {} should not open the vault", guess);
            return;
        }
        match guard.record_failure(&vault).await.expect("Store failed") {
            FailureOutcome::Recorded {
                failed_attempts, ..
            } => {
                let decision = guard.check_access(&vault).await.expect("Store failed");
                println!("  {} -> attempt {}: {}", guess, failed_attempts, decision);
            }
            FailureOutcome::ForceReauthentication => {
                println!("  {} -> ceiling reached, forcing re-authentication", guess);
            }
        }
    }
    println!();

    // Step 3: The right passcode, after re-authentication
    println!("Step 3: Correct passcode...");
    let opened = deriver.open(&sealed, "1809").expect("Correct passcode rejected");
    guard.record_success(&vault).await.expect("Store failed");
    println!("  Key recovered: {}", opened.as_slice() == vault_key.as_slice());
    println!(
        "  Lock state cleared: {}",
        guard.state(&vault).await.expect("Store failed").is_clear()
    );

    println!("\n=== Demo Complete ===");
}
