//! # Envelope Demo
//!
//! Alice sends Bob a message only Bob can read.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example envelope_demo
//! ```

use veil_core::{EnvelopeCipher, KeyPairGenerator, UNDECRYPTABLE_PLACEHOLDER};

fn main() {
    println!("=== Veil Core: Envelope Encryption Demo ===\n");

    // Step 1: Registration
    println!("Step 1: Generating RSA-2048 identities for Alice and Bob...");
    let generator = KeyPairGenerator::default();
    let alice = generator.generate().expect("Failed to create Alice's key pair");
    let bob = generator.generate().expect("Failed to create Bob's key pair");

    let bob_public = bob.public_key.encode();
    println!("  Bob's public key (SPKI): {}...", &bob_public.as_str()[..32]);
    println!();

    // Step 2: Alice seals a message with Bob's public key
    println!("Step 2: Alice seals a message for Bob...");
    let cipher = EnvelopeCipher::default();
    let message = "The vault passcode is the day we met.";
    let json = cipher
        .encrypt_to_json(message, &bob.public_key)
        .expect("Encryption failed");
    println!("  Wire form: {}...", &json[..60]);
    println!();

    // Step 3: Bob opens it
    println!("Step 3: Bob opens the envelope...");
    let plaintext = cipher
        .decrypt_json(&json, &bob.private_key)
        .expect("Decryption failed");
    println!("  Plaintext: {}", plaintext);
    if plaintext == message {
        println!("  [OK] Round trip matches");
    } else {
        println!("  [FAILED] Plaintext differs");
        return;
    }
    println!();

    // Step 4: Alice cannot read what she sent to Bob
    println!("Step 4: Alice tries to open Bob's envelope...");
    let shown = cipher.open_or_placeholder(&json, &alice.private_key);
    println!("  Alice sees: {}", shown);
    if shown == UNDECRYPTABLE_PLACEHOLDER {
        println!("  [OK] Only the recipient can decrypt");
    }
    println!();

    // Step 5: Freshness
    println!("Step 5: Sealing the same text twice...");
    let a = cipher.encrypt(message, &bob.public_key).expect("Encryption failed");
    let b = cipher.encrypt(message, &bob.public_key).expect("Encryption failed");
    println!("  IVs differ:          {}", a.iv != b.iv);
    println!("  Wrapped keys differ: {}", a.wrapped_key != b.wrapped_key);

    println!("\n=== Demo Complete ===");
}
