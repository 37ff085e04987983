//! Veil command-line tool
//!
//! Thin operator front end over `veil-core`:
//!
//! 1. **Identities**: generate an RSA key pair into a directory.
//!
//! 2. **Envelopes**: seal a message for a public key, open one with a
//!    private key.
//!
//! 3. **Vault keys**: seal a fresh vault key under a passcode, open it,
//!    or move it to a new passcode.
//!
//! Passcodes are only ever read from environment variables so they never
//! show up in shell history or process listings. Logs go to stderr;
//! stdout carries only the command's result.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "veil", version, about = "Veil end-to-end encryption tool")]
struct Args {
    /// TOML file with [kdf] and [lockout] overrides
    #[arg(long, global = true, env = "VEIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate public.key and private.key in a directory
    Keygen {
        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Seal a message for a recipient and print the envelope JSON
    Seal {
        /// Recipient's public.key
        #[arg(long)]
        to: PathBuf,

        /// Message text (read from stdin when omitted)
        #[arg(long)]
        message: Option<String>,
    },

    /// Open an envelope and print the plaintext
    Open {
        /// Your private.key
        #[arg(long)]
        key: PathBuf,

        /// Envelope JSON file (read from stdin when omitted)
        #[arg(long)]
        envelope: Option<PathBuf>,

        /// Print the placeholder instead of failing on unreadable envelopes
        #[arg(long)]
        placeholder: bool,
    },

    /// Generate a vault key and print it sealed under a passcode
    VaultSeal {
        /// Environment variable holding the passcode
        #[arg(long)]
        passcode_env: String,
    },

    /// Print the base64 vault key from a sealed record
    VaultOpen {
        /// Sealed vault key JSON file
        #[arg(long)]
        sealed: PathBuf,

        /// Environment variable holding the passcode
        #[arg(long)]
        passcode_env: String,
    },

    /// Move a sealed vault key to a new passcode
    VaultReseal {
        /// Sealed vault key JSON file
        #[arg(long)]
        sealed: PathBuf,

        /// Environment variable holding the current passcode
        #[arg(long)]
        old_env: String,

        /// Environment variable holding the new passcode
        #[arg(long)]
        new_env: String,
    },

    /// Print the effective configuration
    Policy,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "veil=info,veil_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = commands::load_config(args.config.as_deref())?;
    tracing::debug!(?config, "Loaded configuration");

    let output = match args.command {
        Command::Keygen { out } => {
            let (public, private) = commands::keygen(&out)?;
            format!("{}\n{}", public.display(), private.display())
        }
        Command::Seal { to, message } => {
            let message = match message {
                Some(message) => message,
                None => {
                    let mut text = commands::read_input(None)?;
                    if text.ends_with('\n') {
                        text.pop();
                    }
                    text
                }
            };
            commands::seal(&to, &message)?
        }
        Command::Open {
            key,
            envelope,
            placeholder,
        } => {
            let json = commands::read_input(envelope.as_deref())?;
            commands::open(&key, &json, placeholder)?
        }
        Command::VaultSeal { passcode_env } => {
            let passcode = commands::passcode_from_env(&passcode_env)?;
            commands::vault_seal(&config, &passcode)?
        }
        Command::VaultOpen {
            sealed,
            passcode_env,
        } => {
            let passcode = commands::passcode_from_env(&passcode_env)?;
            let json = commands::read_input(Some(sealed.as_path()))?;
            commands::vault_open(&config, &json, &passcode)?
        }
        Command::VaultReseal {
            sealed,
            old_env,
            new_env,
        } => {
            let old = commands::passcode_from_env(&old_env)?;
            let new = commands::passcode_from_env(&new_env)?;
            let json = commands::read_input(Some(sealed.as_path()))?;
            commands::vault_reseal(&config, &json, &old, &new)?
        }
        Command::Policy => commands::policy(&config)?,
    };

    println!("{}", output);
    Ok(())
}
