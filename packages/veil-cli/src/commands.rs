//! Subcommand implementations.
//!
//! Each command takes already-resolved inputs and returns what should be
//! printed, so `main` owns all terminal and environment I/O.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use veil_core::crypto::{EncodedKey, RustCryptoProvider};
use veil_core::{
    EnvelopeCipher, KeyCodec, KeyPairGenerator, PasswordKeyDeriver, PrivateKey, PublicKey,
    SealedVaultKey, VeilConfig,
};

/// File name of the shareable half written by `keygen`
pub const PUBLIC_KEY_FILE: &str = "public.key";

/// File name of the owner-only half written by `keygen`
pub const PRIVATE_KEY_FILE: &str = "private.key";

/// Load the config file, or defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<VeilConfig> {
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .wrap_err_with(|| format!("reading config {}", path.display()))?;
            toml::from_str::<VeilConfig>(&text)
                .wrap_err_with(|| format!("parsing config {}", path.display()))?
        }
        None => VeilConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Read a file, or stdin when no path is given
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .wrap_err("reading stdin")?;
            Ok(buf)
        }
    }
}

/// Read a passcode from the named environment variable
pub fn passcode_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(eyre!("environment variable {} is empty", var)),
        Err(_) => Err(eyre!("environment variable {} is not set", var)),
    }
}

fn read_key_file(path: &Path) -> Result<EncodedKey> {
    let text = fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    Ok(EncodedKey::new(text.trim()))
}

fn write_private(path: &Path, contents: &str) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .wrap_err_with(|| format!("creating {}", path.display()))?;
    writeln!(file, "{}", contents)?;
    Ok(())
}

/// Generate an identity into `out_dir`
///
/// Refuses to overwrite an existing private key.
pub fn keygen(out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(out_dir)
        .wrap_err_with(|| format!("creating {}", out_dir.display()))?;

    let encoded = KeyPairGenerator::default().generate_encoded()?;

    let private_path = out_dir.join(PRIVATE_KEY_FILE);
    write_private(&private_path, encoded.private_key.as_str())?;

    let public_path = out_dir.join(PUBLIC_KEY_FILE);
    fs::write(&public_path, format!("{}\n", encoded.public_key))
        .wrap_err_with(|| format!("writing {}", public_path.display()))?;

    tracing::info!(dir = %out_dir.display(), "Generated identity key pair");
    Ok((public_path, private_path))
}

/// Seal `message` for the owner of the public key at `recipient`
pub fn seal(recipient: &Path, message: &str) -> Result<String> {
    let public_key = PublicKey::decode(&read_key_file(recipient)?)
        .wrap_err_with(|| format!("loading public key {}", recipient.display()))?;
    Ok(EnvelopeCipher::default().encrypt_to_json(message, &public_key)?)
}

/// Open envelope JSON with the private key at `key`
///
/// With `placeholder`, an unreadable envelope yields the placeholder text
/// instead of an error.
pub fn open(key: &Path, envelope_json: &str, placeholder: bool) -> Result<String> {
    let private_key = PrivateKey::decode(&read_key_file(key)?)
        .wrap_err_with(|| format!("loading private key {}", key.display()))?;
    let cipher = EnvelopeCipher::default();
    let json = envelope_json.trim();

    if placeholder {
        Ok(cipher.open_or_placeholder(json, &private_key))
    } else {
        Ok(cipher.decrypt_json(json, &private_key)?)
    }
}

fn deriver(config: &VeilConfig) -> Result<PasswordKeyDeriver> {
    Ok(PasswordKeyDeriver::with_params(RustCryptoProvider, config.kdf)?)
}

/// Generate a vault key and seal it under `passcode`
pub fn vault_seal(config: &VeilConfig, passcode: &str) -> Result<String> {
    let kdf = deriver(config)?;
    let vault_key = kdf.generate_vault_key()?;
    let sealed = kdf.seal(&vault_key, passcode)?;
    Ok(sealed.to_json()?)
}

/// Recover the base64 vault key from a sealed record
pub fn vault_open(config: &VeilConfig, sealed_json: &str, passcode: &str) -> Result<String> {
    let sealed = SealedVaultKey::from_json(sealed_json.trim()).wrap_err("parsing sealed vault key")?;
    let vault_key = deriver(config)?.open(&sealed, passcode)?;
    Ok(KeyCodec::encode(&vault_key).into_string())
}

/// Re-seal a vault key under a new passcode
pub fn vault_reseal(
    config: &VeilConfig,
    sealed_json: &str,
    old_passcode: &str,
    new_passcode: &str,
) -> Result<String> {
    let sealed = SealedVaultKey::from_json(sealed_json.trim()).wrap_err("parsing sealed vault key")?;
    let resealed = deriver(config)?.reseal(&sealed, old_passcode, new_passcode)?;
    Ok(resealed.to_json()?)
}

/// Render the effective configuration as TOML
pub fn policy(config: &VeilConfig) -> Result<String> {
    toml::to_string_pretty(config).wrap_err("rendering config")
}

// ============================================================================
// TESTS
// ============================================================================
