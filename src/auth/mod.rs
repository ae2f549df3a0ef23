//! App password storage (encrypted file)
//!
//! Stores Bluesky app passwords encrypted with AES-256-GCM in
//! ~/.config/plume/credentials.enc. The encryption key is derived from
//! machine-specific identifiers.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result, anyhow};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::models::Account;
use crate::paths;

const NONCE_SIZE: usize = 12;

/// Get machine ID for key derivation
fn get_machine_id() -> String {
    #[cfg(target_os = "linux")]
    {
        for path in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = fs::read_to_string(path) {
                return id.trim().to_string();
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(uuid) = stdout
                .lines()
                .find(|line| line.contains("IOPlatformUUID"))
                .and_then(|line| line.split('"').nth(3))
            {
                return uuid.to_string();
            }
        }
    }

    dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "plume-fallback-key".to_string())
}

/// Derive encryption key from machine-specific data
fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(get_machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    hasher.update(b"plume-bluesky-composer-v1");
    hasher.finalize().into()
}

fn cipher(key: &[u8; 32]) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key).map_err(|_| anyhow!("Invalid key length"))
}

/// Decrypt the credentials file at `path`
fn load_from(path: &Path, key: &[u8; 32]) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let encrypted = fs::read(path).context("Failed to read credentials file")?;
    if encrypted.len() < NONCE_SIZE {
        return Ok(HashMap::new());
    }

    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
    let plaintext = cipher(key)?
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| anyhow!("Failed to decrypt credentials"))?;

    serde_json::from_slice(&plaintext).context("Invalid credentials file")
}

/// Encrypt `creds` into the file at `path`
fn save_to(path: &Path, key: &[u8; 32], creds: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_vec(creds)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill(&mut nonce_bytes);

    let ciphertext = cipher(key)?
        .encrypt(Nonce::from_slice(&nonce_bytes), json.as_slice())
        .map_err(|_| anyhow!("Failed to encrypt credentials"))?;

    let mut output = nonce_bytes.to_vec();
    output.extend(ciphertext);
    fs::write(path, output).context("Failed to write credentials file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

fn load_credentials() -> Result<HashMap<String, String>> {
    load_from(&paths::credentials_path()?, &derive_key())
}

fn save_credentials(creds: &HashMap<String, String>) -> Result<()> {
    save_to(&paths::credentials_path()?, &derive_key(), creds)
}

/// Store the app password for an account
pub fn store_credentials(account: &Account, app_password: &str) -> Result<()> {
    let mut creds = load_credentials().unwrap_or_default();
    creds.insert(account.keyring_key(), app_password.to_string());
    save_credentials(&creds)
}

/// Get the app password for an account
pub fn get_credentials(account: &Account) -> Result<Option<String>> {
    let creds = load_credentials()?;
    Ok(creds.get(&account.keyring_key()).cloned())
}

/// Delete the app password for an account
pub fn delete_credentials(account: &Account) -> Result<()> {
    let mut creds = load_credentials().unwrap_or_default();
    creds.remove(&account.keyring_key());
    save_credentials(&creds)
}

/// Check if an app password is stored for an account
pub fn has_credentials(account: &Account) -> bool {
    get_credentials(account).is_ok_and(|c| c.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.enc");
        let key = [7u8; 32];

        let mut creds = HashMap::new();
        creds.insert("plume:bluesky:1".to_string(), "abcd-efgh-ijkl-mnop".to_string());
        save_to(&path, &key, &creds).unwrap();

        let raw = fs::read(&path).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("abcd-efgh"));
        assert_eq!(load_from(&path, &key).unwrap(), creds);
    }

    #[test]
    fn test_wrong_key_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.enc");
        save_to(&path, &[1u8; 32], &HashMap::new()).unwrap();
        assert!(load_from(&path, &[2u8; 32]).is_err());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let creds = load_from(&dir.path().join("nope.enc"), &derive_key()).unwrap();
        assert!(creds.is_empty());
    }
}
