//! AES-256-GCM encryption and encryption-key management
//!
//! Provides authenticated encryption plus the `key-make` / `key-test`
//! operations: creating an end-to-end encryption key from a password
//! stores a small encrypted verification blob; testing a password tries to
//! decrypt that blob.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::config::settings::EncryptionSettings;
use crate::error::{TallyError, TallyResult};

use super::key_derivation::{derive_key, DerivedKey, KeyDerivationParams};

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Plaintext of the verification blob stored on key creation
const TEST_CONTENT: &[u8] = b"tally-key-check";

/// Encrypt plaintext using AES-256-GCM with a fresh random nonce
///
/// Returns base64 of `nonce || ciphertext`.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> TallyResult<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| TallyError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| TallyError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut combined = nonce_bytes.to_vec();
    combined.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(combined))
}

/// Decrypt base64 `nonce || ciphertext` using AES-256-GCM
pub fn decrypt(encoded: &str, key: &DerivedKey) -> TallyResult<Vec<u8>> {
    let combined = BASE64
        .decode(encoded)
        .map_err(|e| TallyError::Encryption(format!("Invalid ciphertext encoding: {}", e)))?;

    if combined.len() < NONCE_SIZE {
        return Err(TallyError::Encryption("Ciphertext too short".to_string()));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| TallyError::Encryption(format!("Failed to create cipher: {}", e)))?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| {
            TallyError::Encryption("Decryption failed: invalid key or corrupted data".to_string())
        })
}

/// Create an encryption key from `password` (`key-make`)
///
/// Generates fresh derivation parameters and the verification blob.
/// Refuses to overwrite an existing key unless `recreate` is set.
pub fn make_key(
    settings: &mut EncryptionSettings,
    password: &str,
    recreate: bool,
) -> TallyResult<()> {
    if settings.enabled && !recreate {
        return Err(TallyError::Encryption(
            "An encryption key already exists".to_string(),
        ));
    }

    let params = KeyDerivationParams::new();
    let key = derive_key(password, &params)?;
    let blob = encrypt(TEST_CONTENT, &key)?;

    settings.enabled = true;
    settings.key_params = Some(params);
    settings.test_blob = Some(blob);
    Ok(())
}

/// Check whether `password` matches the stored encryption key (`key-test`)
pub fn test_key(settings: &EncryptionSettings, password: &str) -> TallyResult<bool> {
    let (params, blob) = match (&settings.key_params, &settings.test_blob) {
        (Some(params), Some(blob)) if settings.enabled => (params, blob),
        _ => {
            return Err(TallyError::Encryption(
                "No encryption key has been created".to_string(),
            ))
        }
    };

    let key = derive_key(password, params)?;
    match decrypt(blob, &key) {
        Ok(plaintext) => Ok(plaintext == TEST_CONTENT),
        Err(_) => Ok(false),
    }
}
