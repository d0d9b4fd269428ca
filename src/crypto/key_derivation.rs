//! Key derivation and password hashing using Argon2id
//!
//! Two jobs share the same primitive: deriving the end-to-end encryption
//! key from a passphrase (`derive_key`), and hashing sign-in passwords for
//! storage (`hash_password` / `verify_password`).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{TallyError, TallyResult};

/// Parameters for key derivation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Salt for key derivation (base64 encoded)
    pub salt: String,
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism degree (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            salt: String::new(), // Generated on first use
            memory_cost: 65536,  // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KeyDerivationParams {
    /// Create new params with a random salt
    pub fn new() -> Self {
        let salt = SaltString::generate(&mut OsRng);
        Self {
            salt: salt.to_string(),
            ..Default::default()
        }
    }
}

/// A derived encryption key
///
/// The key bytes are zeroed when the value is dropped.
pub struct DerivedKey {
    key: [u8; 32],
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Derive an encryption key from a passphrase
pub fn derive_key(passphrase: &str, params: &KeyDerivationParams) -> TallyResult<DerivedKey> {
    let salt = SaltString::from_b64(&params.salt)
        .map_err(|e| TallyError::Encryption(format!("Invalid salt: {}", e)))?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(32), // Output length for AES-256
    )
    .map_err(|e| TallyError::Encryption(format!("Invalid KDF parameters: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| TallyError::Encryption(format!("Key derivation failed: {}", e)))?;

    let hash_value = hash
        .hash
        .ok_or_else(|| TallyError::Encryption("Key derivation produced no output".to_string()))?;

    let mut key = [0u8; 32];
    key.copy_from_slice(hash_value.as_bytes());
    Ok(DerivedKey { key })
}

/// Hash a sign-in password for storage (PHC string format)
pub fn hash_password(password: &str) -> TallyResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| TallyError::Auth(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a sign-in password against a stored PHC hash string
pub fn verify_password(password: &str, stored_hash: &str) -> TallyResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| TallyError::Auth(format!("Invalid stored password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let params = KeyDerivationParams {
            // Low-cost params so the test runs quickly
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            ..KeyDerivationParams::new()
        };

        let key1 = derive_key("correct horse", &params).unwrap();
        let key2 = derive_key("correct horse", &params).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        let other = derive_key("battery staple", &params).unwrap();
        assert_ne!(key1.as_bytes(), other.as_bytes());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));

        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("pw", "not-a-hash").is_err());
    }
}
