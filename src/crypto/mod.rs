//! Cryptographic functions for Tally
//!
//! Argon2id for password hashing and key derivation, AES-256-GCM for the
//! end-to-end encryption key's verification blob.

pub mod encryption;
pub mod key_derivation;

pub use encryption::{decrypt, encrypt, make_key, test_key};
pub use key_derivation::{derive_key, hash_password, verify_password, DerivedKey, KeyDerivationParams};
