//! Password material for user administration
//!
//! Salted SHA-256 in the hex form the users table stores. There is no
//! session or login flow in this repository; hashing exists so user
//! administration can set and reset credentials consumed by the
//! authenticating front end.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a random 16-byte salt, hex encoded
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hash a password with a hex salt, returning 64 hex characters
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a password against stored salt and hash
pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    hash_password(password, salt) == hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salt_sensitive() {
        let a = hash_password("opensesame", "00ff");
        let b = hash_password("opensesame", "11ee");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_verify_round_trip() {
        let salt = generate_salt();
        assert_eq!(salt.len(), 32);
        let hash = hash_password("opensesame", &salt);
        assert!(verify_password("opensesame", &salt, &hash));
        assert!(!verify_password("opensesame2", &salt, &hash));
    }
}
