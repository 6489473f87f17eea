// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing via bcrypt.
//!
//! A [`PasswordHash`] can only be produced by hashing a plaintext (or by
//! deserializing a stored record), so every write of the password field
//! goes through bcrypt.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bcrypt password hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a plaintext password with the given bcrypt cost.
    pub fn new(password: &str, cost: u32) -> anyhow::Result<Self> {
        let hash = bcrypt::hash(password, cost).context("bcrypt hash failed")?;
        Ok(Self(hash))
    }

    /// Check a plaintext password against this hash.
    pub fn verify(&self, password: &str) -> anyhow::Result<bool> {
        bcrypt::verify(password, &self.0).context("bcrypt verify failed")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the hash itself.
impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordHash::new("hunter22", 4).unwrap();
        assert_ne!(hash.as_str(), "hunter22");
        assert!(hash.verify("hunter22").unwrap());
        assert!(!hash.verify("hunter23").unwrap());
    }

    #[test]
    fn test_same_password_hashes_differ() {
        let a = PasswordHash::new("secret", 4).unwrap();
        let b = PasswordHash::new("secret", 4).unwrap();
        assert_ne!(a, b, "bcrypt salts every hash");
    }

    #[test]
    fn test_debug_redacts_hash() {
        let hash = PasswordHash::new("secret", 4).unwrap();
        assert_eq!(format!("{hash:?}"), "PasswordHash(..)");
    }

    #[test]
    fn test_verify_malformed_hash_is_error() {
        let hash: PasswordHash = serde_json::from_str("\"not-a-bcrypt-hash\"").unwrap();
        assert!(hash.verify("anything").is_err());
    }
}
