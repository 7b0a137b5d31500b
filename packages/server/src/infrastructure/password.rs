//! SHA-256 password hasher.

use sha2::{Digest, Sha256};

use crate::domain::PasswordHasher;

/// Stores passwords as lowercase hex SHA-256 digests
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256PasswordHasher;

impl PasswordHasher for Sha256PasswordHasher {
    fn hash(&self, password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }
}
