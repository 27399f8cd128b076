// 🔐 Password hashes - PBKDF2-HMAC-SHA256 with a random per-account salt
//
// Stored as `salt~hash` (both hex) in the last column of students.txt and
// admins.txt. Verification re-derives with the stored salt and compares in
// constant time.

use anyhow::{bail, Context, Result};
use rand::RngCore;
use sha2::Sha256;
use std::fmt;

pub const PBKDF2_ROUNDS: u32 = 32_768;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const SEPARATOR: char = '~';

#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl PasswordHash {
    /// Hash a new password under a fresh salt
    pub fn new(password: &str) -> Self {
        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let hash = derive(password, &salt, HASH_LEN);
        PasswordHash { salt, hash }
    }

    /// Parse the stored `salt~hash` form
    pub fn parse(value: &str) -> Result<Self> {
        let (salt, hash) = value
            .trim()
            .split_once(SEPARATOR)
            .with_context(|| format!("password hash must look like salt{}hash", SEPARATOR))?;

        let salt = hex::decode(salt).context("password salt is not hex")?;
        let hash = hex::decode(hash).context("password hash is not hex")?;
        if salt.is_empty() || hash.is_empty() {
            bail!("password hash has an empty part");
        }

        Ok(PasswordHash { salt, hash })
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = derive(password, &self.salt, self.hash.len());
        constant_time_eq(&candidate, &self.hash)
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", hex::encode(&self.salt), SEPARATOR, hex::encode(&self.hash))
    }
}

// Never print the digest in logs
impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

fn derive(password: &str, salt: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut out);
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let diff = a
        .iter()
        .zip(b)
        .fold(a.len() ^ b.len(), |acc, (x, y)| acc | usize::from(x ^ y));
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify() {
        let stored = PasswordHash::new("correct horse");

        assert!(stored.verify("correct horse"));
        assert!(!stored.verify("correct horse "));
        assert!(!stored.verify(""));
    }

    #[test]
    fn test_stored_form_reloads() {
        let stored = PasswordHash::new("s3cret");
        let line = stored.to_string();

        assert!(!line.contains('|'));
        let reloaded = PasswordHash::parse(&line).unwrap();
        assert_eq!(reloaded, stored);
        assert!(reloaded.verify("s3cret"));
    }

    #[test]
    fn test_salt_is_random() {
        assert_ne!(PasswordHash::new("same"), PasswordHash::new("same"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PasswordHash::parse("").is_err());
        assert!(PasswordHash::parse("abcd").is_err());
        assert!(PasswordHash::parse("zz~00").is_err());
        assert!(PasswordHash::parse("~00").is_err());
    }

    #[test]
    fn test_debug_hides_digest() {
        let stored = PasswordHash::new("s3cret");
        assert_eq!(format!("{:?}", stored), "PasswordHash(..)");
    }

    #[test]
    fn test_constant_time_eq_lengths() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
