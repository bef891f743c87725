//! Bearer keys handed to users and the hashes stored for them.
//!
//! A key is 16 random bytes in hex. The database stores two derived values:
//! `lookup_key = sha256(key)` as the indexed primary key, and
//! `key_hash = hmac_sha256(salt, key)` with a per-user random salt, checked in
//! constant time after the lookup.

use anyhow::{Result, anyhow};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const KEY_BYTES: usize = 16;
const SALT_BYTES: usize = 16;

fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Generate a fresh user key.
pub fn generate_key() -> String {
    random_hex(KEY_BYTES)
}

pub fn generate_salt() -> String {
    random_hex(SALT_BYTES)
}

/// Deterministic index value for a key.
pub fn lookup_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn mac(salt: &str, key: &str) -> Result<HmacSha256> {
    let salt = hex::decode(salt).map_err(|e| anyhow!("Corrupt salt: {e}"))?;
    let mut mac =
        HmacSha256::new_from_slice(&salt).map_err(|e| anyhow!("Invalid HMAC key: {e}"))?;
    mac.update(key.as_bytes());
    Ok(mac)
}

pub fn key_hash(salt: &str, key: &str) -> Result<String> {
    Ok(hex::encode(mac(salt, key)?.finalize().into_bytes()))
}

/// Constant-time check of `key` against a stored salt and hash.
pub fn verify(salt: &str, key: &str, stored_hash: &str) -> Result<bool> {
    let Ok(expected) = hex::decode(stored_hash) else {
        return Ok(false);
    };
    Ok(mac(salt, key)?.verify_slice(&expected).is_ok())
}

/// Keys are 32 lower-case hex digits; anything else can be rejected early.
pub fn is_well_formed(key: &str) -> bool {
    key.len() == KEY_BYTES * 2 && key.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_well_formed_and_distinct() {
        let a = generate_key();
        let b = generate_key();
        assert!(is_well_formed(&a));
        assert!(is_well_formed(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn lookup_key_is_sha256_hex() {
        assert_eq!(
            lookup_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn verify_accepts_matching_key() {
        let salt = generate_salt();
        let key = generate_key();
        let hash = key_hash(&salt, &key).unwrap();
        assert!(verify(&salt, &key, &hash).unwrap());
    }

    #[test]
    fn verify_rejects_other_key_or_salt() {
        let salt = generate_salt();
        let key = generate_key();
        let hash = key_hash(&salt, &key).unwrap();
        assert!(!verify(&salt, &generate_key(), &hash).unwrap());
        assert!(!verify(&generate_salt(), &key, &hash).unwrap());
        assert!(!verify(&salt, &key, "not hex").unwrap());
    }

    #[test]
    fn malformed_keys() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("ABCDEF0123456789ABCDEF0123456789"));
        assert!(!is_well_formed("0123"));
    }
}
