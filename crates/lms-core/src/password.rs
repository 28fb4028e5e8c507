use bcrypt::{DEFAULT_COST, hash, verify};
use rand::RngCore;

use crate::errors::AppError;

/// Prefix carried by every issued API key.
pub const API_KEY_PREFIX: &str = "sk_";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::internal_error(format!("Failed to verify password: {}", e)))
}

/// Generates a new plaintext API key: `sk_` followed by 64 hex characters.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, hex::encode(bytes))
}

/// Returns the first candidate whose stored hash matches `presented`.
///
/// Every stored hash is checked in turn with bcrypt's verification. Hashes
/// that fail to parse are skipped rather than aborting the scan.
pub fn find_matching_key<'a, T, F>(presented: &str, candidates: &'a [T], stored_hash: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    candidates
        .iter()
        .find(|candidate| verify(presented, stored_hash(candidate)).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hash(value: &str) -> String {
        hash(value, 4).unwrap()
    }

    #[test]
    fn test_generated_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 64);
        assert!(key[3..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_find_matching_key_scans_all_candidates() {
        let wanted = "sk_wanted";
        let rows = vec![
            (1, cheap_hash("sk_other")),
            (2, "not-a-bcrypt-hash".to_string()),
            (3, cheap_hash(wanted)),
        ];

        let found = find_matching_key(wanted, &rows, |row| row.1.as_str());
        assert_eq!(found.map(|row| row.0), Some(3));
    }

    #[test]
    fn test_find_matching_key_none() {
        let rows = vec![(1, cheap_hash("sk_a"))];
        assert!(find_matching_key("sk_b", &rows, |row| row.1.as_str()).is_none());
        let empty: Vec<(i32, String)> = Vec::new();
        assert!(find_matching_key("sk_b", &empty, |row| row.1.as_str()).is_none());
    }
}
