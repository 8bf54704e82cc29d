pub mod config;
pub mod env;
pub mod natural_sort;
pub mod progress_bars;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a string, used for the deterministic class and
/// outcome identifiers.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_is_stable() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_hex("baseline"), sha256_hex("baseline"));
        assert_ne!(sha256_hex("baseline"), sha256_hex("Baseline"));
    }
}
