/// Random tokens for sessions and verification links
///
/// Tokens are 32 bytes from the thread RNG, hex-encoded (64 characters).
/// Verification tokens are stored as their `hash_token` digest, so a leaked
/// table does not hand out working links.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a token
pub const TOKEN_BYTES: usize = 32;

/// Generates a new random token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 of a token, hex-encoded
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Checks a token against a digest from `hash_token`
pub fn verify_token(token: &str, digest: &str) -> bool {
    let computed = hash_token(token);
    // Constant-time over equal lengths
    computed.len() == digest.len()
        && computed
            .bytes()
            .zip(digest.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
