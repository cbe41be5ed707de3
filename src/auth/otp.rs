//! One-time code generation and hashing.

use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

/// One-time codes are exactly this many digits.
pub const CODE_LENGTH: usize = 6;

/// Generate a zero-padded 6-digit code from the OS entropy source.
#[must_use]
pub fn generate_code() -> String {
    let value: u32 = OsRng.gen_range(0..1_000_000);
    format!("{value:06}")
}

/// Strict format check: exactly six ASCII digits.
#[must_use]
pub fn valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Hash a code bound to its address so we never store the raw code, and a
/// code requested for one address cannot verify another.
#[must_use]
pub fn hash_code(email: &str, code: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hasher.finalize().to_vec()
}
