// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Derivation is PBKDF2-HMAC-SHA256 with an explicit per-account salt. The
//! iteration count is a security parameter, not a performance knob; lowering
//! it weakens every stored credential.
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::config::PasswordRequirements;
use crate::error::AppError;

/// PBKDF2 iteration count. Security parameter, do not lower.
pub const PBKDF2_ITERATIONS: u32 = 310_000;

/// Derived key length in bytes
pub const DERIVED_KEY_LEN: usize = 32;

/// Salt length in bytes
pub const SALT_LEN: usize = 12;

/// The symbol set accepted (and required) by the password policy
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Generate a fresh random salt from the OS CSPRNG
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a verification key from a password and salt.
///
/// Deterministic: the same password and salt always produce the same bytes.
/// CPU-bound; callers on the async runtime go through [`hash_password`].
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; DERIVED_KEY_LEN] {
    let mut out = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Hash a password on the blocking pool.
///
/// The KDF call is the suspension point: salt generation happens before this
/// future is created, comparison happens after it resolves.
pub async fn hash_password(
    password: &str,
    salt: &[u8],
    iterations: u32,
) -> Result<[u8; DERIVED_KEY_LEN], AppError> {
    let password = password.to_string();
    let salt = salt.to_vec();
    tokio::task::spawn_blocking(move || derive_key(&password, &salt, iterations))
        .await
        .map_err(|e| AppError::Hashing(format!("KDF task failed: {e}")))
}

/// Hash a password and zeroize the caller's plaintext
pub async fn hash_password_secure(
    plain: &mut String,
    salt: &[u8],
    iterations: u32,
) -> Result<[u8; DERIVED_KEY_LEN], AppError> {
    let hash = hash_password(plain, salt, iterations).await;
    plain.zeroize();
    hash
}

/// Verify a candidate password against a stored hash and salt.
///
/// The stored values are base64-encoded byte strings. Any decode failure or
/// length/content mismatch returns `false`, never an error, and the
/// comparison is constant-time regardless of where a mismatch occurs.
pub async fn verify_password(
    candidate: &str,
    stored_hash_b64: &str,
    stored_salt_b64: &str,
    iterations: u32,
) -> bool {
    let Ok(stored_hash) = BASE64.decode(stored_hash_b64) else {
        tracing::warn!("stored password hash is not valid base64");
        return false;
    };
    let Ok(salt) = BASE64.decode(stored_salt_b64) else {
        tracing::warn!("stored password salt is not valid base64");
        return false;
    };

    let Ok(derived) = hash_password(candidate, &salt, iterations).await else {
        return false;
    };

    derived.as_slice().ct_eq(stored_hash.as_slice()).into()
}

/// Base64-encode derived bytes for storage
pub fn encode_for_storage(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Check if a password meets the complexity requirements.
///
/// Beyond the configured character-class flags, every character must come
/// from the allowed alphabet: ASCII letters, digits, and [`PASSWORD_SYMBOLS`].
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.len() < requirements.min_length {
        return false;
    }

    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
    {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return false;
    }

    true
}
