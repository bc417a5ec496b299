//! Salted PBKDF2-HMAC-SHA256 password hashing.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt hex>$<key hex>`. The
//! iteration count travels with the hash, so raising the default cost does
//! not invalidate existing users.

use super::AuthError;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
#[cfg(test)]
use std::cell::Cell;

/// Scheme tag at the start of every encoded hash.
const SCHEME: &str = "pbkdf2-sha256";

/// Number of PBKDF2 iterations (OWASP recommendation for HMAC-SHA256).
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Derived key length in bytes.
const KEY_LEN: usize = 32;

#[cfg(test)]
thread_local! {
    /// Number of PBKDF2 verifications run on this thread.
    pub(crate) static VERIFICATIONS: Cell<usize> = const { Cell::new(0) };
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, AuthError> {
    let iterations = iterations.max(1);

    let mut salt = [0u8; SALT_LEN];
    getrandom::fill(&mut salt).map_err(|e| AuthError::RandomFailure(e.to_string()))?;

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut key);

    Ok(format!(
        "{}${}${}${}",
        SCHEME,
        iterations,
        hex::encode(salt),
        hex::encode(key)
    ))
}

/// Check `password` against an encoded hash.
///
/// A mismatch is `Ok(false)`; only an unparseable hash is an error.
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, AuthError> {
    let parsed = ParsedHash::parse(encoded)?;

    #[cfg(test)]
    VERIFICATIONS.with(|count| count.set(count.get() + 1));

    let mut key = vec![0u8; parsed.key.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &parsed.salt, parsed.iterations, &mut key);

    Ok(constant_time_eq(&key, &parsed.key))
}

/// A well-formed hash no password matches, at the given cost.
///
/// Verifying against it costs the same as verifying a real hash.
pub(crate) fn decoy_hash(iterations: u32) -> String {
    format!(
        "{}${}${}${}",
        SCHEME,
        iterations.max(1),
        hex::encode([0u8; SALT_LEN]),
        hex::encode([0u8; KEY_LEN])
    )
}

struct ParsedHash {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl ParsedHash {
    fn parse(encoded: &str) -> Result<Self, AuthError> {
        let malformed = |what: &str| AuthError::MalformedHash(what.to_string());

        let mut parts = encoded.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(key), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(malformed("expected four '$'-separated fields"));
        };

        if scheme != SCHEME {
            return Err(malformed("unknown scheme"));
        }
        let iterations: u32 = iterations
            .parse()
            .map_err(|_| malformed("bad iteration count"))?;
        if iterations == 0 {
            return Err(malformed("zero iterations"));
        }
        let salt = hex::decode(salt).map_err(|_| malformed("bad salt encoding"))?;
        let key = hex::decode(key).map_err(|_| malformed("bad key encoding"))?;
        if key.is_empty() {
            return Err(malformed("empty key"));
        }

        Ok(Self {
            iterations,
            salt,
            key,
        })
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("pw1", TEST_ITERATIONS).unwrap();
        assert!(hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("pw1", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same", TEST_ITERATIONS).unwrap();
        let b = hash_password("same", TEST_ITERATIONS).unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a).unwrap());
        assert!(verify_password("same", &b).unwrap());
    }

    #[test]
    fn test_known_vector() {
        // RFC 7914 section 11 PBKDF2-HMAC-SHA256 vector, first 32 bytes.
        let encoded = format!(
            "pbkdf2-sha256$1${}${}",
            hex::encode(b"salt"),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
        assert!(verify_password("password", &encoded).unwrap());
    }

    #[test]
    fn test_malformed_hashes() {
        for bad in [
            "",
            "plaintext",
            "bcrypt$10$aa$bb",
            "pbkdf2-sha256$x$aa$bb",
            "pbkdf2-sha256$0$aa$bb",
            "pbkdf2-sha256$10$zz$bb",
            "pbkdf2-sha256$10$aa$",
            "pbkdf2-sha256$10$aa$bb$cc",
        ] {
            assert!(
                matches!(verify_password("pw", bad), Err(AuthError::MalformedHash(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_decoy_hash_parses_and_never_matches() {
        let decoy = decoy_hash(TEST_ITERATIONS);
        assert!(!verify_password("", &decoy).unwrap());
        assert!(!verify_password("pw1", &decoy).unwrap());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
