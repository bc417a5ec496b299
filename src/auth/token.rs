//! HS256-signed bearer tokens in compact JWS form.

use super::AuthError;
use crate::types::{Timestamp, UserId};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime used when the caller asks for none, or for too much.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest lifetime a caller may request.
pub const MAX_TOKEN_TTL: Duration = DEFAULT_TOKEN_TTL;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by a session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    /// Stringified user id.
    pub sub: String,
    pub iat: Timestamp,
    pub exp: Timestamp,
}

impl TokenClaims {
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse()
            .map(UserId)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Zero or anything above [`MAX_TOKEN_TTL`] becomes [`DEFAULT_TOKEN_TTL`].
///
/// Claims carry whole seconds, so fractional lifetimes round up.
pub fn clamp_ttl(requested: Duration) -> Duration {
    if requested.is_zero() || requested > MAX_TOKEN_TTL {
        return DEFAULT_TOKEN_TTL;
    }
    let secs = requested.as_secs() + u64::from(requested.subsec_nanos() > 0);
    Duration::from_secs(secs)
}

/// Sign `claims` with `secret`.
pub(crate) fn sign(secret: &[u8], claims: &TokenClaims) -> Result<String, AuthError> {
    let header = Header {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let header = serde_json::to_vec(&header).map_err(|e| AuthError::Encoding(e.to_string()))?;
    let claims = serde_json::to_vec(claims).map_err(|e| AuthError::Encoding(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(claims)
    );

    let mut mac = new_mac(secret)?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

/// Check structure, signature, issuer and expiry as of `now`.
pub(crate) fn verify(
    secret: &[u8],
    issuer: &str,
    token: &str,
    now: Timestamp,
) -> Result<TokenClaims, AuthError> {
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let (signing_input, signature) = token.rsplit_once('.').ok_or(AuthError::InvalidToken)?;
    let (header, claims) = signing_input
        .split_once('.')
        .ok_or(AuthError::InvalidToken)?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::InvalidToken)?;
    let mut mac = new_mac(secret)?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AuthError::InvalidToken)?;

    let header: Header = decode_segment(header)?;
    if header.alg != "HS256" {
        return Err(AuthError::InvalidToken);
    }

    let claims: TokenClaims = decode_segment(claims)?;
    if claims.iss != issuer {
        return Err(AuthError::InvalidToken);
    }
    if now >= claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}

fn new_mac(secret: &[u8]) -> Result<HmacSha256, AuthError> {
    HmacSha256::new_from_slice(secret).map_err(|e| AuthError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn claims(iat: u64, exp: u64) -> TokenClaims {
        TokenClaims {
            iss: "chirpy".to_string(),
            sub: "7".to_string(),
            iat: Timestamp(iat),
            exp: Timestamp(exp),
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let token = sign(SECRET, &claims(1_000, 2_000)).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let verified = verify(SECRET, "chirpy", &token, Timestamp(1_500)).unwrap();
        assert_eq!(verified, claims(1_000, 2_000));
        assert_eq!(verified.user_id().unwrap(), UserId(7));
    }

    #[test]
    fn test_expiry_boundary() {
        let token = sign(SECRET, &claims(1_000, 2_000)).unwrap();

        assert!(verify(SECRET, "chirpy", &token, Timestamp(1_999)).is_ok());
        assert!(matches!(
            verify(SECRET, "chirpy", &token, Timestamp(2_000)),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let token = sign(SECRET, &claims(1_000, 2_000)).unwrap();
        assert!(matches!(
            verify(b"other", "chirpy", &token, Timestamp(1_500)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_issuer() {
        let token = sign(SECRET, &claims(1_000, 2_000)).unwrap();
        assert!(matches!(
            verify(SECRET, "someone-else", &token, Timestamp(1_500)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_claims() {
        let token = sign(SECRET, &claims(1_000, 2_000)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(1_000, 9_999)).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert!(matches!(
            verify(SECRET, "chirpy", &tampered, Timestamp(1_500)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_missing_and_garbage() {
        assert!(matches!(
            verify(SECRET, "chirpy", "", Timestamp(0)),
            Err(AuthError::MissingToken)
        ));
        for bad in ["abc", "a.b", "a.b.c", "...."] {
            assert!(matches!(
                verify(SECRET, "chirpy", bad, Timestamp(0)),
                Err(AuthError::InvalidToken)
            ));
        }
    }

    #[test]
    fn test_clamp_ttl() {
        assert_eq!(clamp_ttl(Duration::ZERO), DEFAULT_TOKEN_TTL);
        assert_eq!(clamp_ttl(Duration::from_secs(100_000)), DEFAULT_TOKEN_TTL);
        assert_eq!(clamp_ttl(Duration::from_secs(60)), Duration::from_secs(60));
        assert_eq!(clamp_ttl(MAX_TOKEN_TTL), MAX_TOKEN_TTL);
    }

    #[test]
    fn test_clamp_ttl_rounds_fractions_up() {
        assert_eq!(clamp_ttl(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(clamp_ttl(Duration::from_millis(60_001)), Duration::from_secs(61));
        assert_eq!(
            clamp_ttl(MAX_TOKEN_TTL - Duration::from_millis(1)),
            MAX_TOKEN_TTL
        );
    }
}
