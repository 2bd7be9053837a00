use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by an API bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identifies the user
    pub iss: String,
    /// Expiry, unix seconds
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    Missing,

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,
}

/// Issues and checks `base64url(claims).base64url(hmac)` tokens
pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, payload: &[u8]) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::Malformed)?;
        mac.update(payload);
        Ok(mac)
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims).map_err(|_| AuthError::Malformed)?;
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let signature = self.mac(encoded.as_bytes())?.finalize().into_bytes();
        Ok(format!("{}.{}", encoded, URL_SAFE_NO_PAD.encode(signature)))
    }

    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let (encoded, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;
        self.mac(encoded.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    /// Check the `Authorization: Bearer <token>` header of a request
    pub fn verify_header(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Missing)?;
        self.verify(token, Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: i64) -> Claims {
        Claims {
            iss: "did:ethr:0xabc".to_string(),
            exp,
        }
    }

    #[test]
    fn issued_tokens_verify() {
        let verifier = TokenVerifier::new("secret");
        let token = verifier.issue(&claims(2_000)).unwrap();
        assert_eq!(verifier.verify(&token, 1_000).unwrap(), claims(2_000));
    }

    #[test]
    fn rejects_expired_and_tampered_tokens() {
        let verifier = TokenVerifier::new("secret");
        let token = verifier.issue(&claims(2_000)).unwrap();
        assert_eq!(verifier.verify(&token, 2_000), Err(AuthError::Expired));

        let forged = TokenVerifier::new("other").issue(&claims(2_000)).unwrap();
        assert_eq!(verifier.verify(&forged, 1_000), Err(AuthError::BadSignature));
        assert_eq!(verifier.verify("garbage", 1_000), Err(AuthError::Malformed));
    }

    #[test]
    fn reads_bearer_header() {
        let verifier = TokenVerifier::new("secret");
        assert_eq!(verifier.verify_header(&HeaderMap::new()), Err(AuthError::Missing));

        let token = verifier
            .issue(&claims(Utc::now().timestamp() + 60))
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        assert_eq!(verifier.verify_header(&headers).unwrap().iss, "did:ethr:0xabc");
    }
}
