//! Bearer token issuance and verification (HS256 JWT)
//!
//! Tokens are self-contained: there is no session table and no revocation.
//! A token stays valid until `exp`, carrying the role the user held when it
//! was issued.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::types::{Principal, Role};

/// Why a token was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature or algorithm mismatch")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// JWT claims for bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: u64,
    /// Role string at issuance
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiry (Unix timestamp)
    pub exp: i64,
}

/// Mints and checks signed, time-bound bearer tokens
///
/// The secret is fixed at construction; nothing derived from a request
/// ever reaches the keys.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn new(secret: &[u8], ttl_hours: u32) -> Self {
        let mut validation = Validation::new(Self::ALGORITHM);
        // Expiry is checked in `verify_at` with a strict `now < exp`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs: i64::from(ttl_hours) * 3600,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token valid from now
    pub fn issue(&self, user_id: u64, role: &Role) -> Result<String, TokenError> {
        self.issue_at(user_id, role, Utc::now().timestamp())
    }

    /// Issue a token as if the clock read `issued_at`
    pub fn issue_at(&self, user_id: u64, role: &Role, issued_at: i64) -> Result<String, TokenError> {
        let claims = TokenClaims {
            user_id,
            role: role.as_str().to_string(),
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
        };
        encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token against the wall clock
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as if the clock read `now`
    ///
    /// Accepted iff the structure parses, the header names HS256, the MAC
    /// matches and `now < exp`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Principal, TokenError> {
        let claims = decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(Principal {
            user_id: claims.user_id,
            role: Role::from(claims.role),
        })
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
