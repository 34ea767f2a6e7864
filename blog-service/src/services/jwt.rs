use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;

/// Issues and validates HS256 bearer tokens.
///
/// Tokens are self-contained: there is no revocation list, so a token stays
/// valid until `exp` regardless of later account changes. Rotating the secret
/// invalidates every outstanding token.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

/// Claims carried by an author token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorClaims {
    /// Author ID
    pub author_id: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Any parse failure. Deliberately carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid token")]
pub struct InvalidToken;

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_hours: config.expiry_hours,
        }
    }

    /// Issue a token for an author with the configured lifetime.
    pub fn issue_token(&self, author_id: i64) -> Result<String, anyhow::Error> {
        self.issue_token_with_ttl(author_id, Duration::hours(self.expiry_hours))
    }

    pub fn issue_token_with_ttl(
        &self,
        author_id: i64,
        ttl: Duration,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = AuthorClaims {
            author_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))
    }

    /// Validate signature, structure, and expiry.
    pub fn parse_token(&self, token: &str) -> Result<AuthorClaims, InvalidToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<AuthorClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretString;

    fn service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: SecretString::new(secret.to_string()),
            expiry_hours: 72,
        })
    }

    #[test]
    fn test_token_round_trips_author_id() -> Result<(), anyhow::Error> {
        let jwt = service("test-secret");
        let token = jwt.issue_token(42)?;

        let claims = jwt.parse_token(&token)?;
        assert_eq!(claims.author_id, 42);
        assert_eq!(claims.exp - claims.iat, 72 * 3600);
        Ok(())
    }

    #[test]
    fn test_expired_token_is_invalid() -> Result<(), anyhow::Error> {
        let jwt = service("test-secret");
        let token = jwt.issue_token_with_ttl(42, Duration::hours(-1))?;

        assert_eq!(jwt.parse_token(&token).unwrap_err(), InvalidToken);
        Ok(())
    }

    #[test]
    fn test_wrong_secret_is_invalid() -> Result<(), anyhow::Error> {
        let token = service("secret-a").issue_token(42)?;

        assert!(service("secret-b").parse_token(&token).is_err());
        Ok(())
    }

    #[test]
    fn test_garbage_is_invalid() {
        let jwt = service("test-secret");
        assert!(jwt.parse_token("not-a-token").is_err());
        assert!(jwt.parse_token("").is_err());
    }
}
