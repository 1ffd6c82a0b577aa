//! HS256 JWT verification for tokens issued by the identity service.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use bazaar_core::config::AuthConfig;
use bazaar_core::error::AppError;
use bazaar_core::result::AppResult;
use bazaar_core::traits::identity::{Identity, IdentityResolver};
use bazaar_core::types::id::UserId;

/// JWT claims this service reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: UserId,
    /// Display name, when the issuer includes one.
    #[serde(default)]
    pub name: Option<String>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// The identity carried by the token.
    pub fn identity(&self) -> Identity {
        let display_name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("user-{}", &self.sub.to_string()[..8]));
        Identity {
            user_id: self.sub,
            display_name,
        }
    }
}

/// Resolves identities from HS256-signed bearer tokens.
#[derive(Clone)]
pub struct JwtIdentityResolver {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtIdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityResolver")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtIdentityResolver {
    /// Creates a new resolver from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token.
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AppError::unauthorized("Invalid or expired token")
            })
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, token: &str) -> AppResult<Identity> {
        if token.trim().is_empty() {
            return Err(AppError::unauthorized("Missing token"));
        }
        Ok(self.decode(token)?.identity())
    }
}
