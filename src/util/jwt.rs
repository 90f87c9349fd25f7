use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::JwtConfig;

/// JWT token claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Login time. Carried over on refresh so a session cannot outlive
    /// its maximum age by refreshing.
    pub auth_time: i64,
    /// Token type (access or refresh)
    pub token_type: String,
    pub jti: String,
}

/// Token pair returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub token_type: String,
}

#[derive(Debug, Clone, Copy)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode JWT token: {0}")]
    EncodingFailed(String),
    #[error("Failed to decode JWT token: {0}")]
    DecodingFailed(String),
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid token format")]
    InvalidToken,
    #[error("Invalid token type: expected {expected}, got {actual}")]
    InvalidTokenType { expected: String, actual: String },
}

/// Identity a token pair is issued for.
#[derive(Debug, Clone)]
pub struct Subject<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub role: &'a str,
}

pub trait JwtTokenUtils: Send + Sync {
    /// Issue a pair for `subject`. `auth_time` is the login time; pass
    /// None on login to use now.
    fn generate_token_pair(&self, subject: &Subject<'_>, auth_time: Option<i64>) -> Result<TokenPair, JwtError>;
    fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError>;
    fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError>;
    fn extract_token_from_header(&self, auth_header: &str) -> Result<String, JwtError>;
}

#[derive(Debug, Clone)]
pub struct JwtTokenUtilsImpl {
    pub jwt_config: JwtConfig,
}

impl JwtTokenUtilsImpl {
    pub fn new(jwt_config: JwtConfig) -> Self {
        JwtTokenUtilsImpl { jwt_config }
    }

    fn generate_token(
        &self,
        subject: &Subject<'_>,
        auth_time: i64,
        token_type: TokenType,
        expires_in_minutes: i64,
    ) -> Result<String, JwtError> {
        debug!("Generating {} token for user: {}", token_type.as_str(), subject.user_id);

        let now = Utc::now();
        let claims = Claims {
            sub: subject.user_id.to_string(),
            email: subject.email.to_string(),
            role: subject.role.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(expires_in_minutes)).timestamp(),
            auth_time,
            token_type: token_type.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        let encoding_key = EncodingKey::from_secret(self.jwt_config.jwt_secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &encoding_key).map_err(|err| {
            error!("Failed to encode JWT token: {}", err);
            JwtError::EncodingFailed(err.to_string())
        })
    }

    pub fn validate_token(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_config.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    warn!("Token has expired");
                    JwtError::TokenExpired
                }
                _ => {
                    debug!("Failed to decode JWT token: {}", err);
                    JwtError::DecodingFailed(err.to_string())
                }
            })?
            .claims;

        if claims.token_type != expected.as_str() {
            warn!("Invalid token type: expected {}, got {}", expected.as_str(), claims.token_type);
            return Err(JwtError::InvalidTokenType {
                expected: expected.as_str().to_string(),
                actual: claims.token_type,
            });
        }
        Ok(claims)
    }
}

impl JwtTokenUtils for JwtTokenUtilsImpl {
    fn generate_token_pair(&self, subject: &Subject<'_>, auth_time: Option<i64>) -> Result<TokenPair, JwtError> {
        let auth_time = auth_time.unwrap_or_else(|| Utc::now().timestamp());
        let access_token = self.generate_token(subject, auth_time, TokenType::Access, self.jwt_config.access_token_expiration)?;
        let refresh_token = self.generate_token(subject, auth_time, TokenType::Refresh, self.jwt_config.refresh_token_expiration)?;

        info!("Issued token pair for user: {}", subject.user_id);
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt_config.access_token_expiration * 60,
            token_type: "Bearer".to_string(),
        })
    }

    fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_token(token, TokenType::Access)
    }

    fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_token(token, TokenType::Refresh)
    }

    fn extract_token_from_header(&self, auth_header: &str) -> Result<String, JwtError> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(JwtError::InvalidToken)?;
        if token.is_empty() {
            return Err(JwtError::InvalidToken);
        }
        Ok(token.to_string())
    }
}
