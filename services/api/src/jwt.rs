//! JWT service for session token issuance and verification
//!
//! Tokens are signed with HS512 against a single service secret. Nothing is
//! stored server-side: validity is recomputed on every presentation from the
//! signature and the `[nbf, exp)` window.

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Issuer stamped into every token unless overridden
pub const DEFAULT_ISSUER: &str = "Gambler Backend Service";

/// Refresh tokens live this many times longer than access tokens
pub const REFRESH_LIFETIME_FACTOR: u64 = 7;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret used for signing and verification
    pub secret: String,
    /// Issuer claim expected on every token
    pub issuer: String,
    /// Access token expiration time in seconds (default: 24 hours)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Secret used to sign tokens (required)
    /// - `JWT_ISSUER`: Issuer claim (default: "Gambler Backend Service")
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 86400)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "86400".to_string()) // 24 hours
            .parse()
            .unwrap_or(86400);

        Ok(JwtConfig {
            secret,
            issuer,
            access_token_expiry,
        })
    }

    /// Refresh token expiration time in seconds
    pub fn refresh_token_expiry(&self) -> u64 {
        self.access_token_expiry * REFRESH_LIFETIME_FACTOR
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Issued at time
    pub iat: u64,
    /// Not valid before
    pub nbf: u64,
    /// Expiration time
    pub exp: u64,
    /// Issuer
    pub iss: String,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Access and refresh token pair handed to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token verification and signing failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The signing primitive failed
    #[error("failed to sign token")]
    Signing,
    /// Malformed token or bad signature
    #[error("failed to decode token")]
    NotParseable,
    /// Signature verified but claims are not acceptable yet or at all
    #[error("invalid token")]
    Invalid,
    /// Signature verified and the token is past its expiry
    #[error("token expired")]
    Expired,
}

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Issue an access and refresh token pair for `subject`
    pub fn issue(&self, subject: &str) -> Result<TokenPair, TokenError> {
        let now = unix_now();

        let access_token = self.sign(&self.claims_for(
            subject,
            now,
            self.config.access_token_expiry,
            TokenType::Access,
        ))?;
        let refresh_token = self.sign(&self.claims_for(
            subject,
            now,
            self.config.refresh_token_expiry(),
            TokenType::Refresh,
        ))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::ImmatureSignature
                    | ErrorKind::InvalidIssuer
                    | ErrorKind::InvalidSubject
                    | ErrorKind::MissingRequiredClaim(_) => TokenError::Invalid,
                    _ => TokenError::NotParseable,
                }
            })?;

        // jsonwebtoken accepts `exp == now`; the window is half-open.
        if claims.exp <= unix_now() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry()
    }

    fn claims_for(&self, subject: &str, now: u64, lifetime: u64, token_type: TokenType) -> Claims {
        Claims {
            sub: subject.to_string(),
            iat: now,
            nbf: now,
            exp: now + lifetime,
            iss: self.config.issuer.clone(),
            token_type,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign token: {}", e);
            TokenError::Signing
        })
    }
}
