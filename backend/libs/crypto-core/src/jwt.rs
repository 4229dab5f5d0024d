/// Shared JWT issuing and validation for Agora services
///
/// Tokens are signed with RS256 (RSA with SHA-256). Keys are PEM strings
/// loaded once at startup and kept in process-wide slots; there is no
/// symmetric fallback.
///
/// ## Token kinds
///
/// - **access**: sent as `Authorization: Bearer <token>`, lives 1 day
/// - **refresh**: exchanged at the refresh endpoint for a new access token, lives 7 days
///
/// ## Usage
///
/// ```rust,ignore
/// use crypto_core::jwt;
///
/// let (private_key, public_key) = jwt::load_keys_from_env()?;
/// jwt::initialize_jwt_keys(&private_key, &public_key)?;
///
/// let pair = jwt::generate_token_pair(user_id, "alice")?;
/// let claims = jwt::validate_access_token(&pair.access)?;
/// ```
use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

const ACCESS_TOKEN_EXPIRY_DAYS: i64 = 1;
const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

pub const PRIVATE_KEY_ENV: &str = "JWT_PRIVATE_KEY_PEM";
pub const PUBLIC_KEY_ENV: &str = "JWT_PUBLIC_KEY_PEM";

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims: standard registered claims plus the account's username
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub token_type: TokenKind,
    pub username: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

/// Token pair returned by the token endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

// ============================================================================
// Key Storage
// ============================================================================

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

// ============================================================================
// Initialization
// ============================================================================

/// Read the PEM key pair from `JWT_PRIVATE_KEY_PEM` / `JWT_PUBLIC_KEY_PEM`
pub fn load_keys_from_env() -> Result<(String, String)> {
    let private_key = std::env::var(PRIVATE_KEY_ENV)
        .with_context(|| format!("{PRIVATE_KEY_ENV} environment variable not set"))?;
    let public_key = std::env::var(PUBLIC_KEY_ENV)
        .with_context(|| format!("{PUBLIC_KEY_ENV} environment variable not set"))?;
    Ok((private_key, public_key))
}

/// Initialize JWT keys from PEM-formatted strings
///
/// MUST be called during startup before any token is issued or validated.
/// Can only be called once; later calls return an error.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;

    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;

    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    Ok(())
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

// ============================================================================
// Token Generation
// ============================================================================

fn generate_token(
    user_id: Uuid,
    username: &str,
    kind: TokenKind,
    lifetime: Duration,
) -> Result<String> {
    let now = Utc::now();

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
        token_type: kind,
        username: username.to_string(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, get_encoding_key()?)
        .map_err(|e| anyhow!("Failed to generate {kind:?} token: {e}"))
}

pub fn generate_access_token(user_id: Uuid, username: &str) -> Result<String> {
    generate_token(
        user_id,
        username,
        TokenKind::Access,
        Duration::days(ACCESS_TOKEN_EXPIRY_DAYS),
    )
}

pub fn generate_refresh_token(user_id: Uuid, username: &str) -> Result<String> {
    generate_token(
        user_id,
        username,
        TokenKind::Refresh,
        Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
    )
}

pub fn generate_token_pair(user_id: Uuid, username: &str) -> Result<TokenPair> {
    Ok(TokenPair {
        access: generate_access_token(user_id, username)?,
        refresh: generate_refresh_token(user_id, username)?,
    })
}

// ============================================================================
// Token Validation
// ============================================================================

/// Validate signature and expiry of a token of any kind
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, get_decoding_key()?, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

fn validate_kind(token: &str, expected: TokenKind) -> Result<Claims> {
    let claims = validate_token(token)?.claims;
    if claims.token_type != expected {
        return Err(anyhow!(
            "Token has wrong type: expected {expected:?}, got {:?}",
            claims.token_type
        ));
    }
    Ok(claims)
}

/// Validate a bearer token; refresh tokens are rejected
pub fn validate_access_token(token: &str) -> Result<Claims> {
    validate_kind(token, TokenKind::Access)
}

pub fn validate_refresh_token(token: &str) -> Result<Claims> {
    validate_kind(token, TokenKind::Refresh)
}

/// Exchange a refresh token for a fresh access token
pub fn refresh_access_token(refresh_token: &str) -> Result<String> {
    let claims = validate_refresh_token(refresh_token)?;
    generate_access_token(claims.user_id()?, &claims.username)
}

// ============================================================================
// Tests
// ============================================================================
