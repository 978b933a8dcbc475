use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::permissions::Role;

/// Access-token claims. `sub` carries the user id as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i32, role: Role) -> Self {
        let now = Utc::now();
        let expiry_minutes = config::config().security.jwt_expiry_minutes;
        let exp = (now + Duration::minutes(expiry_minutes)).timestamp();

        Self {
            sub: user_id.to_string(),
            role,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

fn secret() -> Result<&'static str, JwtError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());

    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn decode_jwt(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

/// Argon2id PHC string for `password`
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// False for a wrong password and for an unparseable stored hash
pub fn verify_password(password: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// One-time password handed out by an administrative reset
pub fn generate_temporary_password() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("Temp{}123!", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong-pass", &hash));
        assert!(!verify_password("s3cret-pass", "not-a-phc-string"));
    }

    #[test]
    fn temporary_password_shape() {
        let temp = generate_temporary_password();
        assert!(temp.starts_with("Temp"));
        assert!(temp.ends_with("123!"));
        assert_eq!(temp.len(), 4 + 8 + 4);
        assert!(temp[4..12].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn token_carries_subject_and_role() {
        let claims = Claims::new(42, Role::Technician);
        let token = generate_jwt(&claims).unwrap();
        let decoded = decode_jwt(&token).unwrap();

        assert_eq!(decoded.user_id(), Some(42));
        assert_eq!(decoded.role, Role::Technician);
        assert!(decoded.exp > decoded.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = generate_jwt(&Claims::new(1, Role::Viewer)).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(decode_jwt(&tampered), Err(JwtError::InvalidToken(_))));
    }
}
