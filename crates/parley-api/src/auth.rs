use std::ops::RangeInclusive;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{debug, info};
use uuid::Uuid;

use parley_chat::{ChatError, ChatResult, ChatService};
use parley_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::{ApiError, run_blocking};
use crate::extract::JsonBody;

const USERNAME_CHARS: RangeInclusive<usize> = 3..=32;
const MIN_PASSWORD_CHARS: usize = 8;
const TOKEN_LIFETIME_DAYS: i64 = 30;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub chat: ChatService,
    pub jwt_secret: String,
}

/// POST /auth/register. 409 when the username is taken, in any letter case.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let secret = state.jwt_secret.clone();
    let registered = run_blocking(&state, move |chat| {
        let username = req.username.trim();
        check_credentials(username, &req.password)?;

        if chat.db().get_user_by_username(username)?.is_some() {
            return Err(username_taken());
        }

        let password_hash = hash_password(&req.password)?;
        let user_id = Uuid::new_v4();
        // A concurrent registration can still win between lookup and insert
        if !chat.db().create_user(&user_id.to_string(), username, &password_hash)? {
            return Err(username_taken());
        }
        info!("Registered user {}", username);

        let token = create_token(&secret, user_id, username)?;
        Ok(RegisterResponse { user_id, token })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(registered)))
}

/// POST /auth/login. Unknown users and wrong passwords get the same 401.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let secret = state.jwt_secret.clone();
    let response = run_blocking(&state, move |chat| {
        let user = chat
            .db()
            .get_user_by_username(req.username.trim())?
            .ok_or_else(bad_credentials)?;

        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow!("stored hash for {} is unreadable: {}", user.username, e))?;
        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| {
                debug!("Wrong password for {}", user.username);
                bad_credentials()
            })?;

        let user_id: Uuid = user.id.parse().context("stored user id is not a UUID")?;
        let token = create_token(&secret, user_id, &user.username)?;
        Ok(LoginResponse {
            user_id,
            username: user.username,
            token,
        })
    })
    .await?;

    Ok(Json(response))
}

/// Issue a 30-day HS256 token for the user.
pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn check_credentials(username: &str, password: &str) -> ChatResult<()> {
    if !USERNAME_CHARS.contains(&username.chars().count()) {
        return Err(ChatError::InvalidRequest(
            "Username must be 3 to 32 characters.".into(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ChatError::InvalidRequest(
            "Password must be at least 8 characters.".into(),
        ));
    }
    Ok(())
}

/// Argon2id with a fresh salt.
fn hash_password(password: &str) -> ChatResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

fn username_taken() -> ChatError {
    ChatError::Conflict("Username is already taken.".into())
}

fn bad_credentials() -> ChatError {
    ChatError::Unauthorized("Invalid username or password.".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn credential_rules() {
        assert!(check_credentials("bob", "12345678").is_ok());
        assert!(matches!(
            check_credentials("ab", "12345678"),
            Err(ChatError::InvalidRequest(_))
        ));
        assert!(matches!(
            check_credentials(&"x".repeat(33), "12345678"),
            Err(ChatError::InvalidRequest(_))
        ));
        assert!(matches!(
            check_credentials("bob", "short"),
            Err(ChatError::InvalidRequest(_))
        ));
        // Counted in characters, not bytes
        assert!(check_credentials("żółw", "12345678").is_ok());
    }

    #[test]
    fn token_round_trips_claims() {
        let id = Uuid::new_v4();
        let token = create_token("secret", id, "alice").unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, id);
        assert_eq!(decoded.claims.username, "alice");
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"correct horse", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }
}
