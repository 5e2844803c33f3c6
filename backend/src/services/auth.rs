//! Authentication service for user registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Claims;
use shared::models::{User, UserRole};
use shared::validation::{validate_password, validate_username};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new user account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub role: UserRole,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Input for refreshing tokens
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Response after successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// User row from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    name: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_signed_in: Option<DateTime<Utc>>,
}

fn user_from_row(row: UserRow) -> AppResult<User> {
    let role = UserRole::from_str(&row.role)
        .ok_or_else(|| AppError::Internal(format!("Unknown role '{}'", row.role)))?;
    Ok(User {
        id: row.id,
        username: row.username,
        name: row.name,
        role,
        is_active: row.is_active,
        created_at: row.created_at,
        last_signed_in: row.last_signed_in,
    })
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Register a new user account (admin capability).
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        input.validate().map_err(|e| AppError::Validation {
            field: "input".to_string(),
            message: e.to_string(),
            message_de: "Ungültige Eingabe".to_string(),
        })?;
        if let Err(msg) = validate_username(&input.username) {
            return Err(AppError::Validation {
                field: "username".to_string(),
                message: msg.to_string(),
                message_de: "Ungültiger Benutzername".to_string(),
            });
        }
        if let Err(msg) = validate_password(&input.password) {
            return Err(AppError::Validation {
                field: "password".to_string(),
                message: msg.to_string(),
                message_de: "Passwort zu schwach".to_string(),
            });
        }

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
                .bind(&input.username)
                .fetch_one(&self.db)
                .await?;
        if existing > 0 {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "Username already taken".to_string(),
                message_de: "Benutzername ist bereits vergeben".to_string(),
            });
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, name, role, is_active, created_at, last_signed_in
            "#,
        )
        .bind(&input.username)
        .bind(&password_hash)
        .bind(input.name.trim())
        .bind(input.role.as_str())
        .fetch_one(&self.db)
        .await?;

        user_from_row(row)
    }

    /// Authenticate with username and password
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, name, role, is_active, created_at, last_signed_in
            FROM users
            WHERE username = $1 AND is_active
            "#,
        )
        .bind(&input.username)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &row.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_signed_in = NOW() WHERE id = $1")
            .bind(row.id)
            .execute(&self.db)
            .await?;

        let user = user_from_row(row)?;
        let tokens = self.generate_tokens(&user)?;
        Ok(LoginResponse { user, tokens })
    }

    /// Issue a fresh token pair from a valid refresh token
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let claims = decode::<Claims>(
            &input.refresh_token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?
        .claims;

        if claims.token_use != "refresh" {
            return Err(AppError::InvalidToken);
        }

        let user_id: i64 = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;
        let user = self.get_user(user_id).await?;
        if !user.is_active {
            return Err(AppError::InvalidToken);
        }

        self.generate_tokens(&user)
    }

    /// Get a user by id
    pub async fn get_user(&self, user_id: i64) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, name, role, is_active, created_at, last_signed_in
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        user_from_row(row)
    }

    fn generate_tokens(&self, user: &User) -> AppResult<AuthTokens> {
        let access_token = self.generate_token(user, "access", self.access_token_expiry)?;
        let refresh_token = self.generate_token(user, "refresh", self.refresh_token_expiry)?;
        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn generate_token(&self, user: &User, token_use: &str, expiry_secs: i64) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
            token_use: token_use.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
