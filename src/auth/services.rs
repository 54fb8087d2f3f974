use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::TokenKind,
        dto::{AuthResponse, SigninRequest, SignupRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password, MIN_PASSWORD_CHARS},
        repo::NewUser,
        repo_types::{Role, User},
    },
    error::{ApiError, Validator},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// `email` must already be lowercased.
pub(crate) fn is_institutional(email: &str, domains: &[String]) -> bool {
    domains
        .iter()
        .any(|d| email.ends_with(&format!("@{}", d)))
}

pub(crate) fn validate_signup(req: &SignupRequest, domains: &[String]) -> Result<Role, ApiError> {
    let email = req.email.trim().to_lowercase();
    let role = req.role.parse::<Role>().ok();
    Validator::new()
        .require(&req.name, "name", "Name is required")
        .check(is_valid_email(&email), "email", "Please include a valid email")
        .check(
            !is_valid_email(&email) || is_institutional(&email, domains),
            "email",
            "Please use an institutional email address",
        )
        .check(
            req.password.chars().count() >= MIN_PASSWORD_CHARS,
            "password",
            &format!("Please enter a password with {MIN_PASSWORD_CHARS} or more characters"),
        )
        .check(role.is_some(), "role", "Please select your role")
        .require(&req.branch, "branch", "Please select your branch")
        .finish()?;
    role.ok_or_else(|| ApiError::BadRequest("Please select your role".into()))
}

pub(crate) fn validate_signin(req: &SigninRequest, domains: &[String]) -> Result<(), ApiError> {
    let email = req.email.trim().to_lowercase();
    Validator::new()
        .check(is_valid_email(&email), "email", "Please include a valid email")
        .check(
            !is_valid_email(&email) || is_institutional(&email, domains),
            "email",
            "Please use an institutional email address",
        )
        .require(&req.password, "password", "Password is required")
        .finish()
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        token,
        refresh_token,
        user: user.into(),
    })
}

pub async fn signup(state: &AppState, req: SignupRequest) -> Result<AuthResponse, ApiError> {
    let role = validate_signup(&req, &state.config.allowed_email_domains)?;
    let email = req.email.trim().to_lowercase();

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::BadRequest("User already exists".into()));
    }

    let hash = hash_password(&req.password)?;
    let Some(user) = User::create(
        &state.db,
        NewUser {
            name: req.name.trim(),
            email: &email,
            password_hash: &hash,
            branch: req.branch.trim(),
            role: role.as_str(),
        },
    )
    .await?
    else {
        warn!(%email, "email registered concurrently");
        return Err(ApiError::BadRequest("User already exists".into()));
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    issue_tokens(state, user)
}

pub async fn signin(state: &AppState, req: SigninRequest) -> Result<AuthResponse, ApiError> {
    validate_signin(&req, &state.config.allowed_email_domains)?;
    let email = req.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(%email, "signin unknown email");
        return Err(ApiError::BadRequest("Invalid Credentials".into()));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "signin invalid password");
        return Err(ApiError::BadRequest("Invalid Credentials".into()));
    }

    info!(user_id = %user.id, "user signed in");
    issue_tokens(state, user)
}

pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys
        .verify(refresh_token, TokenKind::Refresh)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    let user = load_user(state, claims.sub).await?;
    issue_tokens(state, user)
}

pub async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))
}
