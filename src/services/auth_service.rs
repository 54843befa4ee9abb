use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

use crate::{
    auth::{AuthError, Identity},
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Role,
    response::{ApiResponse, Meta},
    session::Session,
    state::AppState,
    store::{Patch, paths},
};

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Identity>> {
    let RegisterRequest {
        username,
        email,
        password,
        confirm_password,
    } = payload;
    if password != confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".into()));
    }
    if username.trim().is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }

    let identity = state.auth.sign_up(&email, &password).await?;

    let patch = Patch::new()
        .set(format!("{}/username", paths::profile(&identity.uid)), username.trim().into())
        .set(format!("{}/email", paths::profile(&identity.uid)), identity.email.clone().into())
        .set(paths::role(&identity.uid), json!(Role::Customer.as_str()));
    state.store.update(patch).await?;

    tracing::info!(uid = %identity.uid, "user registered");
    Ok(ApiResponse::success("User created", identity, None))
}

pub async fn read_role(state: &AppState, uid: &str) -> AppResult<Role> {
    let stored = state.store.read(&paths::role(uid)).await?;
    Ok(Role::from_stored(stored.as_ref().and_then(|v| v.as_str())))
}

pub fn issue_token(secret: &str, session: &Session) -> AppResult<String> {
    let claims = Claims {
        sub: session.uid.clone(),
        sid: session.id.clone(),
        role: session.role,
        exp: session.expires_at.timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let identity = state.auth.sign_in(&email, &password).await?;
    let role = read_role(state, &identity.uid).await?;

    let session = state
        .sessions
        .start(state.store.clone(), &identity, role)
        .await?;
    let token = issue_token(&state.config.jwt_secret, &session)?;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        uid: identity.uid,
        role,
        expires_at: session.expires_at,
    };

    Ok(ApiResponse::success(
        "Logged in",
        resp,
        Some(Meta::empty()),
    ))
}

pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.sessions.end(&user.session.id).await;
    state.auth.sign_out(&user.uid).await?;
    Ok(ApiResponse::success(
        "Logged out",
        json!({ "uid": user.uid }),
        Some(Meta::empty()),
    ))
}

/// Create the admin account if needed and make sure it carries the admin role.
pub async fn ensure_admin_account(state: &AppState, email: &str, password: &str) -> AppResult<String> {
    let identity = match state.auth.sign_up(email, password).await {
        Ok(identity) => identity,
        Err(AuthError::EmailTaken) => state.auth.sign_in(email, password).await?,
        Err(err) => return Err(err.into()),
    };

    let patch = Patch::new()
        .set(paths::role(&identity.uid), json!(Role::Admin.as_str()))
        .set(format!("{}/email", paths::profile(&identity.uid)), identity.email.clone().into())
        .set(format!("{}/username", paths::profile(&identity.uid)), json!("admin"));
    state.store.update(patch).await?;

    tracing::info!(uid = %identity.uid, "admin account ready");
    Ok(identity.uid)
}
