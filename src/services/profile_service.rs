use crate::{
    auth::MIN_PASSWORD_LEN,
    dto::profile::{ChangePasswordRequest, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    services::product_service::validate_image,
    state::AppState,
    store::{self, DocumentStore, Patch, paths},
};

/// A user without a stored profile gets an empty one.
pub async fn load_profile(store: &dyn DocumentStore, uid: &str) -> AppResult<Profile> {
    Ok(store::get(store, &paths::profile(uid)).await?.unwrap_or_default())
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let mut profile = load_profile(state.store.as_ref(), &user.uid).await?;
    if profile.email.is_empty() {
        profile.email = user.email.clone();
    }
    Ok(ApiResponse::success("Profile", profile, Some(Meta::empty())))
}

/// Email always comes from the signed-in account, never from the request.
pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    if payload.username.trim().is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }

    let base = paths::profile(&user.uid);
    let patch = Patch::new()
        .set(format!("{base}/name"), payload.name.trim().into())
        .set(format!("{base}/username"), payload.username.trim().into())
        .set(format!("{base}/numberPhone"), payload.number_phone.trim().into())
        .set(format!("{base}/email"), user.email.clone().into());
    state.store.update(patch).await?;

    let profile = load_profile(state.store.as_ref(), &user.uid).await?;
    tracing::info!(uid = %user.uid, complete = profile.is_complete(), "profile updated");
    Ok(ApiResponse::success(
        "Profile updated successfully",
        profile,
        Some(Meta::empty()),
    ))
}

pub async fn upload_profile_image(
    state: &AppState,
    user: &AuthUser,
    bytes: Vec<u8>,
    content_type: &str,
) -> AppResult<ApiResponse<Profile>> {
    validate_image(&bytes, content_type)?;
    let blob_path = paths::profile_image(&user.uid);
    state.blobs.upload(&blob_path, bytes, content_type).await?;
    let url = state.blobs.url(&blob_path).await?;

    state
        .store
        .write(&format!("{}/image", paths::profile(&user.uid)), url.into())
        .await?;

    let profile = load_profile(state.store.as_ref(), &user.uid).await?;
    Ok(ApiResponse::success("Image updated", profile, Some(Meta::empty())))
}

pub fn validate_new_password(new_password: &str, confirm_password: &str) -> AppResult<()> {
    if new_password.is_empty() || confirm_password.is_empty() {
        return Err(AppError::BadRequest(
            "Please enter both new and confirm passwords".into(),
        ));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "Password should be at least 6 characters".into(),
        ));
    }
    if new_password != confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".into()));
    }
    Ok(())
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    validate_new_password(&payload.new_password, &payload.confirm_password)?;
    state
        .auth
        .update_password(&user.uid, &payload.new_password)
        .await?;
    tracing::info!(uid = %user.uid, "password changed");
    Ok(ApiResponse::success(
        "Password updated successfully",
        serde_json::json!({ "uid": user.uid }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn new_password_rules() {
        assert!(validate_new_password("", "").is_err());
        assert!(validate_new_password("abc", "abc").is_err());
        assert!(validate_new_password("abcdef", "abcdeg").is_err());
        assert!(validate_new_password("abcdef", "abcdef").is_ok());
    }

    #[tokio::test]
    async fn missing_profile_loads_empty() {
        let store = MemoryStore::new();
        let profile = load_profile(&store, "nobody").await.unwrap();
        assert_eq!(profile, Profile::default());
        assert!(!profile.is_complete());
    }
}
