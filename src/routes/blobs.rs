use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{*path}", get(get_blob))
}

#[utoipa::path(
    get,
    path = "/blobs/{path}",
    params(("path" = String, Path, description = "Object path, e.g. product_images/{id}")),
    responses(
        (status = 200, description = "Stored bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Not found")
    ),
    tag = "Blobs"
)]
pub async fn get_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<impl IntoResponse> {
    let blob = state.blobs.download(&path).await?.ok_or(AppError::NotFound)?;
    Ok(([(header::CONTENT_TYPE, blob.content_type)], blob.bytes))
}
