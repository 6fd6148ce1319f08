use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use shelf_http::AppError;

use super::{
    models::{AuthorView, NewAuthor},
    store::AuthorStore,
};

const CREATE_FAILED: &str = "Failed to create the author";

/// POST /authors
pub(super) async fn create_author(
    State(store): State<AuthorStore>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthorView>), AppError> {
    let Json(body) = body.map_err(|e| AppError::persistence(CREATE_FAILED, e))?;
    let new_author =
        NewAuthor::from_json(body).map_err(|e| AppError::persistence(CREATE_FAILED, e))?;

    let author = store
        .create(new_author)
        .await
        .map_err(|e| AppError::persistence(CREATE_FAILED, e))?;

    Ok((StatusCode::CREATED, Json(author.into())))
}
