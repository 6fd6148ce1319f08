use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use shelf_http::AppError;

use super::{
    models::{BookPatch, BookView, NewBook},
    store::BookStore,
};

const CREATE_FAILED: &str = "Failed to create the book";
const LIST_FAILED: &str = "Failed to retrieve books";
const UPDATE_FAILED: &str = "Failed to update the book";
const DELETE_FAILED: &str = "Deleting book failed";

#[derive(Debug, Serialize)]
pub(super) struct DeleteConfirmation {
    message: &'static str,
}

/// POST /books
pub(super) async fn create_book(
    State(store): State<BookStore>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookView>), AppError> {
    let Json(body) = body.map_err(|e| AppError::persistence(CREATE_FAILED, e))?;
    let new_book = NewBook::from_json(body).map_err(|e| AppError::persistence(CREATE_FAILED, e))?;

    let book = store
        .create(new_book)
        .await
        .map_err(|e| AppError::persistence(CREATE_FAILED, e))?;

    Ok((StatusCode::CREATED, Json(book.into())))
}

/// GET /books
pub(super) async fn list_books(
    State(store): State<BookStore>,
) -> Result<Json<Vec<BookView>>, AppError> {
    let books = store
        .list_all()
        .await
        .map_err(|e| AppError::persistence(LIST_FAILED, e))?;

    Ok(Json(books.into_iter().map(BookView::from).collect()))
}

/// PUT /books/{id}
///
/// An unknown id is not an error: the body is `null`.
pub(super) async fn update_book(
    State(store): State<BookStore>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Option<BookView>>, AppError> {
    let Json(body) = body.map_err(|e| AppError::persistence(UPDATE_FAILED, e))?;
    let patch = BookPatch::from_json(body).map_err(|e| AppError::persistence(UPDATE_FAILED, e))?;

    let book = store
        .update_by_id(&id, patch)
        .await
        .map_err(|e| AppError::persistence(UPDATE_FAILED, e))?;

    Ok(Json(book.map(BookView::from)))
}

/// DELETE /books/{id}
pub(super) async fn delete_book(
    State(store): State<BookStore>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>, AppError> {
    store
        .delete_by_id(&id)
        .await
        .map_err(|e| AppError::persistence(DELETE_FAILED, e))?;

    Ok(Json(DeleteConfirmation {
        message: "Book deleted successfully",
    }))
}
