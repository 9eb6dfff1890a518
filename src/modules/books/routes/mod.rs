//! HTTP handlers for the book catalog.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use books_db::{BookStorage, StorageError};
use books_http::error::AppError;

use super::models::{Book, CreateBook};

type Store = Arc<dyn BookStorage>;

/// Routes for the book catalog, bound to `store`.
pub fn router(store: Store) -> Router {
    Router::new()
        .route("/book", post(create_book).put(update_book))
        .route("/book/{id}", get(get_book).delete(delete_book))
        .route("/books", get(list_books))
        .with_state(store)
}

fn body_error(rejection: JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

fn path_error(rejection: PathRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

async fn create_book(
    State(store): State<Store>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(payload) = payload.map_err(body_error)?;
    let book = payload.into_new_book().map_err(StorageError::from)?;

    let created = store.create(book).await?;
    tracing::info!(book_id = created.id, "book created");

    Ok((StatusCode::ACCEPTED, Json(created)))
}

async fn get_book(
    State(store): State<Store>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id.map_err(path_error)?;
    Ok(Json(store.get(id).await?))
}

async fn list_books(State(store): State<Store>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(store.get_all().await?))
}

async fn update_book(
    State(store): State<Store>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Json(book) = payload.map_err(body_error)?;

    let updated = store.update(book).await?;
    tracing::info!(book_id = updated.id, "book updated");

    Ok(Json(updated))
}

async fn delete_book(
    State(store): State<Store>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(path_error)?;

    store.delete(id).await?;
    tracing::info!(book_id = id, "book deleted");

    Ok(StatusCode::OK)
}
