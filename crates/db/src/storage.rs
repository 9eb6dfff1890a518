//! Backend-agnostic storage contract.

use async_trait::async_trait;

use crate::book::{Book, NewBook};
use crate::error::StorageResult;

/// CRUD contract satisfied by every storage backend.
///
/// Each operation is atomic from the caller's point of view and returns
/// owned copies; callers never hold references into backend state.
#[async_trait]
pub trait BookStorage: Send + Sync {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Persist a new book and return it with its assigned id.
    async fn create(&self, book: NewBook) -> StorageResult<Book>;

    /// Fetch one book, failing with `NotFound` when absent.
    async fn get(&self, id: i64) -> StorageResult<Book>;

    /// Every stored book.
    async fn get_all(&self) -> StorageResult<Vec<Book>>;

    /// Replace all fields of the book with `book.id`. Never inserts.
    async fn update(&self, book: Book) -> StorageResult<Book>;

    /// Remove a book permanently.
    async fn delete(&self, id: i64) -> StorageResult<()>;

    /// Release held resources. Called once at shutdown.
    async fn close(&self) {}
}
