//! Book entity model, the storage contract, and its two backends.

use std::sync::Arc;

use books_kernel::settings::{DatabaseSettings, StorageBackend, StorageSettings};

pub mod book;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod storage;

pub use book::{validate_id, Book, FieldViolation, NewBook, ValidationError};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStorage;
pub use postgres::PostgresStorage;
pub use storage::BookStorage;

/// Open the configured backend.
///
/// The PostgreSQL backend is verified reachable before this returns; a
/// `Connectivity` error here means the process must not serve traffic.
pub async fn open(
    storage: &StorageSettings,
    database: &DatabaseSettings,
) -> StorageResult<Arc<dyn BookStorage>> {
    match storage.backend {
        StorageBackend::Memory => {
            tracing::warn!(
                target: "books-db",
                "using volatile in-memory storage; data is lost on shutdown"
            );
            Ok(Arc::new(InMemoryStorage::new()))
        }
        StorageBackend::Postgres => {
            let store = PostgresStorage::connect(database).await?;
            Ok(Arc::new(store))
        }
    }
}
