//! Volatile in-memory backend.
//!
//! Books live in a `Vec` in insertion order until a delete swaps the last
//! element into the freed slot. Ids come from a counter that is never
//! rewound, so a deleted id is never handed out again. Everything is lost
//! when the process exits.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::book::{validate_id, Book, NewBook};
use crate::error::{StorageError, StorageResult};
use crate::storage::BookStorage;

#[derive(Debug, Default)]
struct Catalog {
    books: Vec<Book>,
    last_id: i64,
}

impl Catalog {
    fn position(&self, id: i64) -> Option<usize> {
        self.books.iter().position(|book| book.id == id)
    }
}

/// In-memory `BookStorage`; all operations are serialized behind one lock.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    catalog: Mutex<Catalog>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStorage for InMemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, book: NewBook) -> StorageResult<Book> {
        book.validate()?;

        let mut catalog = self.catalog.lock().await;
        catalog.last_id += 1;
        let stored = book.with_id(catalog.last_id);
        catalog.books.push(stored.clone());

        tracing::debug!(backend = "memory", book_id = stored.id, "book created");
        Ok(stored)
    }

    async fn get(&self, id: i64) -> StorageResult<Book> {
        validate_id(id)?;

        let catalog = self.catalog.lock().await;
        catalog
            .books
            .iter()
            .find(|book| book.id == id)
            .cloned()
            .ok_or(StorageError::not_found(id))
    }

    async fn get_all(&self) -> StorageResult<Vec<Book>> {
        Ok(self.catalog.lock().await.books.clone())
    }

    async fn update(&self, book: Book) -> StorageResult<Book> {
        book.validate()?;

        let mut catalog = self.catalog.lock().await;
        let idx = catalog
            .position(book.id)
            .ok_or(StorageError::not_found(book.id))?;
        catalog.books[idx] = book.clone();

        tracing::debug!(backend = "memory", book_id = book.id, "book updated");
        Ok(book)
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        validate_id(id)?;

        let mut catalog = self.catalog.lock().await;
        let idx = catalog.position(id).ok_or(StorageError::not_found(id))?;
        // O(1) removal; the last book takes the freed slot.
        catalog.books.swap_remove(idx);

        tracing::debug!(backend = "memory", book_id = id, "book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    fn sample(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            description: title.to_string(),
            price: 1.11,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = InMemoryStorage::new();
        let first = store.create(sample("Test1")).await.unwrap();
        let second = store.create(sample("Test1")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.get_all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn get_returns_created_book() {
        let store = InMemoryStorage::new();
        let created = store.create(sample("Dune")).await.unwrap();
        assert_eq!(store.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = InMemoryStorage::new();
        let err = store.get(420).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { id: 420 }));
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let store = InMemoryStorage::new();
        store.create(sample("Test1")).await.unwrap();

        let changed = Book {
            id: 1,
            title: "Test2".to_string(),
            description: "Test2".to_string(),
            price: 2.22,
        };
        assert_eq!(store.update(changed.clone()).await.unwrap(), changed);
        assert_eq!(store.get(1).await.unwrap(), changed);
    }

    #[tokio::test]
    async fn update_missing_never_inserts() {
        let store = InMemoryStorage::new();
        store.create(sample("Test1")).await.unwrap();

        let ghost = sample("Blazing it").with_id(420);
        let err = store.update(ghost).await.unwrap_err();

        assert!(matches!(err, StorageError::NotFound { id: 420 }));
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_is_terminal() {
        let store = InMemoryStorage::new();
        let book = store.create(sample("Test1")).await.unwrap();

        store.delete(book.id).await.unwrap();
        assert!(matches!(
            store.get(book.id).await.unwrap_err(),
            StorageError::NotFound { .. }
        ));
        assert!(matches!(
            store.delete(book.id).await.unwrap_err(),
            StorageError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn delete_swaps_last_into_slot() {
        let store = InMemoryStorage::new();
        for title in ["a", "b", "c", "d"] {
            store.create(sample(title)).await.unwrap();
        }

        store.delete(2).await.unwrap();
        let ids: Vec<i64> = store
            .get_all()
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![1, 4, 3]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryStorage::new();
        store.create(sample("a")).await.unwrap();
        let second = store.create(sample("b")).await.unwrap();
        store.delete(second.id).await.unwrap();

        let third = store.create(sample("c")).await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn invalid_input_leaves_state_untouched() {
        let store = InMemoryStorage::new();
        let err = store
            .create(NewBook {
                title: String::new(),
                description: "d".to_string(),
                price: 0.0,
            })
            .await
            .unwrap_err();

        match err {
            StorageError::Validation(v) => assert_eq!(v.violations.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.get_all().await.unwrap().is_empty());

        // The failed create did not consume an id.
        assert_eq!(store.create(sample("ok")).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn negative_id_is_a_validation_error() {
        let store = InMemoryStorage::new();
        assert!(matches!(
            store.get(-1).await.unwrap_err(),
            StorageError::Validation(_)
        ));
        assert!(matches!(
            store.delete(-1).await.unwrap_err(),
            StorageError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn repeated_reads_are_stable() {
        let store = InMemoryStorage::new();
        store.create(sample("a")).await.unwrap();
        store.create(sample("b")).await.unwrap();

        let first = store.get_all().await.unwrap();
        let second = store.get_all().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(InMemoryStorage::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(sample(&format!("book-{i}"))).await.unwrap().id
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(store.get_all().await.unwrap().len(), 64);
    }
}
