//! PostgreSQL backend.
//!
//! Rows live in a `books` table whose id is assigned by the database:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS books (
//!     id BIGSERIAL PRIMARY KEY,
//!     title TEXT NOT NULL,
//!     description TEXT NOT NULL,
//!     price DOUBLE PRECISION NOT NULL
//! );
//! ```
//!
//! Every query runs under the configured query timeout. The pool is opened
//! once at startup and verified with a bounded ping; there is no retry loop.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::{Connection, Row};

use books_kernel::settings::DatabaseSettings;

use crate::book::{validate_id, Book, NewBook};
use crate::error::{StorageError, StorageResult};
use crate::storage::BookStorage;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL
    )
"#;

/// PostgreSQL-backed `BookStorage` sharing one pool across requests.
pub struct PostgresStorage {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresStorage {
    /// Connect with the configured parameters and verify reachability.
    pub async fn connect(settings: &DatabaseSettings) -> StorageResult<Self> {
        tracing::info!(
            target: "books-db",
            host = %settings.host,
            port = settings.port,
            user = %settings.user,
            database = %settings.name,
            "connecting to PostgreSQL"
        );

        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.name)
            .ssl_mode(PgSslMode::Disable);

        Self::connect_with(options, settings).await
    }

    /// Connect using prepared options; pool sizing, timeouts, and schema
    /// bootstrap still come from `settings`.
    pub async fn connect_with(
        options: PgConnectOptions,
        settings: &DatabaseSettings,
    ) -> StorageResult<Self> {
        let connect_timeout = settings.connect_timeout();

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(connect_timeout)
            .connect_lazy_with(options);

        let storage = Self {
            pool,
            query_timeout: settings.query_timeout(),
        };

        storage.ping(connect_timeout).await?;

        if settings.ensure_schema {
            storage.ensure_schema().await?;
        }

        tracing::info!(target: "books-db", "PostgreSQL backend ready");
        Ok(storage)
    }

    /// Acquire a connection and ping it within `limit`.
    pub async fn ping(&self, limit: Duration) -> StorageResult<()> {
        let attempt = async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await
        };

        match tokio::time::timeout(limit, attempt).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(StorageError::connectivity(format!(
                "failed to reach database: {err}"
            ))),
            Err(_) => Err(StorageError::connectivity(format!(
                "database did not answer within {limit:?}"
            ))),
        }
    }

    /// Create the `books` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        self.bounded("ensure_schema", sqlx::query(SCHEMA).execute(&self.pool))
            .await?;
        Ok(())
    }

    /// Run `query` under the query timeout and classify its failure.
    async fn bounded<T, F>(&self, operation: &'static str, query: F) -> StorageResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(|err| classify(operation, err, self.query_timeout)),
            Err(_) => {
                tracing::warn!(
                    target: "books-db",
                    operation,
                    timeout = ?self.query_timeout,
                    "query timed out"
                );
                Err(StorageError::timeout(operation, self.query_timeout))
            }
        }
    }
}

/// Map a driver error onto the storage taxonomy.
fn classify(operation: &'static str, err: sqlx::Error, limit: Duration) -> StorageError {
    match err {
        sqlx::Error::PoolTimedOut => StorageError::timeout(operation, limit),
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::Tls(_) => {
            StorageError::connectivity(format!("{operation}: {err}"))
        }
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            tracing::warn!(target: "books-db", operation, error = %err, "unique violation");
            StorageError::Conflict { id: None }
        }
        other => {
            tracing::error!(target: "books-db", operation, error = %other, "query failed");
            StorageError::internal(format!("{operation}: {other}"))
        }
    }
}

/// Parse a `books` row into a `Book`.
fn row_to_book(row: &PgRow) -> StorageResult<Book> {
    let decode = |err: sqlx::Error| StorageError::internal(format!("malformed books row: {err}"));

    Ok(Book {
        id: row.try_get("id").map_err(decode)?,
        title: row.try_get("title").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
    })
}

#[async_trait]
impl BookStorage for PostgresStorage {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, book: NewBook) -> StorageResult<Book> {
        book.validate()?;

        let query = sqlx::query(
            r#"
            INSERT INTO books (title, description, price)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, price
            "#,
        )
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.price)
        .fetch_one(&self.pool);

        let row = self.bounded("create", query).await?;
        let stored = row_to_book(&row)?;

        tracing::debug!(backend = "postgres", book_id = stored.id, "book created");
        Ok(stored)
    }

    async fn get(&self, id: i64) -> StorageResult<Book> {
        validate_id(id)?;

        let query = sqlx::query(
            r#"
            SELECT id, title, description, price
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool);

        match self.bounded("get", query).await? {
            Some(row) => row_to_book(&row),
            None => Err(StorageError::not_found(id)),
        }
    }

    // TODO: add limit/offset once clients can page through the catalog.
    async fn get_all(&self) -> StorageResult<Vec<Book>> {
        let query = sqlx::query(
            r#"
            SELECT id, title, description, price
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool);

        let rows = self.bounded("get_all", query).await?;
        rows.iter().map(row_to_book).collect()
    }

    async fn update(&self, book: Book) -> StorageResult<Book> {
        book.validate()?;

        let query = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, description = $3, price = $4
            WHERE id = $1
            RETURNING id, title, description, price
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.price)
        .fetch_optional(&self.pool);

        match self.bounded("update", query).await? {
            Some(row) => {
                let stored = row_to_book(&row)?;
                tracing::debug!(backend = "postgres", book_id = stored.id, "book updated");
                Ok(stored)
            }
            None => Err(StorageError::not_found(book.id)),
        }
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        validate_id(id)?;

        let query = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool);

        // A no-op delete is not a database error; check rows affected.
        let result = self.bounded("delete", query).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(id));
        }

        tracing::debug!(backend = "postgres", book_id = id, "book deleted");
        Ok(())
    }

    async fn close(&self) {
        tracing::info!(target: "books-db", "closing PostgreSQL pool");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_a_timeout() {
        let err = classify("get", sqlx::Error::PoolTimedOut, Duration::from_secs(5));
        assert!(matches!(err, StorageError::Timeout { operation: "get", .. }));
    }

    #[test]
    fn closed_pool_is_connectivity() {
        let err = classify("delete", sqlx::Error::PoolClosed, Duration::from_secs(5));
        assert!(matches!(err, StorageError::Connectivity(_)));
    }

    #[test]
    fn decode_failures_are_internal() {
        let err = classify(
            "get_all",
            sqlx::Error::ColumnNotFound("price".to_string()),
            Duration::from_secs(5),
        );
        assert!(matches!(err, StorageError::Internal(_)));
    }

    /// Pool that never dials until a query runs.
    fn lazy_storage(port: u16, query_timeout: Duration) -> PostgresStorage {
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(port)
            .ssl_mode(PgSslMode::Disable);

        PostgresStorage {
            pool: PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Duration::from_secs(5))
                .connect_lazy_with(options),
            query_timeout,
        }
    }

    #[tokio::test]
    async fn slow_query_is_a_timeout() {
        let store = lazy_storage(5432, Duration::from_millis(50));

        let err = store
            .bounded("get", std::future::pending::<Result<(), sqlx::Error>>())
            .await
            .unwrap_err();

        match err {
            StorageError::Timeout { operation, after } => {
                assert_eq!(operation, "get");
                assert_eq!(after, Duration::from_millis(50));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn silent_server_fails_ping() {
        // Accepts connections and never answers the startup message.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let store = lazy_storage(port, Duration::from_secs(5));
        let err = store.ping(Duration::from_millis(100)).await.unwrap_err();

        match err {
            StorageError::Connectivity(message) => {
                assert!(message.contains("did not answer"), "{message}");
            }
            other => panic!("expected connectivity error, got {other:?}"),
        }

        server.abort();
    }

    #[test]
    fn schema_uses_server_assigned_ids() {
        assert!(SCHEMA.contains("id BIGSERIAL PRIMARY KEY"));
        assert!(SCHEMA.contains("IF NOT EXISTS books"));
    }
}
