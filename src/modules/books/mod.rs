pub mod models;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use books_db::BookStorage;
use books_kernel::{InitCtx, Module};
use serde_json::json;

/// Book catalog module: CRUD routes over a storage backend
pub struct BooksModule {
    store: Arc<dyn BookStorage>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStorage>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            backend = self.store.backend_name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.store))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.store.close().await;
        tracing::info!(
            module = self.name(),
            backend = self.store.backend_name(),
            "books module stopped"
        );
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64", "minimum": 0 }
    })
}

fn book_body(schema: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/book": {
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body("CreateBook"),
                    "responses": {
                        "202": book_response("Created book with its assigned id"),
                        "400": error_response("Malformed body or failed validation")
                    }
                },
                "put": {
                    "summary": "Replace a book",
                    "tags": ["Books"],
                    "requestBody": book_body("Book"),
                    "responses": {
                        "200": book_response("Updated book"),
                        "400": error_response("Malformed body or failed validation"),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/book/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("Requested book"),
                        "400": error_response("Non-numeric or negative id"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": { "description": "Book deleted" },
                        "400": error_response("Non-numeric or negative id"),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/books": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Every stored book",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "integer",
                            "format": "int64",
                            "minimum": 0,
                            "description": "Backend-assigned identifier"
                        },
                        "title": { "type": "string", "minLength": 1 },
                        "description": { "type": "string", "minLength": 1 },
                        "price": { "type": "number", "exclusiveMinimum": 0 }
                    },
                    "required": ["id", "title", "description", "price"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1 },
                        "description": { "type": "string", "minLength": 1 },
                        "price": { "type": "number", "exclusiveMinimum": 0 }
                    },
                    "required": ["title", "description", "price"]
                }
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn BookStorage>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
