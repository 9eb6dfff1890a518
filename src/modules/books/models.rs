use books_db::{FieldViolation, NewBook, ValidationError};
use serde::{Deserialize, Serialize};

pub use books_db::Book;

/// Request model for creating a new book.
///
/// `id` is accepted only so a client echoing a zero id is not rejected as
/// malformed; ids are always assigned by the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBook {
    #[serde(default)]
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Short description of the book
    pub description: String,
    /// Price, strictly positive
    pub price: f64,
}

impl CreateBook {
    /// Reject a client-chosen id, then drop it.
    pub fn into_new_book(self) -> Result<NewBook, ValidationError> {
        if self.id != 0 {
            return Err(ValidationError::single(FieldViolation::new(
                "id", "unset", self.id,
            )));
        }
        Ok(NewBook {
            title: self.title,
            description: self.description,
            price: self.price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(id: i64) -> CreateBook {
        CreateBook {
            id,
            title: "Test1".to_string(),
            description: "Test1".to_string(),
            price: 1.11,
        }
    }

    #[test]
    fn zero_id_is_dropped() {
        let book = payload(0).into_new_book().unwrap();
        assert_eq!(book.title, "Test1");
    }

    #[test]
    fn client_id_is_rejected() {
        let err = payload(5).into_new_book().unwrap_err();
        assert_eq!(err.violations[0].field, "id");
        assert_eq!(err.violations[0].rule, "unset");
        assert_eq!(err.violations[0].value, "5");
    }
}
