//! Book entity and its field-level validity rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One catalog entry as stored and returned by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Backend-assigned identifier; zero means unset.
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
}

/// A book that has not been persisted yet and therefore has no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub price: f64,
}

impl NewBook {
    /// Attach a backend-assigned id.
    pub fn with_id(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();
        check_fields(&self.title, &self.description, self.price, &mut violations);
        ValidationError::from_violations(violations)
    }
}

impl Book {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();
        check_id(self.id, &mut violations);
        check_fields(&self.title, &self.description, self.price, &mut violations);
        ValidationError::from_violations(violations)
    }
}

/// Reject negative identifiers before they reach a backend.
pub fn validate_id(id: i64) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    check_id(id, &mut violations);
    ValidationError::from_violations(violations)
}

fn check_id(id: i64, violations: &mut Vec<FieldViolation>) {
    if id < 0 {
        violations.push(FieldViolation::new("id", "min", id));
    }
}

fn check_fields(title: &str, description: &str, price: f64, violations: &mut Vec<FieldViolation>) {
    if title.is_empty() {
        violations.push(FieldViolation::new("title", "required", title));
    }
    if description.is_empty() {
        violations.push(FieldViolation::new("description", "required", description));
    }
    // NaN fails both comparisons, so test for the valid range instead.
    if !(price.is_finite() && price > 0.0) {
        violations.push(FieldViolation::new("price", "gt", price));
    }
}

/// A single broken rule: which field, which rule, and the rejected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub rule: &'static str,
    pub value: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, rule: &'static str, value: impl fmt::Display) -> Self {
        Self {
            field,
            rule,
            value: value.to_string(),
        }
    }
}

/// Every rule a book failed, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid book: {}", summary(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(violation: FieldViolation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    fn from_violations(violations: Vec<FieldViolation>) -> Result<(), Self> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self { violations })
        }
    }

    /// JSON rendering used as error details in HTTP responses.
    pub fn details(&self) -> Vec<serde_json::Value> {
        self.violations
            .iter()
            .map(|v| serde_json::json!({ "field": v.field, "rule": v.rule, "value": v.value }))
            .collect()
    }
}

fn summary(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} failed '{}'", v.field, v.rule))
        .collect::<Vec<_>>()
        .join(", ")
}
