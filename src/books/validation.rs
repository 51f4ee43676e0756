//! Input validation for book and author writes
//!
//! Payloads arrive as loose JSON. Every supplied field is checked and all
//! failures are reported together, keyed by field name. Author existence is
//! checked by the caller since it needs the store.

use crate::books::model::NewBook;
use crate::error::FieldErrors;
use chrono::Datelike;
use serde_json::{Map, Value};

pub const TITLE_MAX_CHARS: usize = 200;
pub const AUTHOR_NAME_MAX_CHARS: usize = 255;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";

/// Whether omitted fields are an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or PUT: every field must be present
    Full,
    /// PATCH: only supplied fields are validated
    Partial,
}

/// Validated subset of book fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub author: Option<i64>,
}

impl BookChanges {
    /// Complete values for an insert; `None` if any field is missing
    pub fn into_new_book(self) -> Option<NewBook> {
        Some(NewBook {
            title: self.title?,
            publication_year: self.publication_year?,
            author: self.author?,
        })
    }

    /// Overlay these changes on an existing row's values
    pub fn apply_to(self, existing: NewBook) -> NewBook {
        NewBook {
            title: self.title.unwrap_or(existing.title),
            publication_year: self.publication_year.unwrap_or(existing.publication_year),
            author: self.author.unwrap_or(existing.author),
        }
    }
}

/// The current calendar year (UTC)
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Parse and validate a book payload
///
/// Returns the values that passed alongside every field error found.
pub fn parse_book_payload(
    payload: &Value,
    mode: WriteMode,
    current_year: i32,
) -> (BookChanges, FieldErrors) {
    let mut changes = BookChanges::default();
    let mut errors = FieldErrors::new();

    let Some(object) = as_object(payload, &mut errors) else {
        return (changes, errors);
    };

    if let Some(value) = field(object, "title", mode, &mut errors) {
        match value.as_str() {
            Some(title) => match validate_title(title) {
                Ok(title) => changes.title = Some(title),
                Err(message) => errors.add("title", message),
            },
            None => errors.add("title", NOT_A_STRING),
        }
    }

    if let Some(value) = field(object, "publication_year", mode, &mut errors) {
        match integer(value).and_then(|n| i32::try_from(n).ok()) {
            Some(year) => match validate_publication_year(year, current_year) {
                Ok(year) => changes.publication_year = Some(year),
                Err(message) => errors.add("publication_year", message),
            },
            None => errors.add("publication_year", NOT_AN_INTEGER),
        }
    }

    if let Some(value) = field(object, "author", mode, &mut errors) {
        match integer(value) {
            Some(author) => changes.author = Some(author),
            None => errors.add(
                "author",
                format!(
                    "Incorrect type. Expected pk value, received {}.",
                    type_name(value)
                ),
            ),
        }
    }

    (changes, errors)
}

/// Parse and validate an author payload, returning the cleaned name
pub fn parse_author_payload(payload: &Value) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    let Some(object) = as_object(payload, &mut errors) else {
        return Err(errors);
    };

    let Some(value) = field(object, "name", WriteMode::Full, &mut errors) else {
        return Err(errors);
    };

    let Some(name) = value.as_str() else {
        return Err(FieldErrors::single("name", NOT_A_STRING));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(FieldErrors::single("name", BLANK));
    }
    if name.chars().count() > AUTHOR_NAME_MAX_CHARS {
        return Err(FieldErrors::single(
            "name",
            format!(
                "Ensure this field has no more than {} characters.",
                AUTHOR_NAME_MAX_CHARS
            ),
        ));
    }

    Ok(name.to_string())
}

/// Trimmed, non-blank title within the length limit
pub fn validate_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BLANK.to_string());
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            TITLE_MAX_CHARS
        ));
    }
    Ok(title.to_string())
}

/// A publication year may not be in the future
pub fn validate_publication_year(year: i32, current_year: i32) -> Result<i32, String> {
    if year > current_year {
        return Err(format!(
            "publication_year cannot be greater than {}.",
            current_year
        ));
    }
    Ok(year)
}

fn as_object<'a>(payload: &'a Value, errors: &mut FieldErrors) -> Option<&'a Map<String, Value>> {
    match payload.as_object() {
        Some(object) => Some(object),
        None => {
            errors.add(
                "non_field_errors",
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    type_name(payload)
                ),
            );
            None
        }
    }
}

/// Look up a field, recording "required"/"null" errors
fn field<'a>(
    object: &'a Map<String, Value>,
    name: &str,
    mode: WriteMode,
    errors: &mut FieldErrors,
) -> Option<&'a Value> {
    match object.get(name) {
        None => {
            if mode == WriteMode::Full {
                errors.add(name, REQUIRED);
            }
            None
        }
        Some(Value::Null) => {
            errors.add(name, NOT_NULL);
            None
        }
        Some(value) => Some(value),
    }
}

/// JSON integers, or strings holding one
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YEAR: i32 = 2025;

    #[test]
    fn test_full_payload_accepted() {
        let (changes, errors) = parse_book_payload(
            &json!({"title": " 1984 ", "publication_year": 1949, "author": 1}),
            WriteMode::Full,
            YEAR,
        );
        assert!(errors.is_empty());
        let book = changes.into_new_book().unwrap();
        assert_eq!(book.title, "1984");
        assert_eq!(book.publication_year, 1949);
        assert_eq!(book.author, 1);
    }

    #[test]
    fn test_future_year_rejected() {
        let (_, errors) = parse_book_payload(
            &json!({"title": "Later", "publication_year": YEAR + 1, "author": 1}),
            WriteMode::Full,
            YEAR,
        );
        let messages = errors.get("publication_year").unwrap();
        assert_eq!(messages[0], "publication_year cannot be greater than 2025.");
    }

    #[test]
    fn test_current_year_allowed() {
        assert_eq!(validate_publication_year(YEAR, YEAR), Ok(YEAR));
    }

    #[test]
    fn test_full_mode_requires_every_field() {
        let (_, errors) = parse_book_payload(&json!({}), WriteMode::Full, YEAR);
        assert_eq!(errors.get("title").unwrap()[0], REQUIRED);
        assert_eq!(errors.get("publication_year").unwrap()[0], REQUIRED);
        assert_eq!(errors.get("author").unwrap()[0], REQUIRED);
    }

    #[test]
    fn test_partial_mode_ignores_omitted_fields() {
        let (changes, errors) =
            parse_book_payload(&json!({"title": "New"}), WriteMode::Partial, YEAR);
        assert!(errors.is_empty());
        assert_eq!(changes.title.as_deref(), Some("New"));
        assert!(changes.publication_year.is_none());
    }

    #[test]
    fn test_type_errors_are_field_scoped() {
        let (_, errors) = parse_book_payload(
            &json!({"title": 5, "publication_year": "soon", "author": "abc"}),
            WriteMode::Partial,
            YEAR,
        );
        assert_eq!(errors.get("title").unwrap()[0], NOT_A_STRING);
        assert_eq!(errors.get("publication_year").unwrap()[0], NOT_AN_INTEGER);
        assert!(errors.get("author").unwrap()[0].contains("received str"));
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let (changes, errors) = parse_book_payload(
            &json!({"publication_year": "1949", "author": "7"}),
            WriteMode::Partial,
            YEAR,
        );
        assert!(errors.is_empty());
        assert_eq!(changes.publication_year, Some(1949));
        assert_eq!(changes.author, Some(7));
    }

    #[test]
    fn test_blank_and_null_rejected() {
        let (_, errors) = parse_book_payload(
            &json!({"title": "   ", "author": null}),
            WriteMode::Partial,
            YEAR,
        );
        assert_eq!(errors.get("title").unwrap()[0], BLANK);
        assert_eq!(errors.get("author").unwrap()[0], NOT_NULL);
    }

    #[test]
    fn test_title_length_limit() {
        let long = "x".repeat(TITLE_MAX_CHARS + 1);
        assert!(validate_title(&long).is_err());
        assert!(validate_title(&"x".repeat(TITLE_MAX_CHARS)).is_ok());
    }

    #[test]
    fn test_non_object_payload() {
        let (_, errors) = parse_book_payload(&json!([1, 2]), WriteMode::Full, YEAR);
        assert!(errors.contains("non_field_errors"));
    }

    #[test]
    fn test_apply_changes_keeps_unset_fields() {
        let existing = NewBook {
            title: "Old".to_string(),
            publication_year: 1900,
            author: 1,
        };
        let merged = BookChanges {
            publication_year: Some(1950),
            ..Default::default()
        }
        .apply_to(existing);
        assert_eq!(merged.title, "Old");
        assert_eq!(merged.publication_year, 1950);
        assert_eq!(merged.author, 1);
    }

    #[test]
    fn test_author_payload() {
        assert_eq!(
            parse_author_payload(&json!({"name": " George Orwell "})).unwrap(),
            "George Orwell"
        );
        assert!(parse_author_payload(&json!({"name": ""})).is_err());
        assert!(parse_author_payload(&json!({})).is_err());
    }
}
