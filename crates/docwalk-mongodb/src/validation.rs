//! Input validation for MongoDB names and filters
//!
//! # Security Features
//! - Database and collection name validation (prevents system collection access)
//! - Field name validation (prevents operator injection in equality filters)
//! - Query validation (blocks server-side JavaScript operators)

use bson::Bson;
use docwalk_common::{DocwalkError, Result};
use tracing::warn;

/// MongoDB limits database names to 64 bytes
const MAX_DATABASE_NAME_LENGTH: usize = 64;

/// Maximum allowed length for collection names (MongoDB limit is 255, we're more conservative)
const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// Maximum allowed length for field names
const MAX_FIELD_NAME_LENGTH: usize = 1024;

/// Characters the server refuses in database names
const FORBIDDEN_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?'];

/// Validated database name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDatabaseName {
    name: String,
}

impl ValidatedDatabaseName {
    /// # Errors
    /// Returns ValidationError if:
    /// - Name is empty
    /// - Name exceeds MAX_DATABASE_NAME_LENGTH bytes
    /// - Name contains null bytes or any of `/\. "$*<>:|?`
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(DocwalkError::Validation(
                "Database name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_DATABASE_NAME_LENGTH {
            return Err(DocwalkError::Validation(format!(
                "Database name exceeds maximum length of {} bytes: '{}'",
                MAX_DATABASE_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(DocwalkError::Validation(
                "Database name cannot contain null bytes".to_string(),
            ));
        }

        if let Some(c) = name.chars().find(|c| FORBIDDEN_DATABASE_CHARS.contains(c)) {
            return Err(DocwalkError::Validation(format!(
                "Database name cannot contain '{}': '{}'",
                c, name
            )));
        }

        Ok(ValidatedDatabaseName {
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for ValidatedDatabaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validated collection name that prevents injection attacks
///
/// # Security Guarantees
/// - Not empty
/// - Maximum 120 characters
/// - No null bytes
/// - No "system." prefix (system collections)
/// - No $ characters (special operators)
/// - Warns on suspicious patterns (.., //)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    /// Creates a new validated collection name
    ///
    /// # Errors
    /// Returns ValidationError if:
    /// - Name is empty
    /// - Name exceeds MAX_COLLECTION_NAME_LENGTH
    /// - Name contains null bytes
    /// - Name starts with "system."
    /// - Name contains $ characters
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(DocwalkError::Validation(
                "Collection name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(DocwalkError::Validation(format!(
                "Collection name exceeds maximum length of {} characters: '{}'",
                MAX_COLLECTION_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(DocwalkError::Validation(
                "Collection name cannot contain null bytes".to_string(),
            ));
        }

        // Reserved for system collections
        if name.starts_with("system.") {
            return Err(DocwalkError::Validation(format!(
                "Collection name cannot start with 'system.' (reserved): '{}'",
                name
            )));
        }

        if name.contains('$') {
            return Err(DocwalkError::Validation(format!(
                "Collection name cannot contain '$' character: '{}'",
                name
            )));
        }

        // Allowed, but almost always a mistake
        if name.contains("..") || name.contains("//") {
            warn!(collection = %name, "collection name contains suspicious pattern");
        }

        Ok(ValidatedCollectionName {
            name: name.to_string(),
        })
    }

    /// Returns the validated collection name as a string slice
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validated field name for equality filters
///
/// # Security Guarantees
/// - Not empty
/// - Maximum 1024 characters
/// - No null bytes
/// - No $ prefix (operators are never field names here)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFieldName {
    name: String,
}

impl ValidatedFieldName {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(DocwalkError::Validation(
                "Field name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_FIELD_NAME_LENGTH {
            return Err(DocwalkError::Validation(format!(
                "Field name exceeds maximum length of {} characters",
                MAX_FIELD_NAME_LENGTH
            )));
        }

        if name.contains('\0') {
            return Err(DocwalkError::Validation(
                "Field name cannot contain null bytes".to_string(),
            ));
        }

        if name.starts_with('$') {
            return Err(DocwalkError::Validation(format!(
                "Field name cannot start with '$' (reserved for operators): '{}'",
                name
            )));
        }

        Ok(ValidatedFieldName {
            name: name.to_string(),
        })
    }

    pub fn into_string(self) -> String {
        self.name
    }
}

/// Dangerous MongoDB operators that should be blocked
const DANGEROUS_OPERATORS: &[&str] = &[
    "$where",       // JavaScript execution
    "$function",    // JavaScript execution
    "$accumulator", // Custom JavaScript in aggregation
];

/// Validates a MongoDB query document for dangerous operators
///
/// # Errors
/// Returns ValidationError if dangerous operators are detected at any depth
pub fn validate_query(query: &Bson) -> Result<()> {
    match query {
        Bson::Document(doc) => {
            for (key, value) in doc.iter() {
                if DANGEROUS_OPERATORS.contains(&key.as_str()) {
                    return Err(DocwalkError::Validation(format!(
                        "Dangerous operator '{}' is not allowed for security reasons",
                        key
                    )));
                }
                validate_query(value)?;
            }
            Ok(())
        }
        Bson::Array(items) => items.iter().try_for_each(validate_query),
        _ => Ok(()),
    }
}
