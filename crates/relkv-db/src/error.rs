//! Error types for row sources and fixtures.

use thiserror::Error;

/// Errors raised while reading rows or loading fixtures.
#[derive(Debug, Error)]
pub enum DbError {
	/// The SQL driver failed.
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	/// Table is not known to the source.
	#[error("Table not found: {0}")]
	TableNotFound(String),

	/// A column value has a storage type the source cannot hand over.
	#[error("Unsupported value in {table}.{column}: {type_name}")]
	UnsupportedValue {
		table: String,
		column: String,
		type_name: String,
	},

	/// Error parsing fixture data.
	#[error("Parse error: {0}")]
	ParseError(String),

	/// Validation failed for a specific field.
	#[error("Validation error: {field}: {message}")]
	ValidationError {
		/// Field that failed validation.
		field: String,
		/// Validation error message.
		message: String,
	},

	/// Fixture file not found.
	#[error("Fixture file not found: {0}")]
	FileNotFound(String),

	/// Unsupported file extension.
	#[error("Unsupported file extension: {0}")]
	UnsupportedExtension(String),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	/// JSON deserialization error.
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),
}

/// Result type alias for source operations.
pub type DbResult<T> = Result<T, DbError>;
