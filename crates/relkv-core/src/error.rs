//! Migration error taxonomy.
//!
//! Every failure that aborts a pass is one of these variants. Sink and schema
//! failures carry the key that failed so an operator can see exactly where a
//! pass stopped; the documented recovery is to re-run the whole pass.

use thiserror::Error;

/// Errors that abort a migration pass or a lookup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MigrationError {
	/// The relational store could not be read.
	#[error("Source unavailable while reading {table}: {message}")]
	SourceUnavailable {
		/// Table being enumerated when the source failed.
		table: String,
		/// Underlying error message.
		message: String,
	},

	/// The key-value store rejected a read or write.
	#[error("Sink unavailable at key {key}: {message}")]
	SinkUnavailable {
		/// Key whose command failed.
		key: String,
		/// Underlying error message.
		message: String,
	},

	/// A row does not fit the expected schema, or references a missing parent.
	#[error("Schema mismatch at {key}: {message}")]
	SchemaMismatch {
		/// Key (or key prefix) of the offending attribute or row.
		key: String,
		/// What did not match.
		message: String,
	},

	/// Options or schema definitions are inconsistent.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl MigrationError {
	/// Creates a [`MigrationError::SchemaMismatch`].
	pub fn schema_mismatch(key: impl Into<String>, message: impl Into<String>) -> Self {
		Self::SchemaMismatch {
			key: key.into(),
			message: message.into(),
		}
	}

	/// Creates a [`MigrationError::SinkUnavailable`].
	pub fn sink_unavailable(key: impl Into<String>, message: impl ToString) -> Self {
		Self::SinkUnavailable {
			key: key.into(),
			message: message.to_string(),
		}
	}

	/// Creates a [`MigrationError::SourceUnavailable`].
	pub fn source_unavailable(table: impl Into<String>, message: impl ToString) -> Self {
		Self::SourceUnavailable {
			table: table.into(),
			message: message.to_string(),
		}
	}

	/// Returns the key this error is attached to, if any.
	pub fn key(&self) -> Option<&str> {
		match self {
			Self::SinkUnavailable { key, .. } | Self::SchemaMismatch { key, .. } => Some(key),
			_ => None,
		}
	}
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_sink_unavailable_message() {
		let error = MigrationError::sink_unavailable("Customer:1:email", "connection refused");
		assert_eq!(
			error.to_string(),
			"Sink unavailable at key Customer:1:email: connection refused"
		);
		assert_eq!(error.key(), Some("Customer:1:email"));
	}

	#[rstest]
	fn test_source_unavailable_has_no_key() {
		let error = MigrationError::source_unavailable("Customer", "no such table");
		assert_eq!(
			error.to_string(),
			"Source unavailable while reading Customer: no such table"
		);
		assert_eq!(error.key(), None);
	}

	#[rstest]
	fn test_schema_mismatch_message() {
		let error = MigrationError::schema_mismatch("Order:1008:customer_id", "missing parent");
		assert!(matches!(error, MigrationError::SchemaMismatch { .. }));
		assert_eq!(error.key(), Some("Order:1008:customer_id"));
	}
}
