//! Settings errors.

use thiserror::Error;

/// Errors raised while loading a single configuration source.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid source: {0}")]
	InvalidSource(String),
}

/// Errors raised while building, reading or validating settings.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("Failed to load {source_name}: {error}")]
	Source {
		source_name: String,
		#[source]
		error: SourceError,
	},

	#[error("Setting not found: {0}")]
	MissingKey(String),

	#[error("Invalid value for {key}: {message}")]
	Deserialize { key: String, message: String },

	#[error("Validation failed for {field}: {message}")]
	Validation { field: String, message: String },
}

impl SettingsError {
	pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Validation {
			field: field.into(),
			message: message.into(),
		}
	}
}

pub type SettingsResult<T> = Result<T, SettingsError>;
