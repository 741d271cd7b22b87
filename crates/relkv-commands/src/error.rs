//! Command errors.

use relkv_conf::SettingsError;
use relkv_core::MigrationError;
use relkv_db::DbError;
use relkv_kv::KvError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CommandError {
	#[error(transparent)]
	Settings(#[from] SettingsError),

	#[error(transparent)]
	Migration(#[from] MigrationError),

	#[error("Source error: {0}")]
	Source(#[from] DbError),

	#[error("Sink error: {0}")]
	Sink(#[from] KvError),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid arguments: {0}")]
	InvalidArguments(String),

	#[error("Execution error: {0}")]
	ExecutionError(String),
}

pub type CommandResult<T> = Result<T, CommandError>;
