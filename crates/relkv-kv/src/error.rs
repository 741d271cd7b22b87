//! Key-value store errors.

use thiserror::Error;

/// Errors raised by a [`KvStore`](crate::KvStore).
#[derive(Debug, Error)]
pub enum KvError {
	/// The store could not be reached or the connection was lost.
	#[error("Connection error: {0}")]
	Connection(String),

	/// Cluster redirections (MOVED/ASK/TRYAGAIN/CLUSTERDOWN) were not resolved.
	#[error("Cluster redirect error: {0}")]
	Redirect(String),

	/// The key holds a value of another type.
	#[error("Wrong type: {0}")]
	WrongType(String),

	/// The store rejected a command.
	#[error("Command error: {0}")]
	Command(String),

	/// A key pattern could not be compiled.
	#[error("Invalid pattern: {0}")]
	InvalidPattern(String),

	/// The store is misconfigured.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Result type alias for key-value operations.
pub type KvResult<T> = Result<T, KvError>;

#[cfg(feature = "redis-backend")]
impl From<redis::RedisError> for KvError {
	fn from(error: redis::RedisError) -> Self {
		let message = error.to_string();
		if error.is_io_error()
			|| error.is_connection_dropped()
			|| error.is_connection_refusal()
			|| error.is_timeout()
		{
			KvError::Connection(message)
		} else if error.is_cluster_error() {
			KvError::Redirect(message)
		} else if error.code() == Some("WRONGTYPE") {
			KvError::WrongType(message)
		} else {
			KvError::Command(message)
		}
	}
}

#[cfg(feature = "redis-backend")]
impl From<deadpool_redis::PoolError> for KvError {
	fn from(error: deadpool_redis::PoolError) -> Self {
		KvError::Connection(format!("Failed to get connection from pool: {}", error))
	}
}
