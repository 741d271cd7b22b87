//! The key-value store abstraction.

use async_trait::async_trait;

use crate::error::KvResult;

/// A key-value store with string, hash and set values.
///
/// The surface mirrors the Redis commands the mapper needs. `replace_*`
/// operations delete the key and write the full content, so writing the
/// same content twice leaves the store unchanged.
#[async_trait]
pub trait KvStore: Send + Sync {
	/// Short name used in logs and reports.
	fn backend_name(&self) -> &str;

	/// `SET key value`.
	async fn set(&self, key: &str, value: &str) -> KvResult<()>;

	/// `GET key`.
	async fn get(&self, key: &str) -> KvResult<Option<String>>;

	/// `DEL key`. Returns true if the key existed.
	async fn delete(&self, key: &str) -> KvResult<bool>;

	/// `DEL key` followed by `HSET key field value ...`.
	///
	/// An empty field list leaves the key absent.
	async fn replace_hash(&self, key: &str, fields: &[(String, String)]) -> KvResult<()>;

	/// `HGETALL key`. Empty when the key does not exist.
	async fn hash_get_all(&self, key: &str) -> KvResult<Vec<(String, String)>>;

	/// `DEL key` followed by `SADD key member ...`.
	///
	/// An empty member list leaves the key absent.
	async fn replace_set(&self, key: &str, members: &[String]) -> KvResult<()>;

	/// `SADD key member`. Returns true if the member was new.
	async fn set_add(&self, key: &str, member: &str) -> KvResult<bool>;

	/// `SMEMBERS key`, sorted. Empty when the key does not exist.
	async fn set_members(&self, key: &str) -> KvResult<Vec<String>>;

	/// Every key matching a Redis glob pattern (`*`, `?`, `[...]`, `\`
	/// escapes), sorted.
	async fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>>;

	/// Number of keys in the store.
	async fn key_count(&self) -> KvResult<u64>;
}
